use crate::error::Result;
use async_trait::async_trait;
use router_protocol::ToolRecord;

/// Constraints applied before similarity ranking. `None` fields are
/// unconstrained.
#[derive(Debug, Clone, Default)]
pub struct VectorFilter {
    pub server_name: Option<String>,
    pub blocked: Option<bool>,
}

impl VectorFilter {
    #[must_use]
    pub fn matches(&self, record: &ToolRecord) -> bool {
        if let Some(server_name) = &self.server_name {
            if &record.server_name != server_name {
                return false;
            }
        }
        if let Some(blocked) = self.blocked {
            if record.blocked != blocked {
                return false;
            }
        }
        true
    }
}

/// A ranked match returned from [`VectorStore::search`].
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub record: ToolRecord,
    pub score: f32,
}

/// Storage port for the tool catalog's embedding collection.
///
/// `router-indexer` writes through this trait, `router-search` reads
/// through it. The only implementation shipped here is the in-process
/// [`crate::InProcessVectorStore`]; a real deployment could swap in a
/// networked collection engine without touching either caller.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn upsert(&self, record: ToolRecord) -> Result<()>;

    async fn search(
        &self,
        query_vector: &[f32],
        top_k: usize,
        filter: &VectorFilter,
    ) -> Result<Vec<SearchHit>>;

    async fn scroll(&self, filter: &VectorFilter) -> Result<Vec<ToolRecord>>;

    async fn get(&self, tool_id: &str) -> Result<Option<ToolRecord>>;

    async fn delete(&self, tool_id: &str) -> Result<()>;

    async fn delete_by_server(&self, server_name: &str) -> Result<usize>;

    fn dimension(&self) -> usize;
}
