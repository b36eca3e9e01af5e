use crate::cosine::CosineIndex;
use crate::error::{Result, VectorIndexError};
use crate::port::{SearchHit, VectorFilter, VectorStore};
use async_trait::async_trait;
use router_protocol::ToolRecord;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tokio::fs;

const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Snapshot {
    schema_version: u32,
    dimension: usize,
    records: Vec<ToolRecord>,
}

struct State {
    index: CosineIndex,
    records: HashMap<String, ToolRecord>,
}

/// Default [`VectorStore`] adapter: an in-memory brute-force cosine
/// index mirrored to a single JSON snapshot file on disk.
///
/// Adequate for catalogs of a few thousand tools. Every mutation
/// rewrites the whole snapshot, which keeps the persistence format
/// trivial to reason about at this scale; a higher-throughput backend
/// would need incremental writes instead.
pub struct InProcessVectorStore {
    state: RwLock<State>,
    snapshot_path: Option<PathBuf>,
}

impl InProcessVectorStore {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            state: RwLock::new(State {
                index: CosineIndex::new(dimension),
                records: HashMap::new(),
            }),
            snapshot_path: None,
        }
    }

    /// Load from `snapshot_path` if it exists, otherwise start empty.
    /// Future mutations are persisted back to the same path.
    pub async fn open(snapshot_path: impl AsRef<Path>, dimension: usize) -> Result<Self> {
        let snapshot_path = snapshot_path.as_ref().to_path_buf();
        let mut store = Self::new(dimension);

        if fs::try_exists(&snapshot_path).await? {
            let bytes = fs::read(&snapshot_path).await?;
            let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
            if snapshot.dimension != dimension {
                return Err(VectorIndexError::InvalidDimension {
                    expected: dimension,
                    actual: snapshot.dimension,
                });
            }
            let mut state = store.state.write().expect("vector index lock poisoned");
            for record in snapshot.records {
                state.index.upsert(record.tool_id.clone(), record.embedding_vector.clone())?;
                state.records.insert(record.tool_id.clone(), record);
            }
            drop(state);
        }

        store.snapshot_path = Some(snapshot_path);
        Ok(store)
    }

    async fn persist(&self) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let snapshot = {
            let state = self.state.read().expect("vector index lock poisoned");
            Snapshot {
                schema_version: SCHEMA_VERSION,
                dimension: state.index.dimension(),
                records: state.records.values().cloned().collect(),
            }
        };

        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).await?;
        let tmp_path = parent.join(format!(".{}.tmp", uuid::Uuid::new_v4()));
        let bytes = serde_json::to_vec_pretty(&snapshot)?;
        fs::write(&tmp_path, &bytes).await?;
        fs::rename(&tmp_path, path).await?;
        Ok(())
    }
}

#[async_trait]
impl VectorStore for InProcessVectorStore {
    async fn upsert(&self, record: ToolRecord) -> Result<()> {
        {
            let mut state = self.state.write().expect("vector index lock poisoned");
            state
                .index
                .upsert(record.tool_id.clone(), record.embedding_vector.clone())?;
            state.records.insert(record.tool_id.clone(), record);
        }
        self.persist().await
    }

    async fn search(
        &self,
        query_vector: &[f32],
        top_k: usize,
        filter: &VectorFilter,
    ) -> Result<Vec<SearchHit>> {
        let state = self.state.read().expect("vector index lock poisoned");
        let candidate_ids: Vec<String> = state
            .records
            .values()
            .filter(|record| filter.matches(record))
            .map(|record| record.tool_id.clone())
            .collect();

        let hits = state.index.search(query_vector, top_k, &candidate_ids)?;
        Ok(hits
            .into_iter()
            .filter_map(|(tool_id, score)| {
                state.records.get(&tool_id).map(|record| SearchHit {
                    record: record.clone(),
                    score,
                })
            })
            .collect())
    }

    async fn scroll(&self, filter: &VectorFilter) -> Result<Vec<ToolRecord>> {
        let state = self.state.read().expect("vector index lock poisoned");
        Ok(state
            .records
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }

    async fn get(&self, tool_id: &str) -> Result<Option<ToolRecord>> {
        let state = self.state.read().expect("vector index lock poisoned");
        Ok(state.records.get(tool_id).cloned())
    }

    async fn delete(&self, tool_id: &str) -> Result<()> {
        {
            let mut state = self.state.write().expect("vector index lock poisoned");
            state.index.remove(tool_id);
            state.records.remove(tool_id);
        }
        self.persist().await
    }

    async fn delete_by_server(&self, server_name: &str) -> Result<usize> {
        let removed = {
            let mut state = self.state.write().expect("vector index lock poisoned");
            let stale: Vec<String> = state
                .records
                .values()
                .filter(|record| record.server_name == server_name)
                .map(|record| record.tool_id.clone())
                .collect();
            for tool_id in &stale {
                state.index.remove(tool_id);
                state.records.remove(tool_id);
            }
            stale.len()
        };
        if removed > 0 {
            self.persist().await?;
        }
        Ok(removed)
    }

    fn dimension(&self) -> usize {
        self.state.read().expect("vector index lock poisoned").index.dimension()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(tool_id: &str, server_name: &str, blocked: bool, vector: Vec<f32>) -> ToolRecord {
        ToolRecord {
            tool_id: tool_id.to_string(),
            server_name: server_name.to_string(),
            tool_name: "do_thing".to_string(),
            original_description: "does a thing".to_string(),
            input_schema: serde_json::json!({}),
            enriched_description: "does a thing, enriched".to_string(),
            embedding_vector: vector,
            blocked,
        }
    }

    #[tokio::test]
    async fn upsert_then_search_finds_closest() {
        let store = InProcessVectorStore::new(2);
        store.upsert(record("a", "srv", false, vec![1.0, 0.0])).await.unwrap();
        store.upsert(record("b", "srv", false, vec![0.0, 1.0])).await.unwrap();

        let hits = store
            .search(&[1.0, 0.0], 1, &VectorFilter::default())
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.tool_id, "a");
    }

    #[tokio::test]
    async fn search_filters_by_server_name() {
        let store = InProcessVectorStore::new(2);
        store.upsert(record("a", "srv-1", false, vec![1.0, 0.0])).await.unwrap();
        store.upsert(record("b", "srv-2", false, vec![1.0, 0.0])).await.unwrap();

        let filter = VectorFilter {
            server_name: Some("srv-2".to_string()),
            blocked: None,
        };
        let hits = store.search(&[1.0, 0.0], 10, &filter).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.tool_id, "b");
    }

    #[tokio::test]
    async fn delete_by_server_removes_only_that_servers_tools() {
        let store = InProcessVectorStore::new(2);
        store.upsert(record("a", "srv-1", false, vec![1.0, 0.0])).await.unwrap();
        store.upsert(record("b", "srv-2", false, vec![1.0, 0.0])).await.unwrap();

        let removed = store.delete_by_server("srv-1").await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.get("a").await.unwrap().is_none());
        assert!(store.get("b").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn snapshot_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        {
            let store = InProcessVectorStore::open(&path, 2).await.unwrap();
            store.upsert(record("a", "srv", false, vec![1.0, 0.0])).await.unwrap();
        }

        let reopened = InProcessVectorStore::open(&path, 2).await.unwrap();
        let record = reopened.get("a").await.unwrap().expect("record survives reopen");
        assert_eq!(record.tool_id, "a");
    }

    #[tokio::test]
    async fn dimension_mismatch_on_open_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        {
            let store = InProcessVectorStore::open(&path, 2).await.unwrap();
            store.upsert(record("a", "srv", false, vec![1.0, 0.0])).await.unwrap();
        }

        let result = InProcessVectorStore::open(&path, 3).await;
        assert!(result.is_err());
    }
}
