use crate::error::{Result, SearchError};
use router_protocol::{ToolRecord, MAX_TOP_K};
use router_providers::Embedder;
use router_vector_index::{VectorFilter, VectorStore};

/// A ranked tool match, as returned to the dispatcher for the
/// `search_tools` operation.
#[derive(Debug, Clone)]
pub struct ToolMatch {
    pub record: ToolRecord,
    pub score: f32,
}

/// Embeds `query` and ranks the tool catalog by cosine similarity.
///
/// Blocked tools are included in results (they're still useful context for
/// the caller); only `execute_tool` enforces the block. `top_k` of zero
/// returns an empty list; anything above [`MAX_TOP_K`] is rejected.
pub async fn search_tools(
    embedder: &dyn Embedder,
    vector_index: &dyn VectorStore,
    query: &str,
    top_k: usize,
    server_filter: Option<&str>,
) -> Result<Vec<ToolMatch>> {
    if top_k > MAX_TOP_K {
        return Err(SearchError::TopKOutOfRange(top_k));
    }
    if top_k == 0 {
        return Ok(Vec::new());
    }

    let query_vector = embedder.embed(query).await?;
    let filter = VectorFilter {
        server_name: server_filter.map(ToString::to_string),
        blocked: None,
    };

    let hits = vector_index.search(&query_vector, top_k, &filter).await?;
    Ok(hits
        .into_iter()
        .map(|hit| ToolMatch {
            record: hit.record,
            score: hit.score,
        })
        .collect())
}
