use router_protocol::RouterError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("mcp client error: {0}")]
    McpClient(#[from] router_mcp_client::McpClientError),

    #[error("vector index error: {0}")]
    VectorIndex(#[from] router_vector_index::VectorIndexError),

    #[error("provider error: {0}")]
    Provider(#[from] router_providers::ProviderError),
}

impl From<IndexerError> for RouterError {
    fn from(err: IndexerError) -> Self {
        match err {
            IndexerError::McpClient(e) => e.into(),
            IndexerError::VectorIndex(e) => e.into(),
            IndexerError::Provider(e) => e.into(),
        }
    }
}
