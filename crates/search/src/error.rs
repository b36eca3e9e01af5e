use router_protocol::RouterError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("top_k {0} exceeds the maximum of {max}", max = router_protocol::MAX_TOP_K)]
    TopKOutOfRange(usize),

    #[error("vector index error: {0}")]
    VectorIndex(#[from] router_vector_index::VectorIndexError),

    #[error("embedding provider error: {0}")]
    Provider(#[from] router_providers::ProviderError),
}

impl From<SearchError> for RouterError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::TopKOutOfRange(requested) => {
                Self::OutOfRange(format!("top_k {requested} exceeds the maximum of {}", router_protocol::MAX_TOP_K))
            }
            SearchError::VectorIndex(e) => e.into(),
            SearchError::Provider(e) => e.into(),
        }
    }
}
