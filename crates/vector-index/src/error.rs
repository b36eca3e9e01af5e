use router_protocol::RouterError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorIndexError>;

#[derive(Error, Debug)]
pub enum VectorIndexError {
    #[error("invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<VectorIndexError> for RouterError {
    fn from(err: VectorIndexError) -> Self {
        Self::StorageError(err.to_string())
    }
}
