use router_protocol::RouterError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContentStoreError>;

#[derive(Error, Debug)]
pub enum ContentStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("manifest corrupt for {ref_id}: {reason}")]
    ManifestCorrupt { ref_id: String, reason: String },

    #[error("content ref not found: {0}")]
    NotFound(String),

    #[error("chunk index {chunk_index} out of range for {ref_id} (total_chunks={total_chunks})")]
    OutOfRange {
        ref_id: String,
        chunk_index: usize,
        total_chunks: usize,
    },
}

impl From<ContentStoreError> for RouterError {
    fn from(err: ContentStoreError) -> Self {
        match err {
            ContentStoreError::NotFound(ref_id) => Self::NotFound(ref_id),
            ContentStoreError::OutOfRange {
                ref_id,
                chunk_index,
                total_chunks,
            } => Self::OutOfRange(format!(
                "chunk {chunk_index} out of range for {ref_id} (total_chunks={total_chunks})"
            )),
            other => Self::StorageError(other.to_string()),
        }
    }
}
