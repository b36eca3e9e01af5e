use router_protocol::RouterError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResultProcessorError {
    #[error("content store error: {0}")]
    ContentStore(#[from] router_content_store::ContentStoreError),

    #[error("upstream LLM error: {0}")]
    Provider(#[from] router_providers::ProviderError),

    #[error("malformed upstream part: {0}")]
    MalformedPart(String),
}

impl From<ResultProcessorError> for RouterError {
    fn from(err: ResultProcessorError) -> Self {
        match err {
            ResultProcessorError::ContentStore(e) => e.into(),
            ResultProcessorError::Provider(e) => e.into(),
            ResultProcessorError::MalformedPart(reason) => Self::ProtocolError(reason),
        }
    }
}

pub type Result<T> = std::result::Result<T, ResultProcessorError>;
