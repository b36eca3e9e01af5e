use router_protocol::RouterError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProviderError>;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("missing credential: {0}")]
    MissingCredential(String),

    #[error("request to upstream LLM provider failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream LLM provider returned an error: {0}")]
    UpstreamError(String),

    #[error("unexpected response shape from upstream LLM provider: {0}")]
    MalformedResponse(String),
}

impl From<ProviderError> for RouterError {
    fn from(err: ProviderError) -> Self {
        Self::UpstreamLlmError(err.to_string())
    }
}
