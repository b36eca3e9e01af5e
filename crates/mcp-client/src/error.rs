use router_protocol::RouterError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, McpClientError>;

#[derive(Error, Debug)]
pub enum McpClientError {
    #[error("failed to spawn server process: {0}")]
    Spawn(std::io::Error),

    #[error("server did not finish starting within the timeout")]
    StartupTimeout,

    #[error("server process exited or the transport closed: {0}")]
    Crashed(String),

    #[error("tool call did not complete within the timeout")]
    CallTimeout,

    #[error("protocol error: {0}")]
    Protocol(String),
}

impl From<McpClientError> for RouterError {
    fn from(err: McpClientError) -> Self {
        match err {
            McpClientError::Spawn(e) => Self::ServerUnavailable(e.to_string()),
            McpClientError::StartupTimeout => {
                Self::ServerUnavailable("startup timed out".to_string())
            }
            McpClientError::Crashed(reason) => Self::ServerCrashed(reason),
            McpClientError::CallTimeout => Self::Timeout("tool call timed out".to_string()),
            McpClientError::Protocol(reason) => Self::ProtocolError(reason),
        }
    }
}
