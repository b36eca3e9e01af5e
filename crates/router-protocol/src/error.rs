use thiserror::Error;

/// The error taxonomy threaded through the runtime. Subsystem crates define
/// their own narrow error enum and convert into this one at the crate
/// boundary; the router renders every variant as a `ResultEnvelope` text
/// part prefixed `ERROR:<kind>: <message>` and never lets one escape as a
/// transport-level failure of `semantic_router` itself.
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("config error: {0}")]
    ConfigError(String),

    #[error("unknown server: {0}")]
    UnknownServer(String),

    #[error("unknown tool: {server_name}/{tool_name}")]
    UnknownTool { server_name: String, tool_name: String },

    #[error("tool is blocked: {server_name}/{tool_name}")]
    Blocked { server_name: String, tool_name: String },

    #[error("server unavailable: {0}")]
    ServerUnavailable(String),

    #[error("server crashed: {0}")]
    ServerCrashed(String),

    #[error("protocol error: {0}")]
    ProtocolError(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("backpressure: {0}")]
    Backpressure(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("out of range: {0}")]
    OutOfRange(String),

    #[error("upstream LLM error: {0}")]
    UpstreamLlmError(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RouterError {
    /// Short machine-readable kind, used as the `ERROR:<kind>:` prefix and
    /// as the `code` field of an out-of-band error report.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::UnknownServer(_) => "UNKNOWN_SERVER",
            Self::UnknownTool { .. } => "UNKNOWN_TOOL",
            Self::Blocked { .. } => "BLOCKED",
            Self::ServerUnavailable(_) => "SERVER_UNAVAILABLE",
            Self::ServerCrashed(_) => "SERVER_CRASHED",
            Self::ProtocolError(_) => "PROTOCOL_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Backpressure(_) => "BACKPRESSURE",
            Self::StorageError(_) => "STORAGE_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::OutOfRange(_) => "OUT_OF_RANGE",
            Self::UpstreamLlmError(_) => "UPSTREAM_LLM_ERROR",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Exit code a CLI subcommand should return for this failure.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigError(_) => 2,
            _ => 1,
        }
    }

    /// Renders as the `ERROR:<kind>: <message>` envelope every outward
    /// surface (the synchronous `semantic_router` call path and background
    /// task polling alike) uses instead of letting the error escape raw.
    #[must_use]
    pub fn envelope_message(&self) -> String {
        format!("ERROR:{}: {self}", self.kind())
    }
}
