use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Immutable per-server record loaded from the servers-config file.
///
/// Created at config load, consumed by the indexer and the supervisor.
/// Never mutated at runtime.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ServerConfig {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub blocked_tools: HashSet<String>,
    #[serde(default)]
    pub ignore: bool,
    #[serde(default)]
    pub overwrite: bool,
}

const fn default_timeout_seconds() -> u64 {
    30
}

impl ServerConfig {
    #[must_use]
    pub fn is_blocked(&self, tool_name: &str) -> bool {
        self.blocked_tools.contains(tool_name)
    }
}

/// One indexed tool. Identity is `(server_name, tool_name)`, hashed by
/// [`crate::tool_id`]. Created/updated by the indexer, read-only at serve
/// time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRecord {
    pub tool_id: String,
    pub server_name: String,
    pub tool_name: String,
    pub original_description: String,
    pub input_schema: serde_json::Value,
    pub enriched_description: String,
    pub embedding_vector: Vec<f32>,
    pub blocked: bool,
}

/// Lifecycle state of one upstream MCP child session.
///
/// `absent -> STARTING -> READY -> STOPPING -> absent`; any state can fall
/// to `FAILED -> absent` on an unrecoverable error. `READY` is required for
/// execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerState {
    Starting,
    Ready,
    Stopping,
    Failed,
}

/// Snapshot of a live server returned by `list_running_servers`. The live
/// `MCPClient` handle itself lives in `router-supervisor`, not here — this
/// type is the read-only projection that crosses the dispatcher boundary.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RunningServerSnapshot {
    pub server_name: String,
    pub state: ServerState,
    pub started_at_unix_ms: u64,
    pub last_used_at_unix_ms: u64,
    pub in_flight_count: u32,
}

/// Terminal-or-not status of a background [`Task`]. A task's observed
/// statuses are a prefix of `[Queued, Running, <terminal>]` and never move
/// backward through that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl TaskStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

/// A background execution record, resident in the task pool's in-memory
/// map for the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub server_name: String,
    pub tool_name: String,
    pub arguments: serde_json::Value,
    pub priority: i64,
    pub submitted_at_unix_ms: u64,
    pub status: TaskStatus,
    pub result: Option<crate::envelope::ResultEnvelope>,
    pub error: Option<String>,
}

/// What kind of payload a [`ContentRef`] durably stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentKind {
    TextChunked,
    Image,
    Audio,
    Binary,
}

/// Durable reference to an offloaded payload. Immutable once published:
/// readers see either the complete set of chunks or no ref at all.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ContentRef {
    pub ref_id: String,
    pub kind: ContentKind,
    pub total_chunks: usize,
    pub mime: String,
    pub size_bytes: u64,
    pub vision_description: Option<String>,
    pub created_at_unix_ms: u64,
}
