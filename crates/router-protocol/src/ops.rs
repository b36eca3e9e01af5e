use serde::{Deserialize, Serialize};

/// The tagged envelope accepted by the single outward `semantic_router`
/// tool. Deserialized from `{"operation": "...", ...}`; unrecognized extra
/// fields are ignored by serde's internally-tagged-enum deserializer, so
/// each variant's own fields form an open per-operation object rather than
/// a closed schema.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum RouterOperation {
    SearchTools {
        query: String,
        #[serde(default = "default_top_k")]
        top_k: usize,
        server_filter: Option<String>,
    },
    GetServerInfo {
        server_name: String,
    },
    ListServerTools {
        server_name: String,
    },
    GetToolDetails {
        server_name: String,
        tool_name: String,
    },
    ManageServer {
        server_name: String,
        action: ServerAction,
    },
    ListRunningServers,
    ExecuteTool {
        server_name: String,
        tool_name: String,
        #[serde(default)]
        arguments: serde_json::Value,
        #[serde(default)]
        in_background: bool,
        priority: Option<i64>,
    },
    PollTaskResult {
        task_id: String,
    },
    GetContent {
        ref_id: String,
        #[serde(default)]
        chunk_index: usize,
    },
}

#[must_use]
pub const fn default_top_k() -> usize {
    5
}

/// Maximum allowed `top_k` for `search_tools`; requests above this are
/// rejected rather than silently clamped.
pub const MAX_TOP_K: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ServerAction {
    Start,
    Shutdown,
}
