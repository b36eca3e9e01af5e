use router_protocol::RouterError;
use rmcp::model::{CallToolResult, Content};

/// Renders any internal failure as a single `ERROR:<kind>: <message>` text
/// part. The router never lets an error escape as a transport-level
/// failure of `semantic_router` itself — `call_tool` always returns
/// `Ok(CallToolResult::success(..))`.
pub fn error_result(err: RouterError) -> CallToolResult {
    log::warn!("semantic_router operation failed: {err}");
    CallToolResult::success(vec![Content::text(err.envelope_message())])
}

pub fn json_result(value: serde_json::Value) -> CallToolResult {
    let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
    CallToolResult::success(vec![Content::text(text)])
}
