use router_content_store::{ContentStore, RetrievedChunk};
use router_protocol::{tool_id, RouterError, RouterOperation, ServerAction, ServerConfig};
use router_providers::Embedder;
use router_result_processor::ResultProcessor;
use router_search::search_tools;
use router_supervisor::ServerSupervisor;
use router_task_pool::TaskPool;
use router_vector_index::{VectorFilter, VectorStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const EXECUTE_TOOL_TIMEOUT: Duration = Duration::from_secs(60);

/// Everything one `semantic_router` call needs, borrowed for the
/// duration of a single dispatch. Constructed fresh by [`crate::RouterService`]
/// from its long-lived `Arc` fields.
pub struct OperationContext<'a> {
    pub configs: &'a HashMap<String, ServerConfig>,
    pub vector_index: &'a dyn VectorStore,
    pub embedder: &'a dyn Embedder,
    pub supervisor: &'a Arc<ServerSupervisor>,
    pub task_pool: &'a Arc<TaskPool>,
    pub content_store: &'a Arc<ContentStore>,
}

pub async fn dispatch(ctx: &OperationContext<'_>, operation: RouterOperation) -> Result<serde_json::Value, RouterError> {
    match operation {
        RouterOperation::SearchTools { query, top_k, server_filter } => {
            search_tools_op(ctx, &query, top_k, server_filter.as_deref()).await
        }
        RouterOperation::GetServerInfo { server_name } => get_server_info(ctx, &server_name).await,
        RouterOperation::ListServerTools { server_name } => list_server_tools(ctx, &server_name).await,
        RouterOperation::GetToolDetails { server_name, tool_name } => {
            get_tool_details(ctx, &server_name, &tool_name).await
        }
        RouterOperation::ManageServer { server_name, action } => manage_server(ctx, &server_name, action).await,
        RouterOperation::ListRunningServers => list_running_servers(ctx).await,
        RouterOperation::ExecuteTool {
            server_name,
            tool_name,
            arguments,
            in_background,
            priority,
        } => execute_tool(ctx, &server_name, &tool_name, arguments, in_background, priority).await,
        RouterOperation::PollTaskResult { task_id } => poll_task_result(ctx, &task_id).await,
        RouterOperation::GetContent { ref_id, chunk_index } => get_content(ctx, &ref_id, chunk_index).await,
    }
}

async fn search_tools_op(
    ctx: &OperationContext<'_>,
    query: &str,
    top_k: usize,
    server_filter: Option<&str>,
) -> Result<serde_json::Value, RouterError> {
    let matches = search_tools(ctx.embedder, ctx.vector_index, query, top_k, server_filter)
        .await
        .map_err(RouterError::from)?;

    Ok(serde_json::json!(matches
        .into_iter()
        .map(|m| serde_json::json!({
            "server_name": m.record.server_name,
            "tool_name": m.record.tool_name,
            "score": m.score,
            "enriched_description": m.record.enriched_description,
        }))
        .collect::<Vec<_>>()))
}

async fn get_server_info(ctx: &OperationContext<'_>, server_name: &str) -> Result<serde_json::Value, RouterError> {
    let config = ctx
        .configs
        .get(server_name)
        .ok_or_else(|| RouterError::UnknownServer(server_name.to_string()))?;

    let tools = ctx
        .vector_index
        .scroll(&VectorFilter {
            server_name: Some(server_name.to_string()),
            blocked: None,
        })
        .await
        .map_err(RouterError::from)?;

    let blocked_tools: Vec<&str> = tools
        .iter()
        .filter(|t| t.blocked)
        .map(|t| t.tool_name.as_str())
        .collect();

    Ok(serde_json::json!({
        "server_name": server_name,
        "hints": config.hints,
        "tool_count": tools.len(),
        "blocked_tools": blocked_tools,
    }))
}

async fn list_server_tools(ctx: &OperationContext<'_>, server_name: &str) -> Result<serde_json::Value, RouterError> {
    if !ctx.configs.contains_key(server_name) {
        return Err(RouterError::UnknownServer(server_name.to_string()));
    }

    let tools = ctx
        .vector_index
        .scroll(&VectorFilter {
            server_name: Some(server_name.to_string()),
            blocked: None,
        })
        .await
        .map_err(RouterError::from)?;

    Ok(serde_json::json!(tools
        .into_iter()
        .map(|t| serde_json::json!({
            "tool_name": t.tool_name,
            "short_description": short_description(&t.enriched_description),
            "blocked": t.blocked,
        }))
        .collect::<Vec<_>>()))
}

fn short_description(description: &str) -> String {
    const SHORT_DESCRIPTION_CHARS: usize = 160;
    if description.chars().count() <= SHORT_DESCRIPTION_CHARS {
        description.to_string()
    } else {
        let mut truncated: String = description.chars().take(SHORT_DESCRIPTION_CHARS).collect();
        truncated.push('…');
        truncated
    }
}

async fn get_tool_details(
    ctx: &OperationContext<'_>,
    server_name: &str,
    tool_name: &str,
) -> Result<serde_json::Value, RouterError> {
    let record = ctx
        .vector_index
        .get(&tool_id(server_name, tool_name))
        .await
        .map_err(RouterError::from)?
        .ok_or_else(|| RouterError::UnknownTool {
            server_name: server_name.to_string(),
            tool_name: tool_name.to_string(),
        })?;

    Ok(serde_json::json!({
        "server_name": record.server_name,
        "tool_name": record.tool_name,
        "input_schema": record.input_schema,
    }))
}

async fn manage_server(
    ctx: &OperationContext<'_>,
    server_name: &str,
    action: ServerAction,
) -> Result<serde_json::Value, RouterError> {
    if !ctx.configs.contains_key(server_name) {
        return Err(RouterError::UnknownServer(server_name.to_string()));
    }

    let state = match action {
        ServerAction::Start => {
            ctx.supervisor.start(server_name).await?;
            "READY"
        }
        ServerAction::Shutdown => {
            ctx.supervisor.shutdown(server_name).await?;
            "ABSENT"
        }
    };

    Ok(serde_json::json!({ "server_name": server_name, "state": state }))
}

async fn list_running_servers(ctx: &OperationContext<'_>) -> Result<serde_json::Value, RouterError> {
    Ok(serde_json::json!(ctx.supervisor.list_running().await))
}

async fn execute_tool(
    ctx: &OperationContext<'_>,
    server_name: &str,
    tool_name: &str,
    arguments: serde_json::Value,
    in_background: bool,
    priority: Option<i64>,
) -> Result<serde_json::Value, RouterError> {
    let record = ctx
        .vector_index
        .get(&tool_id(server_name, tool_name))
        .await
        .map_err(RouterError::from)?
        .ok_or_else(|| RouterError::UnknownTool {
            server_name: server_name.to_string(),
            tool_name: tool_name.to_string(),
        })?;

    if record.blocked {
        return Err(RouterError::Blocked {
            server_name: server_name.to_string(),
            tool_name: tool_name.to_string(),
        });
    }

    if in_background {
        let task_id = ctx
            .task_pool
            .submit(server_name.to_string(), tool_name.to_string(), arguments, priority.unwrap_or(0))
            .await?;
        return Ok(serde_json::json!({ "task_id": task_id }));
    }

    let guard = ctx.supervisor.acquire(server_name).await?;
    let raw_result = guard
        .client()
        .call_tool(tool_name, arguments, EXECUTE_TOOL_TIMEOUT)
        .await
        .map_err(RouterError::from)?;
    drop(guard);

    let call_id = uuid::Uuid::new_v4().to_string();
    let processor = ResultProcessor::new(ctx.content_store, None, false);
    let envelope = processor.process(&call_id, &raw_result).await.map_err(RouterError::from)?;
    serde_json::to_value(envelope).map_err(|e| RouterError::Internal(e.to_string()))
}

async fn poll_task_result(ctx: &OperationContext<'_>, task_id: &str) -> Result<serde_json::Value, RouterError> {
    let task = ctx.task_pool.poll(task_id).await?;
    Ok(serde_json::json!({
        "status": task.status,
        "result": task.result,
        "error": task.error,
    }))
}

async fn get_content(ctx: &OperationContext<'_>, ref_id: &str, chunk_index: usize) -> Result<serde_json::Value, RouterError> {
    let (chunk, manifest) = ctx.content_store.get(ref_id, chunk_index).await.map_err(RouterError::from)?;
    let chunk_value = match chunk {
        RetrievedChunk::Text(text) => serde_json::json!({ "text": text }),
        RetrievedChunk::Binary(bytes) => {
            use base64::Engine;
            serde_json::json!({ "base64": base64::engine::general_purpose::STANDARD.encode(bytes) })
        }
    };

    Ok(serde_json::json!({
        "chunk": chunk_value,
        "manifest": manifest,
    }))
}
