use crate::error::{error_result, json_result};
use crate::operations::{dispatch, OperationContext};
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam,
    ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{ErrorData, ServerHandler};
use router_content_store::ContentStore;
use router_protocol::{RouterOperation, ServerConfig};
use router_providers::Embedder;
use router_search::search_tools;
use router_supervisor::ServerSupervisor;
use router_task_pool::TaskPool;
use router_vector_index::VectorStore;
use std::collections::HashMap;
use std::sync::Arc;

const TOOL_NAME: &str = "semantic_router";

/// The single rmcp service exposed to an MCP client: one tool,
/// `semantic_router`, multiplexing discovery, lifecycle, execution, and
/// content-retrieval operations across every configured upstream server.
///
/// The tool's description is rebuilt on every `list_tools` call so the
/// calling model always sees the live set of indexed servers without the
/// static schema growing.
#[derive(Clone)]
pub struct RouterService {
    configs: Arc<HashMap<String, ServerConfig>>,
    vector_index: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    supervisor: Arc<ServerSupervisor>,
    task_pool: Arc<TaskPool>,
    content_store: Arc<ContentStore>,
}

impl RouterService {
    #[must_use]
    pub fn new(
        configs: HashMap<String, ServerConfig>,
        vector_index: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        supervisor: Arc<ServerSupervisor>,
        task_pool: Arc<TaskPool>,
        content_store: Arc<ContentStore>,
    ) -> Self {
        Self {
            configs: Arc::new(configs),
            vector_index,
            embedder,
            supervisor,
            task_pool,
            content_store,
        }
    }

    fn input_schema(&self) -> Arc<rmcp::model::JsonObject> {
        let schema = schemars::schema_for!(RouterOperation);
        let value = serde_json::to_value(schema).unwrap_or_else(|_| serde_json::json!({}));
        Arc::new(value.as_object().cloned().unwrap_or_default())
    }

    fn description(&self) -> String {
        let mut names: Vec<&String> = self.configs.keys().collect();
        names.sort();

        let mut out = String::from(
            "Single entry point to every connected tool server. Operations: \
             search_tools, get_server_info, list_server_tools, get_tool_details, \
             manage_server, list_running_servers, execute_tool, poll_task_result, \
             get_content. Call search_tools first to find a tool by intent, then \
             execute_tool to run it.\n\nIndexed servers:\n",
        );

        if names.is_empty() {
            out.push_str("  (none configured)\n");
        } else {
            for name in names {
                let config = &self.configs[name];
                if config.hints.is_empty() {
                    out.push_str(&format!("  - {name}\n"));
                } else {
                    out.push_str(&format!("  - {name}: {}\n", config.hints.join(", ")));
                }
            }
        }

        out
    }

    fn tool(&self) -> Tool {
        Tool::new(TOOL_NAME, self.description(), self.input_schema())
    }

    /// Shared by the MCP `call_tool` path and by `router-cli`'s HTTP
    /// transport, which dispatches raw JSON bodies directly rather than
    /// going through the MCP wire protocol.
    pub async fn dispatch_value(
        &self,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, router_protocol::RouterError> {
        let operation: RouterOperation = serde_json::from_value(arguments).map_err(|err| {
            router_protocol::RouterError::ProtocolError(format!(
                "malformed semantic_router arguments: {err}"
            ))
        })?;

        let ctx = OperationContext {
            configs: &self.configs,
            vector_index: self.vector_index.as_ref(),
            embedder: self.embedder.as_ref(),
            supervisor: &self.supervisor,
            task_pool: &self.task_pool,
            content_store: &self.content_store,
        };

        dispatch(&ctx, operation).await
    }

    async fn handle_call(&self, arguments: serde_json::Value) -> CallToolResult {
        match self.dispatch_value(arguments).await {
            Ok(value) => json_result(value),
            Err(err) => error_result(err),
        }
    }
}

impl ServerHandler for RouterService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            server_info: Implementation {
                name: "semantic-router".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Route every tool call through the single semantic_router meta-tool \
                 instead of calling upstream servers directly."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            next_cursor: None,
            tools: vec![self.tool()],
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        if request.name.as_ref() != TOOL_NAME {
            return Ok(error_result(router_protocol::RouterError::ProtocolError(
                format!("unknown tool: {}", request.name),
            )));
        }

        let arguments = request
            .arguments
            .map(serde_json::Value::Object)
            .unwrap_or_else(|| serde_json::json!({}));
        Ok(self.handle_call(arguments).await)
    }
}
