//! A minimal stdio MCP server with three tools, used only as the upstream
//! fixture in `router-server`/`router-cli` integration tests: `echo` returns
//! its `text` argument, `sleep_echo` does the same after a delay (useful for
//! exercising task-pool ordering), and `crash` exits the process immediately
//! to simulate a server dying mid-call.

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServiceExt};
use serde::Deserialize;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct EchoRequest {
    text: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct SleepEchoRequest {
    text: String,
    delay_ms: u64,
}

#[derive(Clone)]
struct FixtureService {
    tool_router: ToolRouter<Self>,
}

impl FixtureService {
    fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl FixtureService {
    #[tool(description = "Echo back the given text")]
    async fn echo(&self, Parameters(request): Parameters<EchoRequest>) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(request.text)]))
    }

    #[tool(description = "Sleep for delay_ms then echo back the given text")]
    async fn sleep_echo(&self, Parameters(request): Parameters<SleepEchoRequest>) -> Result<CallToolResult, McpError> {
        tokio::time::sleep(std::time::Duration::from_millis(request.delay_ms)).await;
        Ok(CallToolResult::success(vec![Content::text(request.text)]))
    }

    #[tool(description = "Exit the process immediately, simulating a crash mid-call")]
    async fn crash(&self) -> Result<CallToolResult, McpError> {
        std::process::exit(1)
    }
}

#[tool_handler]
impl rmcp::ServerHandler for FixtureService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "fixture-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let service = FixtureService::new().serve(rmcp::transport::stdio()).await?;
    service.waiting().await?;
    Ok(())
}
