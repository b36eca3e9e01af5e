use crate::error::{McpClientError, Result};
use rmcp::model::{CallToolRequestParam, CallToolResult, Tool};
use rmcp::service::{RoleClient, RunningService};
use rmcp::transport::TokioChildProcess;
use rmcp::ServiceExt;
use router_protocol::ServerConfig;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::oneshot;

/// A live session to one upstream MCP server, running as a child process.
///
/// Holds a [`rmcp::service::Peer`] for making calls and a background task
/// that watches the underlying transport for an unexpected exit, reporting
/// it through `on_terminated` rather than a back-pointer to the supervisor
/// that constructed this client.
pub struct MCPClient {
    server_name: String,
    peer: rmcp::service::Peer<RoleClient>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    watcher: Option<tokio::task::JoinHandle<()>>,
}

impl MCPClient {
    pub async fn start<F>(config: &ServerConfig, on_terminated: F) -> Result<Self>
    where
        F: FnOnce(String, String) + Send + 'static,
    {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args);
        for (key, value) in &config.env {
            cmd.env(key, value);
        }

        let transport = TokioChildProcess::new(cmd).map_err(McpClientError::Spawn)?;

        let service: RunningService<RoleClient, ()> = tokio::time::timeout(
            Duration::from_secs(config.timeout_seconds),
            ().serve(transport),
        )
        .await
        .map_err(|_| McpClientError::StartupTimeout)?
        .map_err(|e| McpClientError::Crashed(e.to_string()))?;

        let peer = service.peer().clone();
        let server_name = config.name.clone();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let watcher_name = server_name.clone();
        let watcher = tokio::spawn(async move {
            let cancellation_token = service.cancellation_token();
            tokio::select! {
                result = service.waiting() => {
                    let reason = match result {
                        Ok(quit) => format!("{quit:?}"),
                        Err(join_err) => format!("watcher task join error: {join_err}"),
                    };
                    on_terminated(watcher_name, reason);
                }
                _ = &mut shutdown_rx => {
                    cancellation_token.cancel();
                }
            }
        });

        Ok(Self {
            server_name,
            peer,
            shutdown_tx: Some(shutdown_tx),
            watcher: Some(watcher),
        })
    }

    #[must_use]
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        self.peer
            .list_all_tools()
            .await
            .map_err(|e| classify_service_error(&e))
    }

    pub async fn call_tool(
        &self,
        tool_name: &str,
        arguments: serde_json::Value,
        timeout: Duration,
    ) -> Result<CallToolResult> {
        let arguments = arguments.as_object().cloned();
        tokio::time::timeout(
            timeout,
            self.peer.call_tool(CallToolRequestParam {
                name: tool_name.to_string().into(),
                arguments,
            }),
        )
        .await
        .map_err(|_| McpClientError::CallTimeout)?
        .map_err(|e| classify_service_error(&e))
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(watcher) = self.watcher.take() {
            let _ = watcher.await;
        }
    }
}

/// Distinguishes a dead transport from a genuine protocol-level failure.
///
/// `rmcp`'s service error carries a human-readable message rather than a
/// dedicated "connection closed" variant once the transport is a child
/// process pipe, so a closed/disconnected channel shows up as an I/O-flavored
/// message. Treat those as a crash and everything else (malformed responses,
/// rejected calls) as a protocol error.
fn classify_service_error(err: &rmcp::service::ServiceError) -> McpClientError {
    let message = err.to_string();
    let lower = message.to_lowercase();
    if lower.contains("closed")
        || lower.contains("disconnected")
        || lower.contains("broken pipe")
        || lower.contains("eof")
        || lower.contains("channel")
    {
        McpClientError::Crashed(message)
    } else {
        McpClientError::Protocol(message)
    }
}
