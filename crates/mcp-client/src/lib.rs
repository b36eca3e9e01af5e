//! One client session per upstream MCP server. `router-supervisor` owns
//! the lifecycle; this crate only knows how to spawn a server, speak the
//! protocol to it, and report when the connection dies.

mod client;
mod error;

pub use client::MCPClient;
pub use error::{McpClientError, Result};
