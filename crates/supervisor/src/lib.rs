//! Caches running [`router_mcp_client::MCPClient`] sessions per server,
//! coalescing concurrent starts and evicting idle servers.

mod slot;
mod supervisor;

pub use slot::AcquireGuard;
pub use supervisor::ServerSupervisor;
