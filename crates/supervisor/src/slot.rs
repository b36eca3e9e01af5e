use router_mcp_client::MCPClient;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

pub(crate) fn now_unix_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// A server that finished starting and is accepting calls.
pub(crate) struct RunningServer {
    pub client: MCPClient,
    pub started_at_unix_ms: u64,
    pub last_used_at_unix_ms: AtomicU64,
    pub in_flight_count: AtomicU32,
}

impl RunningServer {
    pub fn new(client: MCPClient) -> Self {
        let now = now_unix_ms();
        Self {
            client,
            started_at_unix_ms: now,
            last_used_at_unix_ms: AtomicU64::new(now),
            in_flight_count: AtomicU32::new(0),
        }
    }

    pub fn touch(&self) {
        self.last_used_at_unix_ms.store(now_unix_ms(), Ordering::Relaxed);
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight_count.load(Ordering::Acquire) == 0
    }
}

/// Lifecycle state of one server's slot in the supervisor's table.
pub(crate) enum SlotState {
    /// A single in-flight start attempt; other concurrent `acquire()`
    /// calls wait on the [`Notify`] instead of racing to spawn twice.
    Starting(Arc<Notify>),
    Ready(Arc<RunningServer>),
    Stopping(Arc<Notify>),
    Failed(String),
}

/// A checked-out handle to a running server. Decrements the server's
/// in-flight counter and refreshes its idle clock when dropped.
pub struct AcquireGuard {
    pub(crate) server: Arc<RunningServer>,
}

impl std::fmt::Debug for AcquireGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcquireGuard").finish_non_exhaustive()
    }
}

impl AcquireGuard {
    #[must_use]
    pub fn client(&self) -> &MCPClient {
        &self.server.client
    }
}

impl Drop for AcquireGuard {
    fn drop(&mut self) {
        self.server.in_flight_count.fetch_sub(1, Ordering::AcqRel);
        self.server.touch();
    }
}
