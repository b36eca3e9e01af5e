use crate::slot::{now_unix_ms, AcquireGuard, RunningServer, SlotState};
use router_mcp_client::{McpClientError, MCPClient};
use router_protocol::{RouterError, RunningServerSnapshot, ServerConfig, ServerState};
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Caches and supervises one [`MCPClient`] per configured server.
///
/// Concurrent `acquire()` calls for the same not-yet-running server share a
/// single start attempt instead of racing to spawn the child process twice;
/// a transient startup failure is retried once before being surfaced.
pub struct ServerSupervisor {
    configs: HashMap<String, ServerConfig>,
    slots: Arc<Mutex<HashMap<String, SlotState>>>,
}

impl ServerSupervisor {
    #[must_use]
    pub fn new(configs: Vec<ServerConfig>) -> Self {
        let configs = configs
            .into_iter()
            .map(|config| (config.name.clone(), config))
            .collect();
        Self {
            configs,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn acquire(&self, server_name: &str) -> Result<AcquireGuard, RouterError> {
        loop {
            enum Action {
                Return(AcquireGuard),
                StartNow,
                WaitFor(Arc<Notify>),
            }

            let action = {
                let mut slots = self.slots.lock().await;
                match slots.get(server_name) {
                    Some(SlotState::Ready(server)) => {
                        server.in_flight_count.fetch_add(1, Ordering::AcqRel);
                        server.touch();
                        Action::Return(AcquireGuard {
                            server: server.clone(),
                        })
                    }
                    Some(SlotState::Starting(notify) | SlotState::Stopping(notify)) => {
                        Action::WaitFor(notify.clone())
                    }
                    None | Some(SlotState::Failed(_)) => {
                        if !self.configs.contains_key(server_name) {
                            return Err(RouterError::UnknownServer(server_name.to_string()));
                        }
                        let notify = Arc::new(Notify::new());
                        slots.insert(server_name.to_string(), SlotState::Starting(notify));
                        Action::StartNow
                    }
                }
            };

            match action {
                Action::Return(guard) => return Ok(guard),
                Action::WaitFor(notify) => notify.notified().await,
                Action::StartNow => return self.start_and_install(server_name).await,
            }
        }
    }

    async fn start_and_install(&self, server_name: &str) -> Result<AcquireGuard, RouterError> {
        let config = self
            .configs
            .get(server_name)
            .expect("presence checked by caller")
            .clone();

        let mut result = self.try_start(&config).await;
        if let Err(err) = &result {
            if matches!(
                err,
                McpClientError::StartupTimeout | McpClientError::Crashed(_)
            ) {
                log::warn!(
                    "server '{server_name}' failed to start ({err}), retrying once"
                );
                result = self.try_start(&config).await;
            }
        }

        let mut slots = self.slots.lock().await;
        match result {
            Ok(client) => {
                let server = Arc::new(RunningServer::new(client));
                server.in_flight_count.fetch_add(1, Ordering::AcqRel);
                let guard = AcquireGuard {
                    server: server.clone(),
                };
                let previous = slots.insert(server_name.to_string(), SlotState::Ready(server));
                notify_waiters(previous);
                Ok(guard)
            }
            Err(err) => {
                let router_err: RouterError = err.into();
                let previous = slots.insert(
                    server_name.to_string(),
                    SlotState::Failed(router_err.to_string()),
                );
                notify_waiters(previous);
                Err(router_err)
            }
        }
    }

    async fn try_start(&self, config: &ServerConfig) -> Result<MCPClient, McpClientError> {
        let slots = self.slots.clone();
        let server_name = config.name.clone();
        MCPClient::start(config, move |name, reason| {
            log::warn!("server '{name}' terminated unexpectedly: {reason}");
            tokio::spawn(async move {
                let mut slots = slots.lock().await;
                if matches!(slots.get(&server_name), Some(SlotState::Ready(_)) | None) {
                    slots.insert(server_name, SlotState::Failed(reason));
                }
            });
        })
        .await
    }

    /// Explicitly warm a server without holding it. Used by the
    /// `manage_server { action: start }` operation.
    pub async fn start(&self, server_name: &str) -> Result<(), RouterError> {
        self.acquire(server_name).await.map(drop)
    }

    /// Shut down a running server, waiting up to a grace deadline for
    /// in-flight calls to drain before forcibly terminating it.
    pub async fn shutdown(&self, server_name: &str) -> Result<(), RouterError> {
        let server = {
            let mut slots = self.slots.lock().await;
            match slots.remove(server_name) {
                Some(SlotState::Ready(server)) => server,
                Some(other @ (SlotState::Starting(_) | SlotState::Stopping(_))) => {
                    slots.insert(server_name.to_string(), other);
                    return Ok(());
                }
                Some(SlotState::Failed(_)) | None => return Ok(()),
            }
        };

        let deadline = tokio::time::Instant::now() + SHUTDOWN_GRACE;
        while server.in_flight_count.load(Ordering::Acquire) > 0
            && tokio::time::Instant::now() < deadline
        {
            tokio::time::sleep(SHUTDOWN_POLL_INTERVAL).await;
        }

        match Arc::try_unwrap(server) {
            Ok(server) => server.client.shutdown().await,
            Err(_still_shared) => {
                // An AcquireGuard is still outstanding past the grace deadline;
                // the server was already removed from the table above so no new
                // caller can acquire it, and it terminates once the last guard drops.
                log::warn!(
                    "server '{server_name}' had outstanding handles at the shutdown grace deadline"
                );
            }
        }
        Ok(())
    }

    #[must_use]
    pub async fn list_running(&self) -> Vec<RunningServerSnapshot> {
        let slots = self.slots.lock().await;
        slots
            .iter()
            .filter_map(|(name, slot)| match slot {
                SlotState::Ready(server) => Some(RunningServerSnapshot {
                    server_name: name.clone(),
                    state: ServerState::Ready,
                    started_at_unix_ms: server.started_at_unix_ms,
                    last_used_at_unix_ms: server.last_used_at_unix_ms.load(Ordering::Relaxed),
                    in_flight_count: server.in_flight_count.load(Ordering::Relaxed),
                }),
                SlotState::Starting(_) => Some(RunningServerSnapshot {
                    server_name: name.clone(),
                    state: ServerState::Starting,
                    started_at_unix_ms: 0,
                    last_used_at_unix_ms: 0,
                    in_flight_count: 0,
                }),
                SlotState::Stopping(_) => Some(RunningServerSnapshot {
                    server_name: name.clone(),
                    state: ServerState::Stopping,
                    started_at_unix_ms: 0,
                    last_used_at_unix_ms: 0,
                    in_flight_count: 0,
                }),
                SlotState::Failed(_) => None,
            })
            .collect()
    }

    /// Run forever, periodically shutting down servers that have been
    /// idle (`in_flight_count == 0`) for longer than `idle_ttl`.
    pub async fn run_eviction_sweeper(self: Arc<Self>, idle_ttl: Duration, sweep_interval: Duration) {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            let stale: Vec<String> = {
                let slots = self.slots.lock().await;
                slots
                    .iter()
                    .filter_map(|(name, slot)| match slot {
                        SlotState::Ready(server) if server.is_idle() => {
                            let idle_for = now_unix_ms()
                                .saturating_sub(server.last_used_at_unix_ms.load(Ordering::Relaxed));
                            (idle_for > idle_ttl.as_millis() as u64).then(|| name.clone())
                        }
                        _ => None,
                    })
                    .collect()
            };
            for server_name in stale {
                log::info!("evicting idle server '{server_name}'");
                if let Err(err) = self.shutdown(&server_name).await {
                    log::warn!("failed to evict '{server_name}': {err}");
                }
            }
        }
    }
}

fn notify_waiters(previous: Option<SlotState>) {
    if let Some(SlotState::Starting(notify) | SlotState::Stopping(notify)) = previous {
        notify.notify_waiters();
    }
}
