use crate::error::{Result, TaskPoolError};
use crate::queue::QueueEntry;
use router_content_store::ContentStore;
use router_protocol::{RouterError, Task, TaskStatus};
use router_providers::Vision;
use router_result_processor::ResultProcessor;
use router_supervisor::ServerSupervisor;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

const DEFAULT_WORKER_COUNT: usize = 4;
const DEFAULT_MAX_QUEUE_DEPTH: usize = 1024;
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

fn now_unix_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Fixed-size worker pool executing `execute_tool(in_background=true)`
/// requests off the calling MCP session. Workers pull the
/// highest-priority `QUEUED` task, acquire the target server via the
/// [`ServerSupervisor`], run the call, and pass the result through the
/// [`ResultProcessor`] before marking the task terminal.
pub struct TaskPool {
    tasks: Mutex<HashMap<String, Task>>,
    queue: Mutex<BinaryHeap<QueueEntry>>,
    notify: Notify,
    seq: AtomicU64,
    max_queue_depth: usize,
    call_timeout: Duration,
    supervisor: Arc<ServerSupervisor>,
    content_store: Arc<ContentStore>,
    vision: Option<Arc<dyn Vision>>,
    describe_images: bool,
}

impl TaskPool {
    #[must_use]
    pub fn new(
        supervisor: Arc<ServerSupervisor>,
        content_store: Arc<ContentStore>,
        vision: Option<Arc<dyn Vision>>,
        describe_images: bool,
    ) -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            queue: Mutex::new(BinaryHeap::new()),
            notify: Notify::new(),
            seq: AtomicU64::new(0),
            max_queue_depth: DEFAULT_MAX_QUEUE_DEPTH,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            supervisor,
            content_store,
            vision,
            describe_images,
        }
    }

    pub async fn submit(
        &self,
        server_name: String,
        tool_name: String,
        arguments: serde_json::Value,
        priority: i64,
    ) -> Result<String> {
        let mut queue = self.queue.lock().await;
        if queue.len() >= self.max_queue_depth {
            return Err(TaskPoolError::Backpressure { depth: queue.len() });
        }

        let task_id = uuid::Uuid::new_v4().to_string();
        let submitted_at_unix_ms = now_unix_ms();
        let task = Task {
            task_id: task_id.clone(),
            server_name,
            tool_name,
            arguments,
            priority,
            submitted_at_unix_ms,
            status: TaskStatus::Queued,
            result: None,
            error: None,
        };

        self.tasks.lock().await.insert(task_id.clone(), task);
        queue.push(QueueEntry {
            task_id: task_id.clone(),
            priority,
            submitted_at_unix_ms,
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
        });
        drop(queue);
        self.notify.notify_one();

        Ok(task_id)
    }

    pub async fn poll(&self, task_id: &str) -> Result<Task> {
        self.tasks
            .lock()
            .await
            .get(task_id)
            .cloned()
            .ok_or_else(|| TaskPoolError::UnknownTask(task_id.to_string()))
    }

    /// Marks a `QUEUED` task `CANCELLED`. A `RUNNING` task is not
    /// forcibly interrupted; it is left to finish and its terminal
    /// status stands.
    pub async fn cancel(&self, task_id: &str) -> Result<()> {
        let mut tasks = self.tasks.lock().await;
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| TaskPoolError::UnknownTask(task_id.to_string()))?;
        if task.status == TaskStatus::Queued {
            task.status = TaskStatus::Cancelled;
        }
        Ok(())
    }

    /// Spawns the fixed worker set. Returns their join handles so the
    /// caller can await a clean shutdown.
    pub fn spawn_workers(self: &Arc<Self>, worker_count: usize) -> Vec<tokio::task::JoinHandle<()>> {
        let worker_count = if worker_count == 0 { DEFAULT_WORKER_COUNT } else { worker_count };
        (0..worker_count)
            .map(|id| {
                let pool = self.clone();
                tokio::spawn(async move { pool.run_worker(id).await })
            })
            .collect()
    }

    async fn run_worker(self: Arc<Self>, worker_id: usize) {
        loop {
            let Some(task_id) = self.next_runnable_task().await else {
                self.notify.notified().await;
                continue;
            };
            log::debug!("worker {worker_id} picked up task {task_id}");
            self.run_task(&task_id).await;
        }
    }

    /// Pops entries until one still maps to a `QUEUED` task (earlier
    /// entries may have been cancelled while queued) or the queue is
    /// empty.
    async fn next_runnable_task(&self) -> Option<String> {
        loop {
            let task_id = self.queue.lock().await.pop()?.task_id;
            let mut tasks = self.tasks.lock().await;
            match tasks.get_mut(&task_id) {
                Some(task) if task.status == TaskStatus::Queued => {
                    task.status = TaskStatus::Running;
                    return Some(task_id);
                }
                _ => continue,
            }
        }
    }

    async fn run_task(&self, task_id: &str) {
        let (server_name, tool_name, arguments) = {
            let tasks = self.tasks.lock().await;
            let task = tasks.get(task_id).expect("task set to Running by this worker");
            (task.server_name.clone(), task.tool_name.clone(), task.arguments.clone())
        };

        let outcome = self.execute(&server_name, &tool_name, arguments, task_id).await;

        let mut tasks = self.tasks.lock().await;
        let task = tasks.get_mut(task_id).expect("task present for the whole of its lifetime");
        match outcome {
            Ok(envelope) => {
                task.status = TaskStatus::Succeeded;
                task.result = Some(envelope);
            }
            Err(err) => {
                task.status = TaskStatus::Failed;
                task.error = Some(err.envelope_message());
            }
        }
    }

    async fn execute(
        &self,
        server_name: &str,
        tool_name: &str,
        arguments: serde_json::Value,
        task_id: &str,
    ) -> std::result::Result<router_protocol::ResultEnvelope, RouterError> {
        let guard = self.supervisor.acquire(server_name).await?;

        let raw_result = guard
            .client()
            .call_tool(tool_name, arguments, self.call_timeout)
            .await
            .map_err(RouterError::from)?;
        drop(guard);

        let processor = ResultProcessor::new(&self.content_store, self.vision.as_deref(), self.describe_images);
        processor
            .process(task_id, &raw_result)
            .await
            .map_err(RouterError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn pool() -> TaskPool {
        let dir = tempfile::tempdir().unwrap();
        let content_store = Arc::new(ContentStore::new(dir.path()).await.unwrap());
        let supervisor = Arc::new(ServerSupervisor::new(Vec::new()));
        TaskPool::new(supervisor, content_store, None, true)
    }

    #[tokio::test]
    async fn submit_then_poll_reports_queued() {
        let pool = pool().await;
        let task_id = pool
            .submit("srv".into(), "tool".into(), serde_json::json!({}), 0)
            .await
            .unwrap();
        let task = pool.poll(&task_id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Queued);
    }

    #[tokio::test]
    async fn poll_of_unknown_task_is_rejected() {
        let pool = pool().await;
        let err = pool.poll("ghost").await.unwrap_err();
        assert!(matches!(err, TaskPoolError::UnknownTask(_)));
    }

    #[tokio::test]
    async fn cancel_moves_queued_task_to_cancelled() {
        let pool = pool().await;
        let task_id = pool
            .submit("srv".into(), "tool".into(), serde_json::json!({}), 0)
            .await
            .unwrap();
        pool.cancel(&task_id).await.unwrap();
        let task = pool.poll(&task_id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Cancelled);
    }

    #[tokio::test]
    async fn submit_rejects_once_queue_is_full() {
        let mut pool = pool().await;
        pool.max_queue_depth = 1;
        pool.submit("srv".into(), "a".into(), serde_json::json!({}), 0).await.unwrap();
        let err = pool
            .submit("srv".into(), "b".into(), serde_json::json!({}), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskPoolError::Backpressure { .. }));
    }
}
