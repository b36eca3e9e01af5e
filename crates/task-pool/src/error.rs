use router_protocol::RouterError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskPoolError {
    #[error("task queue is full ({depth} tasks queued)")]
    Backpressure { depth: usize },

    #[error("unknown task: {0}")]
    UnknownTask(String),
}

impl From<TaskPoolError> for RouterError {
    fn from(err: TaskPoolError) -> Self {
        match err {
            TaskPoolError::Backpressure { depth } => {
                Self::Backpressure(format!("queue depth {depth} exceeds the maximum"))
            }
            TaskPoolError::UnknownTask(task_id) => Self::NotFound(task_id),
        }
    }
}

pub type Result<T> = std::result::Result<T, TaskPoolError>;
