mod error;
mod pool;
mod queue;

pub use error::{Result, TaskPoolError};
pub use pool::TaskPool;
