mod error;
mod processor;

pub use error::{Result, ResultProcessorError};
pub use processor::ResultProcessor;
