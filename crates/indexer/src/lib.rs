mod doc;
mod error;
mod indexer;
mod stats;

pub use error::{IndexerError, Result};
pub use indexer::Indexer;
pub use stats::IndexStats;
