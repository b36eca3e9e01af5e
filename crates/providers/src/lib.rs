//! Narrow ports to an external LLM/embedding provider, plus OpenAI-backed
//! implementations. `router-indexer` and `router-result-processor` depend
//! only on the traits in [`port`]; nothing else in the workspace knows
//! about OpenAI specifically.

mod error;
mod openai;
mod port;

pub use error::{ProviderError, Result};
pub use openai::{OpenAiDescriber, OpenAiEmbedder, OpenAiVision};
pub use port::{Describer, Embedder, Vision};
