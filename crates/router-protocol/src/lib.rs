//! Shared data model for the semantic router runtime.
//!
//! Every crate in the workspace depends on this one for the record types
//! that cross subsystem boundaries (`ToolRecord`, `Task`, `ContentRef`,
//! `ResultEnvelope`, `ServerConfig`) and for the single `RouterError`
//! taxonomy used to surface failures back through the meta-tool.

mod envelope;
mod error;
mod model;
mod ops;

pub use envelope::{EnvelopePart, ResultEnvelope};
pub use error::RouterError;
pub use model::{
    ContentKind, ContentRef, RunningServerSnapshot, ServerConfig, ServerState, Task, TaskStatus,
    ToolRecord,
};
pub use ops::{default_top_k, RouterOperation, ServerAction, MAX_TOP_K};

/// Default embedding dimensionality, overridable via `DIMENSIONS`.
pub const DEFAULT_DIMENSIONS: usize = 1024;

/// Default chunking threshold, overridable via `MAX_RESULT_TOKENS`.
pub const DEFAULT_MAX_RESULT_TOKENS: usize = 5_000;

/// Deterministic tool identity, stable across re-indexing.
#[must_use]
pub fn tool_id(server_name: &str, tool_name: &str) -> String {
    use std::fmt::Write as _;
    use std::hash::{Hash, Hasher};

    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    server_name.hash(&mut hasher);
    0u8.hash(&mut hasher); // separator so "ab"+"c" != "a"+"bc"
    tool_name.hash(&mut hasher);
    let digest = hasher.finish();

    let mut out = String::with_capacity(16);
    let _ = write!(out, "{digest:016x}");
    out
}
