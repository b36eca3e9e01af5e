use router_protocol::{ContentKind, ContentRef};
use serde::{Deserialize, Serialize};

/// On-disk sidecar written next to a ref's chunks, at
/// `<root>/<ref_id>/manifest.json`. Carries everything in [`ContentRef`]
/// plus the `call_id` that produced it, so refs from the same tool call can
/// be correlated for debugging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub ref_id: String,
    pub kind: ContentKind,
    pub total_chunks: usize,
    pub mime: String,
    pub size_bytes: u64,
    pub vision_description: Option<String>,
    pub created_at_unix_ms: u64,
    pub call_id: Option<String>,
}

impl Manifest {
    #[must_use]
    pub fn into_content_ref(self) -> ContentRef {
        ContentRef {
            ref_id: self.ref_id,
            kind: self.kind,
            total_chunks: self.total_chunks,
            mime: self.mime,
            size_bytes: self.size_bytes,
            vision_description: self.vision_description,
            created_at_unix_ms: self.created_at_unix_ms,
        }
    }
}
