use crate::model::ContentKind;
use serde::{Deserialize, Serialize};

/// What tool execution returns to the calling model: an ordered list of
/// parts, preserving the order of the upstream tool's raw result.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ResultEnvelope {
    pub parts: Vec<EnvelopePart>,
}

impl ResultEnvelope {
    #[must_use]
    pub fn inline(text: impl Into<String>) -> Self {
        Self {
            parts: vec![EnvelopePart::InlineText { text: text.into() }],
        }
    }

    #[must_use]
    pub fn error(kind: &str, message: &str) -> Self {
        Self::inline(format!("ERROR:{kind}: {message}"))
    }

    pub fn push(&mut self, part: EnvelopePart) {
        self.parts.push(part);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EnvelopePart {
    InlineText {
        text: String,
    },
    ContentRefPreview {
        ref_id: String,
        kind: ContentKind,
        preview: String,
        total_chunks: usize,
        mime: String,
    },
}
