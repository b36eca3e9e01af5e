use crate::error::Result;
use router_content_store::{ContentStore, PutTextOutcome};
use router_protocol::{ContentKind, EnvelopePart, ResultEnvelope};
use router_providers::Vision;
use rmcp::model::{CallToolResult, RawContent};

/// Turns one raw upstream `call_tool` result into a [`ResultEnvelope`],
/// offloading oversized text and all binary parts to the [`ContentStore`].
///
/// All refs produced for a single call share `call_id` so a reader can
/// correlate them later via the content-store manifests.
pub struct ResultProcessor<'a> {
    pub content_store: &'a ContentStore,
    pub vision: Option<&'a dyn Vision>,
    pub describe_images: bool,
}

impl<'a> ResultProcessor<'a> {
    #[must_use]
    pub fn new(content_store: &'a ContentStore, vision: Option<&'a dyn Vision>, describe_images: bool) -> Self {
        Self {
            content_store,
            vision,
            describe_images,
        }
    }

    pub async fn process(&self, call_id: &str, result: &CallToolResult) -> Result<ResultEnvelope> {
        let mut envelope = ResultEnvelope::default();

        for content in &result.content {
            let part = match &content.raw {
                RawContent::Text(text) => self.process_text(&text.text, call_id).await?,
                RawContent::Image(image) => self.process_image(&image.data, &image.mime_type, call_id).await?,
                RawContent::Audio(audio) => self.process_binary(&audio.data, &audio.mime_type, ContentKind::Audio, call_id).await?,
                RawContent::Resource(resource) => {
                    let text = format!("{:?}", resource.resource);
                    self.process_text(&text, call_id).await?
                }
                RawContent::ResourceLink(link) => self.process_text(&link.uri, call_id).await?,
            };
            envelope.push(part);
        }

        Ok(envelope)
    }

    async fn process_text(&self, text: &str, call_id: &str) -> Result<EnvelopePart> {
        match self.content_store.put_text(text, Some(call_id)).await? {
            PutTextOutcome::Inline(text) => Ok(EnvelopePart::InlineText { text }),
            PutTextOutcome::Chunked { content_ref, preview } => Ok(EnvelopePart::ContentRefPreview {
                ref_id: content_ref.ref_id,
                kind: content_ref.kind,
                preview,
                total_chunks: content_ref.total_chunks,
                mime: content_ref.mime,
            }),
        }
    }

    async fn process_image(&self, base64_data: &str, mime_type: &str, call_id: &str) -> Result<EnvelopePart> {
        use base64::Engine;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(base64_data)
            .map_err(|e| crate::error::ResultProcessorError::MalformedPart(format!("invalid base64 image data: {e}")))?;

        let content_ref = self
            .content_store
            .put_binary(&bytes, mime_type, ContentKind::Image, Some(call_id))
            .await?;

        let mut preview = String::new();
        if self.describe_images {
            if let Some(vision) = self.vision {
                match vision.describe_image(&bytes, mime_type).await {
                    Ok(description) => {
                        self.content_store
                            .set_vision_description(&content_ref.ref_id, &description)
                            .await?;
                        preview = description;
                    }
                    Err(err) => {
                        log::warn!("vision description failed for ref {}: {err}", content_ref.ref_id);
                    }
                }
            }
        }

        Ok(EnvelopePart::ContentRefPreview {
            ref_id: content_ref.ref_id,
            kind: content_ref.kind,
            preview,
            total_chunks: content_ref.total_chunks,
            mime: content_ref.mime,
        })
    }

    async fn process_binary(&self, base64_data: &str, mime_type: &str, kind: ContentKind, call_id: &str) -> Result<EnvelopePart> {
        use base64::Engine;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(base64_data)
            .map_err(|e| crate::error::ResultProcessorError::MalformedPart(format!("invalid base64 data: {e}")))?;

        let content_ref = self
            .content_store
            .put_binary(&bytes, mime_type, kind, Some(call_id))
            .await?;

        Ok(EnvelopePart::ContentRefPreview {
            ref_id: content_ref.ref_id,
            kind: content_ref.kind,
            preview: String::new(),
            total_chunks: content_ref.total_chunks,
            mime: content_ref.mime,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use router_providers::ProviderError;

    struct StubVision;

    #[async_trait]
    impl Vision for StubVision {
        async fn describe_image(&self, _bytes: &[u8], _mime_type: &str) -> std::result::Result<String, ProviderError> {
            Ok("a red square".to_string())
        }
    }

    fn text_result(text: &str) -> CallToolResult {
        CallToolResult::success(vec![rmcp::model::Content::text(text.to_string())])
    }

    #[tokio::test]
    async fn small_text_part_is_inlined() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path()).await.unwrap();
        let processor = ResultProcessor::new(&store, None, true);

        let envelope = processor.process("call-1", &text_result("hello")).await.unwrap();
        assert_eq!(envelope.parts.len(), 1);
        assert!(matches!(&envelope.parts[0], EnvelopePart::InlineText { text } if text == "hello"));
    }

    #[tokio::test]
    async fn oversized_text_part_is_offloaded() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::with_max_result_tokens(dir.path(), 5).await.unwrap();
        let processor = ResultProcessor::new(&store, None, true);

        let big = "word ".repeat(1000);
        let envelope = processor.process("call-1", &text_result(&big)).await.unwrap();
        assert_eq!(envelope.parts.len(), 1);
        assert!(matches!(&envelope.parts[0], EnvelopePart::ContentRefPreview { .. }));
    }

    #[tokio::test]
    async fn image_part_is_described_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path()).await.unwrap();
        let vision = StubVision;
        let processor = ResultProcessor::new(&store, Some(&vision), true);

        use base64::Engine;
        let data = base64::engine::general_purpose::STANDARD.encode([1u8, 2, 3]);
        let result = CallToolResult::success(vec![rmcp::model::Content::image(data, "image/png".to_string())]);

        let envelope = processor.process("call-2", &result).await.unwrap();
        let EnvelopePart::ContentRefPreview { ref_id, preview, .. } = &envelope.parts[0] else {
            panic!("expected content ref preview");
        };
        assert_eq!(preview, "a red square");
        let (_, content_ref) = store.get(ref_id, 0).await.unwrap();
        assert_eq!(content_ref.vision_description.as_deref(), Some("a red square"));
    }

    #[tokio::test]
    async fn image_part_preview_is_empty_when_vision_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path()).await.unwrap();
        let processor = ResultProcessor::new(&store, None, false);

        use base64::Engine;
        let data = base64::engine::general_purpose::STANDARD.encode([1u8, 2, 3]);
        let result = CallToolResult::success(vec![rmcp::model::Content::image(data, "image/png".to_string())]);

        let envelope = processor.process("call-3", &result).await.unwrap();
        let EnvelopePart::ContentRefPreview { preview, .. } = &envelope.parts[0] else {
            panic!("expected content ref preview");
        };
        assert!(preview.is_empty());
    }

    #[tokio::test]
    async fn audio_part_preview_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path()).await.unwrap();
        let processor = ResultProcessor::new(&store, None, true);

        use base64::Engine;
        let data = base64::engine::general_purpose::STANDARD.encode([4u8, 5, 6]);
        let result = CallToolResult::success(vec![rmcp::model::Content::new(
            rmcp::model::RawContent::Audio(rmcp::model::RawAudioContent {
                data,
                mime_type: "audio/wav".to_string(),
            }),
            None,
        )]);

        let envelope = processor.process("call-4", &result).await.unwrap();
        let EnvelopePart::ContentRefPreview { preview, .. } = &envelope.parts[0] else {
            panic!("expected content ref preview");
        };
        assert!(preview.is_empty());
    }
}
