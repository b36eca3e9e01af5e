use crate::error::Result;
use async_trait::async_trait;

/// Turns natural-language text into a fixed-dimension vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn dimensions(&self) -> usize;
}

/// Polishes a raw tool-description document into a bounded-length
/// natural-language description suitable for embedding and display.
#[async_trait]
pub trait Describer: Send + Sync {
    async fn describe(&self, document: &str) -> Result<String>;
}

/// Produces a short caption for an image, used as the preview text
/// for offloaded image content.
#[async_trait]
pub trait Vision: Send + Sync {
    async fn describe_image(&self, bytes: &[u8], mime: &str) -> Result<String>;
}
