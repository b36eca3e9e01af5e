use crate::chunk::{split_into_chunks, token_estimate, truncate_preview};
use crate::error::{ContentStoreError, Result};
use crate::manifest::Manifest;
use router_protocol::{ContentKind, ContentRef, DEFAULT_MAX_RESULT_TOKENS};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Outcome of [`ContentStore::put_text`]: content under the threshold is
/// returned inline with no ref created at all; content over the threshold
/// is chunked to disk and a ref plus preview returned.
#[derive(Debug, Clone)]
pub enum PutTextOutcome {
    Inline(String),
    Chunked {
        content_ref: ContentRef,
        preview: String,
    },
}

/// One retrieved chunk: text chunks round-trip as `String`, binary blobs as
/// raw bytes.
#[derive(Debug, Clone)]
pub enum RetrievedChunk {
    Text(String),
    Binary(Vec<u8>),
}

/// Durable blob store keyed by content-hash ref. Chunks oversized text,
/// stores binary payloads verbatim, one file per chunk under
/// `<root>/<ref_id>/chunk_<n>.{txt,bin}` plus a `manifest.json` sidecar.
pub struct ContentStore {
    root: PathBuf,
    max_result_tokens: usize,
}

impl ContentStore {
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        Self::with_max_result_tokens(root, DEFAULT_MAX_RESULT_TOKENS).await
    }

    pub async fn with_max_result_tokens(
        root: impl Into<PathBuf>,
        max_result_tokens: usize,
    ) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        tokio::fs::create_dir_all(root.join(".tmp")).await?;
        Ok(Self {
            root,
            max_result_tokens,
        })
    }

    pub async fn put_text(
        &self,
        content: &str,
        call_id: Option<&str>,
    ) -> Result<PutTextOutcome> {
        if token_estimate(content) <= self.max_result_tokens {
            return Ok(PutTextOutcome::Inline(content.to_string()));
        }

        let chunks = split_into_chunks(content, self.max_result_tokens);
        let ref_id = content_hash(content.as_bytes());
        let preview = truncate_preview(&chunks[0]);

        let manifest = Manifest {
            ref_id: ref_id.clone(),
            kind: ContentKind::TextChunked,
            total_chunks: chunks.len(),
            mime: "text/plain".to_string(),
            size_bytes: content.len() as u64,
            vision_description: None,
            created_at_unix_ms: now_unix_ms(),
            call_id: call_id.map(str::to_string),
        };

        self.write_ref(&ref_id, &manifest, |dir| {
            let chunks = chunks.clone();
            Box::pin(async move {
                for (i, chunk) in chunks.iter().enumerate() {
                    tokio::fs::write(dir.join(format!("chunk_{i}.txt")), chunk).await?;
                }
                Ok(())
            })
        })
        .await?;

        log::info!(
            "content-store: chunked text into {} chunks under ref {ref_id}",
            manifest.total_chunks
        );

        Ok(PutTextOutcome::Chunked {
            content_ref: manifest.into_content_ref(),
            preview,
        })
    }

    pub async fn put_binary(
        &self,
        bytes: &[u8],
        mime: &str,
        kind: ContentKind,
        call_id: Option<&str>,
    ) -> Result<ContentRef> {
        let ref_id = content_hash(bytes);
        let manifest = Manifest {
            ref_id: ref_id.clone(),
            kind,
            total_chunks: 1,
            mime: mime.to_string(),
            size_bytes: bytes.len() as u64,
            vision_description: None,
            created_at_unix_ms: now_unix_ms(),
            call_id: call_id.map(str::to_string),
        };

        let payload = bytes.to_vec();
        self.write_ref(&ref_id, &manifest, |dir| {
            Box::pin(async move {
                tokio::fs::write(dir.join("chunk_0.bin"), payload).await?;
                Ok(())
            })
        })
        .await?;

        log::info!("content-store: stored {:?} blob under ref {ref_id}", kind);
        Ok(manifest.into_content_ref())
    }

    /// Attach a vision description to an already-published image ref.
    /// `ContentRef`s are otherwise immutable; this is the one sanctioned
    /// mutation, performed once right after the initial publish and before
    /// any reader can have observed the ref.
    pub async fn set_vision_description(&self, ref_id: &str, description: &str) -> Result<()> {
        let manifest_path = self.manifest_path(ref_id);
        let mut manifest = self.read_manifest(ref_id).await?;
        manifest.vision_description = Some(description.to_string());
        let data = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| ContentStoreError::ManifestCorrupt {
                ref_id: ref_id.to_string(),
                reason: e.to_string(),
            })?;
        tokio::fs::write(&manifest_path, data).await?;
        Ok(())
    }

    pub async fn get(&self, ref_id: &str, chunk_index: usize) -> Result<(RetrievedChunk, ContentRef)> {
        let manifest = self.read_manifest(ref_id).await?;
        if chunk_index >= manifest.total_chunks {
            return Err(ContentStoreError::OutOfRange {
                ref_id: ref_id.to_string(),
                chunk_index,
                total_chunks: manifest.total_chunks,
            });
        }

        let dir = self.ref_dir(ref_id);
        let chunk = match manifest.kind {
            ContentKind::TextChunked => {
                let path = dir.join(format!("chunk_{chunk_index}.txt"));
                RetrievedChunk::Text(tokio::fs::read_to_string(&path).await?)
            }
            ContentKind::Image | ContentKind::Audio | ContentKind::Binary => {
                let path = dir.join(format!("chunk_{chunk_index}.bin"));
                RetrievedChunk::Binary(tokio::fs::read(&path).await?)
            }
        };

        Ok((chunk, manifest.into_content_ref()))
    }

    fn ref_dir(&self, ref_id: &str) -> PathBuf {
        self.root.join(ref_id)
    }

    fn manifest_path(&self, ref_id: &str) -> PathBuf {
        self.ref_dir(ref_id).join("manifest.json")
    }

    async fn read_manifest(&self, ref_id: &str) -> Result<Manifest> {
        let path = self.manifest_path(ref_id);
        let data = tokio::fs::read(&path)
            .await
            .map_err(|_| ContentStoreError::NotFound(ref_id.to_string()))?;
        serde_json::from_slice(&data).map_err(|e| ContentStoreError::ManifestCorrupt {
            ref_id: ref_id.to_string(),
            reason: e.to_string(),
        })
    }

    /// Write chunk files plus manifest into a temp directory, then rename
    /// into place. Idempotent: if `ref_id` already exists (same content
    /// hash), the write is skipped and the temp dir removed.
    async fn write_ref<'a, F>(&'a self, ref_id: &'a str, manifest: &'a Manifest, write_chunks: F) -> Result<()>
    where
        F: FnOnce(
            PathBuf,
        ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>>,
    {
        let final_dir = self.ref_dir(ref_id);
        if tokio::fs::metadata(&final_dir).await.is_ok() {
            return Ok(());
        }

        let tmp_dir = self.root.join(".tmp").join(format!("{ref_id}-{}", now_unix_ms()));
        tokio::fs::create_dir_all(&tmp_dir).await?;

        let result = async {
            write_chunks(tmp_dir.clone()).await?;
            let data = serde_json::to_vec_pretty(manifest).map_err(|e| {
                ContentStoreError::ManifestCorrupt {
                    ref_id: ref_id.to_string(),
                    reason: e.to_string(),
                }
            })?;
            tokio::fs::write(tmp_dir.join("manifest.json"), data).await?;
            Ok::<(), ContentStoreError>(())
        }
        .await;

        match result {
            Ok(()) => {
                if let Err(err) = tokio::fs::rename(&tmp_dir, &final_dir).await {
                    let _ = tokio::fs::remove_dir_all(&tmp_dir).await;
                    // Another writer may have published the same content hash
                    // concurrently; treat that as success rather than a failure.
                    if tokio::fs::metadata(&final_dir).await.is_err() {
                        return Err(err.into());
                    }
                }
                Ok(())
            }
            Err(err) => {
                let _ = tokio::fs::remove_dir_all(&tmp_dir).await;
                Err(err)
            }
        }
    }
}

fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn now_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
