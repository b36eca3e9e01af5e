use crate::error::{ProviderError, Result};
use crate::port::{Describer, Embedder, Vision};
use async_trait::async_trait;
use base64::Engine;
use serde_json::json;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DESCRIBER_MAX_OUTPUT_CHARS: usize = 2_000;

/// Shared HTTP plumbing for the OpenAI-backed providers. Each port
/// implementation below is a thin, model-specific wrapper around this.
struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ProviderError::MissingCredential("OPENAI_API_KEY".to_string()))?;
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let http = reqwest::Client::builder()
            .build()
            .map_err(ProviderError::Request)?;
        Ok(Self {
            http,
            api_key,
            base_url,
        })
    }

    async fn post_json(&self, path: &str, body: serde_json::Value) -> Result<serde_json::Value> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let payload: serde_json::Value = response.json().await?;
        if !status.is_success() {
            let message = payload
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .unwrap_or("unknown upstream error");
            return Err(ProviderError::UpstreamError(format!(
                "{status}: {message}"
            )));
        }
        Ok(payload)
    }
}

/// `Embedder` backed by OpenAI's `/embeddings` endpoint.
pub struct OpenAiEmbedder {
    client: OpenAiClient,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    pub fn from_env(dimensions: usize) -> Result<Self> {
        let model = std::env::var("EMBEDDING_MODEL_NAME")
            .unwrap_or_else(|_| "text-embedding-3-small".to_string());
        Ok(Self {
            client: OpenAiClient::from_env()?,
            model,
            dimensions,
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = json!({
            "model": self.model,
            "input": text,
            "dimensions": self.dimensions,
        });
        let payload = self.client.post_json("/embeddings", body).await?;
        let vector = payload["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| {
                ProviderError::MalformedResponse("missing data[0].embedding array".to_string())
            })?
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// `Describer` backed by OpenAI's chat completions endpoint.
pub struct OpenAiDescriber {
    client: OpenAiClient,
    model: String,
}

impl OpenAiDescriber {
    pub fn from_env() -> Result<Self> {
        let model =
            std::env::var("DESCRIPTOR_MODEL_NAME").unwrap_or_else(|_| "gpt-4.1-mini".to_string());
        Ok(Self {
            client: OpenAiClient::from_env()?,
            model,
        })
    }
}

#[async_trait]
impl Describer for OpenAiDescriber {
    async fn describe(&self, document: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "Rewrite the following tool description into a single, precise \
                                 paragraph that helps a semantic search engine match user intent \
                                 to this tool. Do not invent capabilities not present in the input."
                },
                { "role": "user", "content": document }
            ],
            "max_tokens": DESCRIBER_MAX_OUTPUT_CHARS / 4,
        });
        let payload = self.client.post_json("/chat/completions", body).await?;
        extract_chat_text(&payload)
    }
}

/// `Vision` backed by OpenAI's multimodal chat completions endpoint.
pub struct OpenAiVision {
    client: OpenAiClient,
    model: String,
}

impl OpenAiVision {
    pub fn from_env() -> Result<Self> {
        let model = std::env::var("VISION_MODEL_NAME").unwrap_or_else(|_| "gpt-4.1-mini".to_string());
        Ok(Self {
            client: OpenAiClient::from_env()?,
            model,
        })
    }
}

#[async_trait]
impl Vision for OpenAiVision {
    async fn describe_image(&self, bytes: &[u8], mime: &str) -> Result<String> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        let data_url = format!("data:{mime};base64,{encoded}");
        let body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": "Describe this image in one short sentence." },
                        { "type": "image_url", "image_url": { "url": data_url } }
                    ]
                }
            ],
            "max_tokens": 100,
        });
        let payload = self.client.post_json("/chat/completions", body).await?;
        extract_chat_text(&payload)
    }
}

fn extract_chat_text(payload: &serde_json::Value) -> Result<String> {
    payload["choices"][0]["message"]["content"]
        .as_str()
        .map(str::trim)
        .map(ToString::to_string)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            ProviderError::MalformedResponse(
                "missing choices[0].message.content".to_string(),
            )
        })
}
