//! Gemini `batchEmbedContents` transport.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;
use crate::error::{EmbeddingError, ProviderFailure};
use crate::provider::{EmbeddingProvider, ProviderResult};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
pub(crate) struct BatchEmbedRequest<'a> {
    pub requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct EmbedContentRequest<'a> {
    pub model: String,
    pub content: Content<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Content<'a> {
    pub parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Part<'a> {
    pub text: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchEmbedResponse {
    #[serde(default)]
    pub embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentEmbedding {
    #[serde(default)]
    pub values: Vec<f64>,
}

pub(crate) fn build_request<'a>(model: &str, texts: &'a [String]) -> BatchEmbedRequest<'a> {
    let model = format!("models/{model}");
    BatchEmbedRequest {
        requests: texts
            .iter()
            .map(|text| EmbedContentRequest {
                model: model.clone(),
                content: Content {
                    parts: vec![Part { text }],
                },
            })
            .collect(),
    }
}

/// Decodes a success body, insisting on one vector per requested text.
pub(crate) fn parse_response(body: &[u8], expected: usize) -> ProviderResult {
    let parsed: BatchEmbedResponse = serde_json::from_slice(body)
        .map_err(|e| ProviderFailure::Permanent(format!("malformed response: {e}")))?;
    if parsed.embeddings.len() != expected {
        return Err(ProviderFailure::Permanent(format!(
            "expected {expected} embeddings, got {}",
            parsed.embeddings.len()
        )));
    }
    Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
}

/// Timeouts, refused connections and truncated bodies are worth a retry.
fn classify_transport_error(err: &reqwest::Error) -> ProviderFailure {
    if err.is_timeout() || err.is_connect() || err.is_body() {
        ProviderFailure::Transient(err.to_string())
    } else {
        ProviderFailure::Permanent(err.to_string())
    }
}

/// HTTP provider for the Gemini embeddings API.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .pool_max_idle_per_host(32)
            .build()?;

        if config.api_key.is_none() {
            tracing::warn!("no Gemini API key configured, provider calls will be rejected");
        }

        Ok(Self {
            http,
            endpoint: format!(
                "{}/v1/models/{}:batchEmbedContents",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn embed_texts(&self, texts: &[String]) -> ProviderResult {
        let payload = build_request(&self.model, texts);
        let mut request = self.http.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("HTTP error {status}: {body}");
            return Err(if status.is_server_error() {
                ProviderFailure::Transient(message)
            } else {
                ProviderFailure::Permanent(message)
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_transport_error(&e))?;
        parse_response(&body, texts.len())
    }
}
