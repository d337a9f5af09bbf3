//! Embedding provider abstraction and implementations.
//!
//! Defines the [`Embedder`] trait and concrete implementations:
//! - **[`DisabledEmbedder`]** — returns errors; used when embeddings are not configured.
//! - **[`OpenAiEmbedder`]** — calls an OpenAI-compatible embeddings API with
//!   batching, retry, and backoff.
//!
//! The model identity (name + dimensionality) is pinned once at construction
//! from [`EmbeddingConfig`] and reused for both ingestion and query embedding.
//! Nearest-neighbor distance is only meaningful within one embedding space,
//! so the provider instance is the single source of truth for the model.
//!
//! # Retry Strategy
//!
//! Transient failures are retried with exponential backoff:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry; timeouts surface as [`Error::ProviderTimeout`]
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use std::time::Duration;

use async_trait::async_trait;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};

/// Trait for embedding providers.
///
/// Maps text to fixed-length vectors. Implementations must embed ingestion
/// documents and queries with the same model so both live in one space.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the pinned model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;

    /// Returns the embedding vector dimensionality (e.g. `1536`).
    fn dims(&self) -> usize;

    /// Embed a batch of texts, returning one vector per input in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query text.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| Error::Provider("empty embedding response".to_string()))
    }
}

/// A no-op embedding provider that always returns errors.
///
/// Used when `embedding.provider = "disabled"` in the configuration.
pub struct DisabledEmbedder;

#[async_trait]
impl Embedder for DisabledEmbedder {
    fn model_name(&self) -> &str {
        "disabled"
    }

    fn dims(&self) -> usize {
        0
    }

    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(Error::Provider(
            "embedding provider is disabled".to_string(),
        ))
    }
}

/// Embedding provider for OpenAI-compatible `POST /embeddings` endpoints.
///
/// Requires the `OPENAI_API_KEY` environment variable unless the endpoint
/// is unauthenticated (e.g. a local server).
pub struct OpenAiEmbedder {
    model: String,
    dims: usize,
    base_url: String,
    api_key: Option<String>,
    max_retries: u32,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiEmbedder {
    /// Create a new provider from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `model` or `dims` is not set in config, or the
    /// HTTP client cannot be built.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| Error::Provider("embedding.model required".to_string()))?;
        let dims = config
            .dims
            .ok_or_else(|| Error::Provider("embedding.dims required".to_string()))?;

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Provider(format!("failed to build http client: {e}")))?;

        Ok(Self {
            model,
            dims,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            max_retries: config.max_retries,
            timeout,
            client,
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let mut req = self.client.post(&url).json(&body);
            if let Some(ref key) = self.api_key {
                req = req.header("Authorization", format!("Bearer {key}"));
            }

            match req.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response
                            .json()
                            .await
                            .map_err(|e| Error::from_reqwest(e, self.timeout))?;
                        let vectors = parse_embeddings_response(&json)?;
                        check_dims(&vectors, self.dims)?;
                        return Ok(vectors);
                    }

                    // Rate limited or server error — retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(Error::Provider(format!(
                            "embeddings API error {status}: {body_text}"
                        )));
                        continue;
                    }

                    // Client error (not 429) — don't retry
                    let body_text = response.text().await.unwrap_or_default();
                    return Err(Error::Provider(format!(
                        "embeddings API error {status}: {body_text}"
                    )));
                }
                Err(e) => {
                    let mapped = Error::from_reqwest(e, self.timeout);
                    if matches!(mapped, Error::ProviderTimeout(_)) {
                        // Timeouts are surfaced, not retried internally.
                        return Err(mapped);
                    }
                    last_err = Some(mapped);
                    continue;
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| Error::Provider("embedding failed after retries".to_string())))
    }
}

/// Parse an OpenAI-style embeddings response, returning vectors in input order.
fn parse_embeddings_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| Error::Provider("invalid embeddings response: missing data".to_string()))?;

    let mut embeddings = Vec::with_capacity(data.len());

    for item in data {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| {
                Error::Provider("invalid embeddings response: missing embedding".to_string())
            })?;

        let vec: Vec<f32> = embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        embeddings.push(vec);
    }

    Ok(embeddings)
}

/// Every vector must carry the pinned dimensionality; anything else would
/// be rejected (or worse, silently mis-ranked) by the store.
fn check_dims(vectors: &[Vec<f32>], dims: usize) -> Result<()> {
    for v in vectors {
        if v.len() != dims {
            return Err(Error::Provider(format!(
                "embedding dimension mismatch: expected {dims}, got {}",
                v.len()
            )));
        }
    }
    Ok(())
}

/// Create the appropriate [`Embedder`] based on configuration.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledEmbedder)),
        "openai" => Ok(Box::new(OpenAiEmbedder::new(config)?)),
        other => Err(Error::Provider(format!(
            "unknown embedding provider: {other}"
        ))),
    }
}
