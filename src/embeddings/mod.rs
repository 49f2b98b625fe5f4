//! Embedding generation behind a trait seam.
//!
//! `GeminiEmbedder` talks to the Google Generative Language API
//! (`text-embedding-004`, 768 dimensions); `MockEmbedder` produces
//! deterministic vectors for mock mode and tests.

use crate::config::EmbeddingsConfig;
use crate::errors::{redact_api_key, AppError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Input cap applied before calling the model, preventing oversized-request
/// failures on very long posts.
pub const MAX_EMBED_CHARS: usize = 100_000;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text into a fixed-dimension vector. Failures are not
    /// retried here; retry policy belongs to the caller.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError>;

    fn dimension(&self) -> usize;
}

/// Truncate on a char boundary without scanning past the cut point
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub struct GeminiEmbedder {
    client: reqwest::Client,
    config: EmbeddingsConfig,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: String,
    content: ContentPayload<'a>,
}

#[derive(Serialize)]
struct ContentPayload<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

impl GeminiEmbedder {
    pub fn new(config: EmbeddingsConfig) -> Result<Self, AppError> {
        if config.api_key.is_empty() {
            return Err(AppError::Configuration(
                "embeddings.api_key is not set".into(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let input = truncate_chars(text, MAX_EMBED_CHARS);

        let url = format!(
            "{}/models/{}:embedContent?key={}",
            self.config.api_url, self.config.model, self.config.api_key
        );
        let request = EmbedRequest {
            model: format!("models/{}", self.config.model),
            content: ContentPayload {
                parts: vec![TextPart { text: input }],
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                // reqwest errors carry the full URL, credential included
                AppError::EmbeddingServiceError(redact_api_key(&format!("request failed: {e}")))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::EmbeddingServiceError(redact_api_key(&format!(
                "API error {status}: {body}"
            ))));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| AppError::EmbeddingServiceError(format!("parse error: {e}")))?;

        let values = parsed.embedding.values;
        if values.len() != self.config.dimension {
            // Dimension mismatch means the index and model configs disagree;
            // nothing at runtime can repair that.
            return Err(AppError::Configuration(format!(
                "embedding dimension {} does not match configured {}",
                values.len(),
                self.config.dimension
            )));
        }
        Ok(values)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}

/// Deterministic mock: equal text embeds to equal vectors, so similarity
/// queries behave sensibly without a real model.
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        use rand::{Rng, SeedableRng};
        use std::hash::{Hash, Hasher};

        let input = truncate_chars(text, MAX_EMBED_CHARS);
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        input.hash(&mut hasher);
        let mut rng = rand::rngs::StdRng::seed_from_u64(hasher.finish());

        Ok((0..self.dimension)
            .map(|_| rng.gen_range(-1.0f32..1.0))
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 5), "");
    }

    #[tokio::test]
    async fn test_mock_embedder_deterministic() {
        let embedder = MockEmbedder::new(768);
        let a = embedder.embed("same text").await.unwrap();
        let b = embedder.embed("same text").await.unwrap();
        let c = embedder.embed("different text").await.unwrap();
        assert_eq!(a.len(), 768);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
