use crate::cache::{CacheStats, EmbeddingCache};
use crate::config::EmbeddingsConfig;
use crate::error::{Result, SseeError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI allows at most this many inputs per embeddings request.
const MAX_BATCH_SIZE: usize = 2048;

/// Request structure for OpenAI embeddings API
#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// Response structure from OpenAI embeddings API
#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

/// Individual embedding data in API response
#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// OpenAI embeddings client
///
/// Embeds entity texts in batches with retry on rate limiting and server errors.
/// An optional LRU cache skips texts that were already embedded in this process.
pub struct OpenAIEmbedder {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    batch_size: usize,
    max_retries: usize,
    cache: Option<Arc<EmbeddingCache>>,
}

impl OpenAIEmbedder {
    /// Create a new OpenAI embedder
    ///
    /// # Arguments
    ///
    /// * `api_key` - OpenAI API key
    /// * `model` - Model name (e.g., "text-embedding-3-small")
    /// * `batch_size` - Maximum number of texts to send per API request (max 2048)
    pub fn new(api_key: String, model: String, batch_size: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SseeError::Embedding(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            batch_size: batch_size.clamp(1, MAX_BATCH_SIZE),
            max_retries: 3,
            cache: None,
        })
    }

    /// Build an embedder from the `[embeddings]` config section, reading the API key
    /// from the configured environment variable.
    pub fn from_config(config: &EmbeddingsConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            SseeError::Config(format!(
                "Environment variable {} not set. Set it in your .env file or as an environment variable.",
                config.api_key_env
            ))
        })?;

        let cache = if config.cache_capacity > 0 {
            Some(Arc::new(EmbeddingCache::new(config.cache_capacity)))
        } else {
            None
        };

        let mut embedder = Self::new(api_key, config.model.clone(), config.batch_size)?
            .with_max_retries(config.max_retries)
            .with_cache(cache);
        if let Some(url) = &config.base_url {
            embedder = embedder.with_base_url(url);
        }
        Ok(embedder)
    }

    /// Use an LRU cache for embedded texts.
    pub fn with_cache(mut self, cache: Option<Arc<EmbeddingCache>>) -> Self {
        self.cache = cache;
        self
    }

    /// Point the client at an OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|c| c.stats())
    }

    /// Embed a batch of texts, automatically splitting into smaller batches if needed
    ///
    /// Texts found in the cache are not sent. Returns one embedding per input text,
    /// in the same order.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut slots: Vec<Option<Vec<f32>>> = texts
            .iter()
            .map(|t| self.cache.as_ref().and_then(|c| c.get(t)))
            .collect();

        let misses: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_none())
            .map(|(i, _)| i)
            .collect();
        log::debug!(
            "Embedding {} texts ({} cached)",
            texts.len(),
            texts.len() - misses.len()
        );

        for chunk in misses.chunks(self.batch_size) {
            let inputs: Vec<String> = chunk.iter().map(|&i| texts[i].clone()).collect();
            let embeddings = self.embed_with_retry(&inputs).await?;

            for (&i, embedding) in chunk.iter().zip(embeddings) {
                if let Some(cache) = &self.cache {
                    cache.put(texts[i].clone(), embedding.clone());
                }
                slots[i] = Some(embedding);
            }

            // Rate limiting: small delay between full batches
            if chunk.len() == self.batch_size {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }

        slots
            .into_iter()
            .zip(texts)
            .map(|(slot, text)| {
                slot.ok_or_else(|| SseeError::Embedding(format!("No embedding returned for: {}", text)))
            })
            .collect()
    }

    /// Embed a single text.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| SseeError::Embedding("Empty response from OpenAI API".to_string()))
    }

    /// One request with retry and exponential backoff on 429 and 5xx responses.
    async fn embed_with_retry(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = std::time::Instant::now();
        let mut attempt = 0;
        let mut delay = Duration::from_secs(1);

        loop {
            match self.embed_batch_internal(texts).await {
                Ok(embeddings) => {
                    log::debug!(
                        "Embedding API call took {:?} (attempt {})",
                        start.elapsed(),
                        attempt + 1
                    );
                    return Ok(embeddings);
                }
                Err(e) if attempt < self.max_retries && is_retryable(&e) => {
                    log::warn!("Retry {}/{} after error: {}", attempt + 1, self.max_retries, e);
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Internal method to make a single API request
    async fn embed_batch_internal(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| SseeError::Embedding(format!("Network error: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            return Err(SseeError::Embedding(format!(
                "OpenAI API error {}: {}",
                status.as_u16(),
                body
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| SseeError::Embedding(format!("Failed to parse response: {}", e)))?;

        order_embeddings(result.data, texts.len())
    }
}

/// Put embeddings back into request order and check that every input got one.
fn order_embeddings(mut data: Vec<EmbeddingData>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(SseeError::Embedding(format!(
            "Expected {} embeddings, API returned {}",
            expected,
            data.len()
        )));
    }
    data.sort_by_key(|d| d.index);
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

/// 429 rate limit or 5xx server error
fn is_retryable(err: &SseeError) -> bool {
    match err {
        SseeError::Embedding(msg) => ["429", "500", "502", "503", "504"]
            .iter()
            .any(|code| msg.starts_with(&format!("OpenAI API error {}", code))),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedder(batch_size: usize) -> OpenAIEmbedder {
        OpenAIEmbedder::new(
            "test-key".to_string(),
            "text-embedding-3-small".to_string(),
            batch_size,
        )
        .unwrap()
    }

    #[test]
    fn test_embedder_new() {
        let e = embedder(100);
        assert_eq!(e.model(), "text-embedding-3-small");
        assert_eq!(e.batch_size, 100);
        assert_eq!(e.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_embedder_batch_size_limit() {
        assert_eq!(embedder(5000).batch_size, 2048);
        assert_eq!(embedder(2048).batch_size, 2048);
        assert_eq!(embedder(0).batch_size, 1);
    }

    #[test]
    fn test_with_base_url_strips_trailing_slash() {
        let e = embedder(10).with_base_url("http://localhost:8000/v1/");
        assert_eq!(e.base_url, "http://localhost:8000/v1");
    }

    #[test]
    fn test_is_retryable() {
        assert!(is_retryable(&SseeError::Embedding(
            "OpenAI API error 429: slow down".to_string()
        )));
        assert!(is_retryable(&SseeError::Embedding(
            "OpenAI API error 503: unavailable".to_string()
        )));
        assert!(!is_retryable(&SseeError::Embedding(
            "OpenAI API error 401: bad key".to_string()
        )));
        assert!(!is_retryable(&SseeError::Embedding("Network error: reset".to_string())));
        assert!(!is_retryable(&SseeError::InvalidInput("429".to_string())));
    }

    #[test]
    fn test_order_embeddings_by_index() {
        let data = vec![
            EmbeddingData { index: 1, embedding: vec![2.0] },
            EmbeddingData { index: 0, embedding: vec![1.0] },
        ];
        let ordered = order_embeddings(data, 2).unwrap();
        assert_eq!(ordered, vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn test_order_embeddings_count_mismatch() {
        let data = vec![EmbeddingData { index: 0, embedding: vec![1.0] }];
        assert!(order_embeddings(data, 2).is_err());
    }

    #[tokio::test]
    async fn test_embed_batch_empty() {
        let out = embedder(10).embed_batch(&[]).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_embed_batch_served_from_cache() {
        let cache = Arc::new(EmbeddingCache::new(10));
        cache.put("apple".to_string(), vec![1.0, 0.0]);
        cache.put("pear".to_string(), vec![0.0, 1.0]);
        let e = embedder(10).with_cache(Some(cache));

        // Every text is cached, so no request is made.
        let texts = vec!["pear".to_string(), "apple".to_string()];
        let out = e.embed_batch(&texts).await.unwrap();
        assert_eq!(out, vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
    }
}
