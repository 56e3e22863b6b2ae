//! Provider selected at runtime from `[embeddings] provider`.

use crate::config::{Config, ProviderKind};
use crate::embeddings::{EmbeddingTable, OpenAIEmbedder};
use crate::error::{Result, SseeError};
use crate::semantic::{CosineProvider, ExactMatchProvider, SimilarityProvider};
use std::sync::Arc;

/// Encoded entity of either backend.
#[derive(Debug, Clone)]
pub enum Encoding {
    Text(String),
    Vector(Arc<[f32]>),
}

/// Either the exact-match or the embedding-backed provider.
pub enum ConfiguredProvider {
    Exact(ExactMatchProvider),
    Cosine(CosineProvider),
}

impl ConfiguredProvider {
    /// Build the configured provider. For embeddings, every text in `texts` is
    /// embedded up front so the matching engine never waits on the network.
    pub async fn from_config(config: &Config, texts: &[String]) -> Result<Self> {
        match config.embeddings.provider {
            ProviderKind::Exact => {
                let provider = if config.eval.case_insensitive {
                    ExactMatchProvider::case_insensitive()
                } else {
                    ExactMatchProvider::new()
                };
                Ok(Self::Exact(provider))
            }
            ProviderKind::OpenAI => {
                let embedder = OpenAIEmbedder::from_config(&config.embeddings)?;
                let mut table = EmbeddingTable::new();
                table.embed_missing(&embedder, texts).await?;

                if let Some(dim) = table.dimensions() {
                    if dim != config.embeddings.dimensions {
                        return Err(SseeError::DimensionMismatch {
                            expected: config.embeddings.dimensions,
                            got: dim,
                        });
                    }
                }
                if let Some(stats) = embedder.cache_stats() {
                    log::debug!("Embedding cache: {} hits, {} misses", stats.hits, stats.misses);
                }
                Ok(Self::Cosine(CosineProvider::new(Arc::new(table))))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Exact(_) => "exact",
            Self::Cosine(_) => "openai",
        }
    }
}

impl SimilarityProvider for ConfiguredProvider {
    type Encoded = Encoding;

    fn encode(&self, entity: &str) -> Result<Encoding> {
        match self {
            Self::Exact(p) => p.encode(entity).map(Encoding::Text),
            Self::Cosine(p) => p.encode(entity).map(Encoding::Vector),
        }
    }

    fn similarity(&self, a: &Encoding, b: &Encoding) -> Result<f32> {
        match (self, a, b) {
            (Self::Exact(p), Encoding::Text(a), Encoding::Text(b)) => p.similarity(a, b),
            (Self::Cosine(p), Encoding::Vector(a), Encoding::Vector(b)) => p.similarity(a, b),
            _ => Err(SseeError::InvalidInput(format!(
                "encoding does not belong to the {} provider",
                self.name()
            ))),
        }
    }

    fn validate_threshold(&self, threshold: f32) -> Result<bool> {
        match self {
            Self::Exact(p) => p.validate_threshold(threshold),
            Self::Cosine(p) => p.validate_threshold(threshold),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::precision;

    #[tokio::test]
    async fn test_default_config_is_exact() {
        let config = Config::default();
        let provider = ConfiguredProvider::from_config(&config, &[]).await.unwrap();
        assert_eq!(provider.name(), "exact");

        let p = precision(&["apple", "grape"], &["apple", "cherry"], 0.7, &provider)
            .unwrap()
            .unwrap();
        assert!((p - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_case_insensitive_from_config() {
        let mut config = Config::default();
        config.eval.case_insensitive = true;
        let provider = ConfiguredProvider::from_config(&config, &[]).await.unwrap();
        let p = precision(&["APPLE "], &["apple"], 1.0, &provider).unwrap();
        assert_eq!(p, Some(1.0));
    }

    #[test]
    fn test_mixed_encodings_rejected() {
        let provider = ConfiguredProvider::Exact(ExactMatchProvider::new());
        let a = Encoding::Text("apple".to_string());
        let b = Encoding::Vector(Arc::from(vec![1.0f32]));
        assert!(matches!(
            provider.similarity(&a, &b),
            Err(SseeError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_cosine_variant_keeps_raising_threshold() {
        let mut table = EmbeddingTable::new();
        table.insert("apple".to_string(), vec![1.0, 0.0]).unwrap();
        let provider = ConfiguredProvider::Cosine(CosineProvider::new(Arc::new(table)));
        assert!(provider.validate_threshold(5.0).is_err());
        assert!(provider.validate_threshold(0.5).unwrap());
    }
}
