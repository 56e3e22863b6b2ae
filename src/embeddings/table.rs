//! In-memory table of entity embeddings.
//!
//! Entities are embedded up front (one request per batch of distinct strings), then
//! the synchronous matching engine reads them through [`crate::semantic::CosineProvider`].

use crate::embeddings::OpenAIEmbedder;
use crate::error::{Result, SseeError};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Text -> embedding map with a fixed dimension.
#[derive(Debug, Default, Clone)]
pub struct EmbeddingTable {
    /// Dimension of every stored vector; None until the first insert
    dimensions: Option<usize>,
    vectors: HashMap<String, Arc<[f32]>>,
}

impl EmbeddingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an embedding. All vectors in one table must have the same length.
    pub fn insert(&mut self, text: String, embedding: Vec<f32>) -> Result<()> {
        if embedding.is_empty() {
            return Err(SseeError::InvalidInput(format!("Empty embedding for: {}", text)));
        }
        match self.dimensions {
            Some(dim) if dim != embedding.len() => {
                return Err(SseeError::DimensionMismatch {
                    expected: dim,
                    got: embedding.len(),
                });
            }
            Some(_) => {}
            None => self.dimensions = Some(embedding.len()),
        }
        self.vectors.insert(text, Arc::from(embedding));
        Ok(())
    }

    pub fn get(&self, text: &str) -> Option<Arc<[f32]>> {
        self.vectors.get(text).cloned()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.vectors.contains_key(text)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    /// Distinct texts not yet in the table, in first-seen order.
    pub fn missing<'a, S: AsRef<str>>(&self, texts: &'a [S]) -> Vec<&'a str> {
        let mut seen = HashSet::new();
        texts
            .iter()
            .map(|t| t.as_ref())
            .filter(|t| !self.contains(t) && seen.insert(*t))
            .collect()
    }

    /// Embed every text not already present. Returns how many were added.
    pub async fn embed_missing<S: AsRef<str>>(
        &mut self,
        embedder: &OpenAIEmbedder,
        texts: &[S],
    ) -> Result<usize> {
        let missing: Vec<String> = self.missing(texts).into_iter().map(String::from).collect();
        if missing.is_empty() {
            return Ok(0);
        }

        log::info!(
            "Embedding {} distinct entities with {}",
            missing.len(),
            embedder.model()
        );
        let embeddings = embedder.embed_batch(&missing).await?;
        let added = missing.len();
        for (text, embedding) in missing.into_iter().zip(embeddings) {
            self.insert(text, embedding)?;
        }
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut table = EmbeddingTable::new();
        table.insert("apple".to_string(), vec![1.0, 2.0]).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.dimensions(), Some(2));
        assert_eq!(&*table.get("apple").unwrap(), &[1.0, 2.0]);
        assert!(table.get("pear").is_none());
    }

    #[test]
    fn test_insert_dimension_mismatch() {
        let mut table = EmbeddingTable::new();
        table.insert("apple".to_string(), vec![1.0, 2.0]).unwrap();
        let err = table.insert("pear".to_string(), vec![1.0]).unwrap_err();
        assert!(matches!(err, SseeError::DimensionMismatch { expected: 2, got: 1 }));
        assert!(!table.contains("pear"));
    }

    #[test]
    fn test_insert_empty_rejected() {
        let mut table = EmbeddingTable::new();
        assert!(table.insert("apple".to_string(), vec![]).is_err());
        assert!(table.is_empty());
        assert_eq!(table.dimensions(), None);
    }

    #[test]
    fn test_missing_dedups_and_keeps_order() {
        let mut table = EmbeddingTable::new();
        table.insert("banana".to_string(), vec![1.0]).unwrap();
        let texts = ["cherry", "banana", "apple", "cherry"];
        assert_eq!(table.missing(&texts), vec!["cherry", "apple"]);
    }

    #[tokio::test]
    async fn test_embed_missing_nothing_to_do() {
        let mut table = EmbeddingTable::new();
        table.insert("apple".to_string(), vec![1.0]).unwrap();
        let embedder =
            OpenAIEmbedder::new("test-key".to_string(), "text-embedding-3-small".to_string(), 10)
                .unwrap();
        let added = table.embed_missing(&embedder, &["apple", "apple"]).await.unwrap();
        assert_eq!(added, 0);
    }
}
