use crate::embeddings::EmbeddingTable;
use crate::error::{Result, SseeError};
use crate::semantic::{in_unit_range, SimilarityProvider};
use std::sync::Arc;

/// Cosine similarity over embeddings computed ahead of time.
///
/// Encoding is a lookup in an [`EmbeddingTable`]; an entity that was never
/// embedded is an error. Thresholds outside [-1.0, 1.0] raise
/// [`SseeError::InvalidThreshold`].
#[derive(Clone)]
pub struct CosineProvider {
    table: Arc<EmbeddingTable>,
}

impl CosineProvider {
    pub fn new(table: Arc<EmbeddingTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &EmbeddingTable {
        &self.table
    }
}

impl SimilarityProvider for CosineProvider {
    type Encoded = Arc<[f32]>;

    fn encode(&self, entity: &str) -> Result<Arc<[f32]>> {
        self.table
            .get(entity)
            .ok_or_else(|| SseeError::MissingEmbedding(entity.to_string()))
    }

    fn similarity(&self, a: &Arc<[f32]>, b: &Arc<[f32]>) -> Result<f32> {
        cosine_similarity(a, b)
    }

    fn validate_threshold(&self, threshold: f32) -> Result<bool> {
        if in_unit_range(threshold) {
            Ok(true)
        } else {
            Err(SseeError::InvalidThreshold(threshold))
        }
    }
}

/// Compute cosine similarity between two vectors
///
/// # Returns
///
/// Cosine similarity score (-1.0 to 1.0), or 0.0 if either vector has zero magnitude
///
/// # Errors
///
/// `DimensionMismatch` if the vectors have different lengths
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(SseeError::DimensionMismatch {
            expected: a.len(),
            got: b.len(),
        });
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();

    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (mag_a * mag_b))
}
