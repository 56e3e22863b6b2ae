//! Similarity providers: the capability the matching engine consumes.
//!
//! A provider knows how to turn an entity into some encoded form, how to score two
//! encoded entities against each other, and which thresholds make sense for its
//! scores. The engine never looks inside an encoding.

pub mod configured;
pub mod cosine;
pub mod exact;

pub use configured::{ConfiguredProvider, Encoding};
pub use cosine::{cosine_similarity, CosineProvider};
pub use exact::ExactMatchProvider;

use crate::error::Result;

/// Encode entities and score pairs of encoded entities.
///
/// `validate_threshold` has two ways to reject a threshold: returning `Ok(false)`
/// (the caller gets an absent result) or returning an error (propagated as-is).
pub trait SimilarityProvider {
    /// Opaque encoded form of an entity.
    type Encoded;

    /// Encode one entity. Must be deterministic for a given provider configuration.
    fn encode(&self, entity: &str) -> Result<Self::Encoded>;

    /// Similarity between two encoded entities; higher is more similar.
    fn similarity(&self, a: &Self::Encoded, b: &Self::Encoded) -> Result<f32>;

    /// Check that `threshold` is meaningful for this provider's scores.
    fn validate_threshold(&self, threshold: f32) -> Result<bool>;
}

impl<P: SimilarityProvider + ?Sized> SimilarityProvider for &P {
    type Encoded = P::Encoded;

    fn encode(&self, entity: &str) -> Result<Self::Encoded> {
        (**self).encode(entity)
    }

    fn similarity(&self, a: &Self::Encoded, b: &Self::Encoded) -> Result<f32> {
        (**self).similarity(a, b)
    }

    fn validate_threshold(&self, threshold: f32) -> Result<bool> {
        (**self).validate_threshold(threshold)
    }
}

/// Whether `threshold` lies in the closed range of cosine-like scores, [-1.0, 1.0].
/// NaN is never in range.
pub fn in_unit_range(threshold: f32) -> bool {
    (-1.0..=1.0).contains(&threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_unit_range_bounds() {
        assert!(in_unit_range(-1.0));
        assert!(in_unit_range(0.0));
        assert!(in_unit_range(1.0));
        assert!(!in_unit_range(1.0001));
        assert!(!in_unit_range(-1.5));
        assert!(!in_unit_range(f32::NAN));
    }

    fn score_pair<P: SimilarityProvider<Encoded = String>>(provider: P, a: &str, b: &str) -> f32 {
        let a = provider.encode(a).unwrap();
        let b = provider.encode(b).unwrap();
        provider.similarity(&a, &b).unwrap()
    }

    #[test]
    fn test_provider_by_reference() {
        let provider = ExactMatchProvider::new();
        assert_eq!(score_pair(&provider, "apple", "apple"), 1.0);
        assert_eq!(score_pair(&provider, "apple", "pear"), 0.0);
        assert!((&provider).validate_threshold(0.5).unwrap());
    }
}
