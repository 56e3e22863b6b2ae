use crate::error::Result;
use crate::semantic::{in_unit_range, SimilarityProvider};

/// Lexical provider: 1.0 for identical strings, 0.0 otherwise.
///
/// Rejects out-of-range thresholds by returning `false` rather than an error.
#[derive(Debug, Clone, Default)]
pub struct ExactMatchProvider {
    case_insensitive: bool,
}

impl ExactMatchProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare entities after lowercasing and trimming them.
    pub fn case_insensitive() -> Self {
        Self {
            case_insensitive: true,
        }
    }
}

impl SimilarityProvider for ExactMatchProvider {
    type Encoded = String;

    fn encode(&self, entity: &str) -> Result<String> {
        if self.case_insensitive {
            Ok(entity.trim().to_lowercase())
        } else {
            Ok(entity.to_string())
        }
    }

    fn similarity(&self, a: &String, b: &String) -> Result<f32> {
        Ok(if a == b { 1.0 } else { 0.0 })
    }

    fn validate_threshold(&self, threshold: f32) -> Result<bool> {
        Ok(in_unit_range(threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_identical() {
        let p = ExactMatchProvider::new();
        let a = p.encode("apple").unwrap();
        let b = p.encode("apple").unwrap();
        assert_eq!(p.similarity(&a, &b).unwrap(), 1.0);
    }

    #[test]
    fn test_exact_is_case_sensitive_by_default() {
        let p = ExactMatchProvider::new();
        let a = p.encode("Apple").unwrap();
        let b = p.encode("apple").unwrap();
        assert_eq!(p.similarity(&a, &b).unwrap(), 0.0);
    }

    #[test]
    fn test_case_insensitive() {
        let p = ExactMatchProvider::case_insensitive();
        let a = p.encode(" Apple ").unwrap();
        let b = p.encode("apple").unwrap();
        assert_eq!(p.similarity(&a, &b).unwrap(), 1.0);
    }

    #[test]
    fn test_out_of_range_threshold_is_false_not_error() {
        let p = ExactMatchProvider::new();
        assert!(!p.validate_threshold(100.0).unwrap());
        assert!(p.validate_threshold(0.7).unwrap());
    }
}
