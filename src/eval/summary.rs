//! Per-case scoring and dataset-level averages.

use crate::error::Result;
use crate::eval::EvalCase;
use crate::matching::{evaluate, Scores};
use crate::semantic::SimilarityProvider;
use serde::Serialize;

/// Scores for one case. `scores` is None when the threshold was rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseResult {
    pub label: String,
    pub candidates: usize,
    pub gold: usize,
    pub scores: Option<Scores>,
}

/// Score every case with the same threshold and provider.
///
/// Provider errors abort the whole run.
pub fn evaluate_cases<P>(
    cases: &[EvalCase],
    threshold: f32,
    provider: &P,
) -> Result<Vec<CaseResult>>
where
    P: SimilarityProvider + ?Sized,
{
    let mut results = Vec::with_capacity(cases.len());
    for (i, case) in cases.iter().enumerate() {
        let label = case.label(i);
        let scores = evaluate(&case.candidates, &case.gold, threshold, provider)?;
        match &scores {
            Some(s) => log::debug!(
                "{}: P={:.4} R={:.4} F1={:.4}",
                label,
                s.precision,
                s.recall,
                s.f1
            ),
            None => log::warn!("{}: threshold {} rejected by provider", label, threshold),
        }
        results.push(CaseResult {
            label,
            candidates: case.candidates.len(),
            gold: case.gold.len(),
            scores,
        });
    }
    Ok(results)
}

/// Averages over the cases where each metric is defined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalSummary {
    pub cases: usize,
    /// Cases with no scores at all (threshold rejected)
    pub rejected: usize,
    pub mean_precision: f64,
    pub mean_recall: f64,
    pub mean_f1: f64,
    /// Cases contributing to each mean
    pub precision_cases: usize,
    pub recall_cases: usize,
    pub f1_cases: usize,
}

impl EvalSummary {
    pub fn from_results(results: &[CaseResult]) -> Self {
        let scored: Vec<&Scores> = results.iter().filter_map(|r| r.scores.as_ref()).collect();
        let (mean_precision, precision_cases) = mean_defined(scored.iter().map(|s| s.precision));
        let (mean_recall, recall_cases) = mean_defined(scored.iter().map(|s| s.recall));
        let (mean_f1, f1_cases) = mean_defined(scored.iter().map(|s| s.f1));

        Self {
            cases: results.len(),
            rejected: results.len() - scored.len(),
            mean_precision,
            mean_recall,
            mean_f1,
            precision_cases,
            recall_cases,
            f1_cases,
        }
    }

    /// True when mean F1 is defined and at least `min_f1`.
    pub fn meets(&self, min_f1: f64) -> bool {
        !self.mean_f1.is_nan() && self.mean_f1 >= min_f1
    }
}

/// Mean of the non-NaN values and how many there were; NaN when there are none.
fn mean_defined(values: impl Iterator<Item = f64>) -> (f64, usize) {
    let (sum, count) = values
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if count == 0 {
        (f64::NAN, 0)
    } else {
        (sum / count as f64, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::ExactMatchProvider;

    const EPS: f64 = 1e-9;

    fn case(candidates: &[&str], gold: &[&str]) -> EvalCase {
        EvalCase::new(
            candidates.iter().map(|s| s.to_string()).collect(),
            gold.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_evaluate_cases() {
        let cases = vec![
            case(&["apple", "banana", "grape"], &["apple", "banana", "cherry"]),
            case(&[], &["apple"]),
        ];
        let results = evaluate_cases(&cases, 0.7, &ExactMatchProvider::new()).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].label, "case 1");
        assert_eq!(results[0].candidates, 3);

        let first = results[0].scores.unwrap();
        assert!((first.precision - 2.0 / 3.0).abs() < EPS);
        assert!((first.recall - 2.0 / 3.0).abs() < EPS);

        let second = results[1].scores.unwrap();
        assert!(second.precision.is_nan());
        assert_eq!(second.recall, 0.0);
    }

    #[test]
    fn test_summary_skips_undefined() {
        let cases = vec![
            case(&["apple", "banana"], &["apple", "banana"]),
            case(&["apple", "kiwi"], &["apple"]),
            case(&[], &["apple"]),
        ];
        let results = evaluate_cases(&cases, 0.7, &ExactMatchProvider::new()).unwrap();
        let summary = EvalSummary::from_results(&results);

        assert_eq!(summary.cases, 3);
        assert_eq!(summary.rejected, 0);
        assert_eq!(summary.precision_cases, 2);
        assert_eq!(summary.recall_cases, 3);
        assert_eq!(summary.f1_cases, 2);
        assert!((summary.mean_precision - 0.75).abs() < EPS);
        assert!((summary.mean_recall - 2.0 / 3.0).abs() < EPS);
        // F1: 1.0 and 2/3
        assert!((summary.mean_f1 - 5.0 / 6.0).abs() < EPS);
        assert!(summary.meets(0.8));
        assert!(!summary.meets(0.9));
    }

    #[test]
    fn test_summary_rejected_threshold() {
        let cases = vec![case(&["apple"], &["apple"])];
        let results = evaluate_cases(&cases, 2.0, &ExactMatchProvider::new()).unwrap();
        assert!(results[0].scores.is_none());

        let summary = EvalSummary::from_results(&results);
        assert_eq!(summary.rejected, 1);
        assert!(summary.mean_f1.is_nan());
        assert!(!summary.meets(0.0));
    }

    #[test]
    fn test_summary_empty() {
        let summary = EvalSummary::from_results(&[]);
        assert_eq!(summary.cases, 0);
        assert!(summary.mean_precision.is_nan());
    }
}
