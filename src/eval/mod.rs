//! Batch evaluation: candidate/gold datasets, per-case scores and summaries.

pub mod case;
pub mod summary;

pub use case::{collect_texts, load_cases, EvalCase};
pub use summary::{evaluate_cases, CaseResult, EvalSummary};
