//! Evaluation case type and dataset loading.

use crate::error::{Result, SseeError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One candidate list scored against one gold list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalCase {
    /// Optional label for reporting (e.g. document name).
    #[serde(default)]
    pub id: Option<String>,
    /// Entities produced by the system under evaluation.
    #[serde(default)]
    pub candidates: Vec<String>,
    /// Reference entities.
    #[serde(default)]
    pub gold: Vec<String>,
}

impl EvalCase {
    pub fn new(candidates: Vec<String>, gold: Vec<String>) -> Self {
        Self {
            id: None,
            candidates,
            gold,
        }
    }

    /// Label used in reports: the id, or the 1-based position in the dataset.
    pub fn label(&self, index: usize) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| format!("case {}", index + 1))
    }
}

/// Load cases from a `.json`, `.yaml` or `.yml` file holding a list of cases.
pub fn load_cases(path: &Path) -> Result<Vec<EvalCase>> {
    let text = std::fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let cases: Vec<EvalCase> = match ext.as_deref() {
        Some("json") => serde_json::from_str(&text)?,
        Some("yaml") | Some("yml") => serde_yaml_ng::from_str(&text)?,
        _ => {
            return Err(SseeError::Parse(format!(
                "Unsupported dataset format: {} (expected .json, .yaml or .yml)",
                path.display()
            )))
        }
    };

    log::info!("Loaded {} evaluation cases from {}", cases.len(), path.display());
    Ok(cases)
}

/// Every distinct entity string across all cases, in first-seen order
/// (gold before candidates within a case).
pub fn collect_texts(cases: &[EvalCase]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut texts = Vec::new();
    for case in cases {
        for text in case.gold.iter().chain(case.candidates.iter()) {
            if seen.insert(text.as_str()) {
                texts.push(text.clone());
            }
        }
    }
    texts
}
