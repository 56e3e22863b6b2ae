//! Greedy one-to-one matching between a query list and a pool list.
//!
//! Precision treats candidates as the query list and gold as the pool; recall
//! swaps the roles. Both run the same algorithm:
//!
//! 1. keep, for every query entity, the pool entities scoring at or above the
//!    threshold, then rank them by descending similarity;
//! 2. visit query entities by descending best similarity (ties keep input order);
//! 3. give each visited query entity the first pool entity on its ranked list that
//!    no earlier query entity has taken.
//!
//! Entities are identified by their position in the input list, so duplicate
//! strings are distinct entities. The result is not a globally optimal matching.

use crate::error::Result;
use crate::semantic::SimilarityProvider;
use serde::Serialize;
use std::cmp::Ordering;

/// One resolved query -> pool pairing, by list position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Assignment {
    pub query: usize,
    pub pool: usize,
    pub similarity: f32,
}

/// Outcome of one matching pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchReport {
    pub query_len: usize,
    pub pool_len: usize,
    /// Assignments in the order they were made
    pub assignments: Vec<Assignment>,
}

impl MatchReport {
    fn undefined(pool_len: usize) -> Self {
        Self {
            query_len: 0,
            pool_len,
            assignments: Vec::new(),
        }
    }

    /// Number of query entities that found a pool entity.
    pub fn matched(&self) -> usize {
        self.assignments.len()
    }

    /// Matched query entities over all query entities; NaN when there are none.
    pub fn ratio(&self) -> f64 {
        if self.query_len == 0 {
            return f64::NAN;
        }
        self.matched() as f64 / self.query_len as f64
    }

    /// Pool position assigned to the query entity at `query`, if any.
    pub fn pool_for(&self, query: usize) -> Option<usize> {
        self.assignments
            .iter()
            .find(|a| a.query == query)
            .map(|a| a.pool)
    }
}

/// Precision, recall and their harmonic mean for one candidate/gold pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl Scores {
    pub fn new(precision: f64, recall: f64) -> Self {
        Self {
            precision,
            recall,
            f1: f1_score(precision, recall),
        }
    }
}

/// Harmonic mean of precision and recall. NaN propagates; 0.0 when both are 0.0.
pub fn f1_score(precision: f64, recall: f64) -> f64 {
    if precision.is_nan() || recall.is_nan() {
        return f64::NAN;
    }
    if precision + recall == 0.0 {
        return 0.0;
    }
    2.0 * precision * recall / (precision + recall)
}

/// Pool entity above threshold for some query entity.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    pool: usize,
    similarity: f32,
}

/// Fraction of candidate entities matched to a distinct gold entity.
///
/// Returns `Ok(Some(NaN))` for no candidates, `Ok(None)` when the provider
/// rejects the threshold with `false`, and propagates any provider error.
pub fn precision<S, P>(
    candidates: &[S],
    gold: &[S],
    threshold: f32,
    provider: &P,
) -> Result<Option<f64>>
where
    S: AsRef<str>,
    P: SimilarityProvider + ?Sized,
{
    if candidates.is_empty() {
        return Ok(Some(f64::NAN));
    }
    if !provider.validate_threshold(threshold)? {
        return Ok(None);
    }

    let gold_enc = encode_all(gold, provider)?;
    let cand_enc = encode_all(candidates, provider)?;
    let report = assign(&cand_enc, &gold_enc, threshold, provider)?;
    Ok(Some(report.ratio()))
}

/// Fraction of gold entities matched to a distinct candidate entity.
///
/// Returns `Ok(Some(NaN))` for no gold entities, `Ok(None)` when the provider
/// rejects the threshold with `false`, and propagates any provider error.
pub fn recall<S, P>(
    candidates: &[S],
    gold: &[S],
    threshold: f32,
    provider: &P,
) -> Result<Option<f64>>
where
    S: AsRef<str>,
    P: SimilarityProvider + ?Sized,
{
    if gold.is_empty() {
        return Ok(Some(f64::NAN));
    }
    if !provider.validate_threshold(threshold)? {
        return Ok(None);
    }

    let gold_enc = encode_all(gold, provider)?;
    let cand_enc = encode_all(candidates, provider)?;
    let report = assign(&gold_enc, &cand_enc, threshold, provider)?;
    Ok(Some(report.ratio()))
}

/// Precision, recall and F1 with each list encoded once.
///
/// Same result conventions as [`precision`] and [`recall`]; the threshold is only
/// checked when at least one side is non-empty.
pub fn evaluate<S, P>(
    candidates: &[S],
    gold: &[S],
    threshold: f32,
    provider: &P,
) -> Result<Option<Scores>>
where
    S: AsRef<str>,
    P: SimilarityProvider + ?Sized,
{
    if candidates.is_empty() && gold.is_empty() {
        return Ok(Some(Scores::new(f64::NAN, f64::NAN)));
    }
    if !provider.validate_threshold(threshold)? {
        return Ok(None);
    }

    let gold_enc = encode_all(gold, provider)?;
    let cand_enc = encode_all(candidates, provider)?;
    let precision = assign(&cand_enc, &gold_enc, threshold, provider)?.ratio();
    let recall = assign(&gold_enc, &cand_enc, threshold, provider)?.ratio();
    Ok(Some(Scores::new(precision, recall)))
}

/// Run the matching with explicit roles and return every assignment.
///
/// An empty query list gives an empty report whose ratio is NaN.
pub fn match_entities<S, P>(
    query: &[S],
    pool: &[S],
    threshold: f32,
    provider: &P,
) -> Result<Option<MatchReport>>
where
    S: AsRef<str>,
    P: SimilarityProvider + ?Sized,
{
    if query.is_empty() {
        return Ok(Some(MatchReport::undefined(pool.len())));
    }
    if !provider.validate_threshold(threshold)? {
        return Ok(None);
    }

    let query_enc = encode_all(query, provider)?;
    let pool_enc = encode_all(pool, provider)?;
    assign(&query_enc, &pool_enc, threshold, provider).map(Some)
}

/// Encode every element once, keeping list positions.
fn encode_all<S, P>(entities: &[S], provider: &P) -> Result<Vec<P::Encoded>>
where
    S: AsRef<str>,
    P: SimilarityProvider + ?Sized,
{
    entities.iter().map(|e| provider.encode(e.as_ref())).collect()
}

/// Match table, ranking, resolution order, greedy consume.
fn assign<P>(
    query: &[P::Encoded],
    pool: &[P::Encoded],
    threshold: f32,
    provider: &P,
) -> Result<MatchReport>
where
    P: SimilarityProvider + ?Sized,
{
    let mut table = build_match_table(query, pool, threshold, provider)?;
    rank_matches(&mut table);
    let order = resolution_order(&table);
    let assignments = resolve(&table, &order, pool.len());

    Ok(MatchReport {
        query_len: query.len(),
        pool_len: pool.len(),
        assignments,
    })
}

/// Per query entity, the pool entities with similarity >= threshold, in pool order.
fn build_match_table<P>(
    query: &[P::Encoded],
    pool: &[P::Encoded],
    threshold: f32,
    provider: &P,
) -> Result<Vec<Vec<Candidate>>>
where
    P: SimilarityProvider + ?Sized,
{
    let mut table = Vec::with_capacity(query.len());
    for q in query {
        let mut row = Vec::new();
        for (pool_idx, p) in pool.iter().enumerate() {
            let similarity = provider.similarity(q, p)?;
            if similarity >= threshold {
                row.push(Candidate {
                    pool: pool_idx,
                    similarity,
                });
            }
        }
        table.push(row);
    }
    Ok(table)
}

/// Sort each row by descending similarity; equal scores keep pool order.
fn rank_matches(table: &mut [Vec<Candidate>]) {
    for row in table.iter_mut() {
        row.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });
    }
}

/// Query positions by descending top-match similarity (0.0 without matches);
/// equal keys keep query order.
fn resolution_order(table: &[Vec<Candidate>]) -> Vec<usize> {
    let best: Vec<f32> = table
        .iter()
        .map(|row| row.first().map_or(0.0, |c| c.similarity))
        .collect();

    let mut order: Vec<usize> = (0..table.len()).collect();
    order.sort_by(|&a, &b| best[b].partial_cmp(&best[a]).unwrap_or(Ordering::Equal));
    order
}

/// At most one pool entity per query entity, each pool entity used once.
fn resolve(table: &[Vec<Candidate>], order: &[usize], pool_len: usize) -> Vec<Assignment> {
    let mut consumed = vec![false; pool_len];
    let mut assignments = Vec::new();

    for &q in order {
        if let Some(c) = table[q].iter().find(|c| !consumed[c.pool]) {
            consumed[c.pool] = true;
            assignments.push(Assignment {
                query: q,
                pool: c.pool,
                similarity: c.similarity,
            });
        }
    }
    assignments
}
