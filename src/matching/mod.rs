pub mod algorithms;
pub(crate) mod helpers;
pub mod merge;
pub mod rayon_pool;

use crate::models::Record;
use crate::normalize::normalize_value;
use algorithms::Scorer;

pub const DEFAULT_THRESHOLD: f64 = 90.0;

/// Dense `rows x cols` score table, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    rows: usize,
    cols: usize,
    scores: Vec<f64>,
}

impl SimilarityMatrix {
    pub fn compute(queries: &[&str], corpus: &[&str], scorer: &dyn Scorer) -> Self {
        let mut scores = Vec::with_capacity(queries.len() * corpus.len());
        for q in queries {
            scores.extend(corpus.iter().map(|c| scorer.score(q, c)));
        }
        Self {
            rows: queries.len(),
            cols: corpus.len(),
            scores,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row(&self, r: usize) -> &[f64] {
        &self.scores[r * self.cols..(r + 1) * self.cols]
    }

    pub fn get(&self, r: usize, c: usize) -> f64 {
        self.scores[r * self.cols + c]
    }

    /// Per-row argmax; ties go to the lowest column.
    pub fn best_per_row(&self) -> Vec<BestMatch> {
        (0..self.rows).map(|r| BestMatch::from_row(self.row(r))).collect()
    }
}

/// Best reference for one query key. `index` is `None` only for an empty corpus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestMatch {
    pub index: Option<usize>,
    pub score: f64,
}

impl BestMatch {
    fn from_row(row: &[f64]) -> Self {
        let mut best = BestMatch {
            index: None,
            score: 0.0,
        };
        for (i, &s) in row.iter().enumerate() {
            if best.index.is_none() || s > best.score {
                best = BestMatch {
                    index: Some(i),
                    score: s,
                };
            }
        }
        best
    }

    /// The matched corpus index when the score clears `threshold` (strictly).
    pub fn accepted(&self, threshold: f64) -> Option<usize> {
        self.index.filter(|_| self.score > threshold)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MatchOptions {
    pub query_field: usize,
    pub threshold: f64,
}

/// Normalized keys for a batch of query records.
pub fn batch_keys(records: &[Record], query_field: usize) -> Vec<String> {
    records.iter().map(|r| normalize_value(r.get(query_field))).collect()
}

/// Best corpus match for every query key, in input order.
pub fn match_keys(queries: &[&str], corpus: &[&str], scorer: &dyn Scorer) -> Vec<BestMatch> {
    SimilarityMatrix::compute(queries, corpus, scorer).best_per_row()
}

pub fn match_batch(
    records: &[Record],
    corpus: &[&str],
    scorer: &dyn Scorer,
    opts: MatchOptions,
) -> Vec<BestMatch> {
    let keys = batch_keys(records, opts.query_field);
    let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    match_keys(&refs, corpus, scorer)
}
