//! Similarity scorers. Every scorer is symmetric, bounded to 0..=100 and
//! scores identical inputs at 100.

use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

use super::helpers::{indel_ratio, sim_levenshtein_pct, with_units};

pub trait Scorer: Send + Sync {
    fn score(&self, a: &str, b: &str) -> f64;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScorerKind {
    #[default]
    Ratio,
    PartialRatio,
    JaroWinkler,
    Levenshtein,
}

impl ScorerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ratio => "ratio",
            Self::PartialRatio => "partial_ratio",
            Self::JaroWinkler => "jaro_winkler",
            Self::Levenshtein => "levenshtein",
        }
    }

    pub fn build(&self) -> Box<dyn Scorer> {
        match self {
            Self::Ratio => Box::new(Ratio),
            Self::PartialRatio => Box::new(PartialRatio),
            Self::JaroWinkler => Box::new(JaroWinkler),
            Self::Levenshtein => Box::new(Levenshtein),
        }
    }
}

impl std::fmt::Display for ScorerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Indel ratio: `200 * LCS / (|a| + |b|)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ratio;

impl Scorer for Ratio {
    fn score(&self, a: &str, b: &str) -> f64 {
        with_units(a, b, indel_ratio::<u8>, indel_ratio::<char>)
    }
    fn name(&self) -> &'static str {
        "ratio"
    }
}

/// Best `Ratio` of the shorter input against every alignment with the longer
/// one: each full-length window, plus the partial overlaps at either end.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialRatio;

fn best_alignment<T: PartialEq>(short: &[T], long: &[T]) -> f64 {
    let m = short.len();
    let n = long.len();
    let edges = (1..m.min(n + 1)).flat_map(|i| [&long[..i], &long[n - i..]]);
    let mut best = 0.0f64;
    for window in long.windows(m).chain(edges) {
        let s = indel_ratio(short, window);
        if s > best {
            best = s;
            if best >= 100.0 {
                break;
            }
        }
    }
    best
}

fn partial_ratio_units<T: PartialEq>(a: &[T], b: &[T]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return if a.len() == b.len() { 100.0 } else { 0.0 };
    }
    match a.len().cmp(&b.len()) {
        std::cmp::Ordering::Less => best_alignment(a, b),
        std::cmp::Ordering::Greater => best_alignment(b, a),
        // equal lengths: try both orientations so the score stays symmetric
        std::cmp::Ordering::Equal => best_alignment(a, b).max(best_alignment(b, a)),
    }
}

impl Scorer for PartialRatio {
    fn score(&self, a: &str, b: &str) -> f64 {
        with_units(a, b, partial_ratio_units::<u8>, partial_ratio_units::<char>)
    }
    fn name(&self) -> &'static str {
        "partial_ratio"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinkler;

impl Scorer for JaroWinkler {
    fn score(&self, a: &str, b: &str) -> f64 {
        if a == b {
            return 100.0;
        }
        // greedy Jaro matching depends on argument order
        let (x, y) = if a <= b { (a, b) } else { (b, a) };
        (jaro_winkler(x, y) * 100.0).clamp(0.0, 100.0)
    }
    fn name(&self) -> &'static str {
        "jaro_winkler"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Levenshtein;

impl Scorer for Levenshtein {
    fn score(&self, a: &str, b: &str) -> f64 {
        sim_levenshtein_pct(a, b).clamp(0.0, 100.0)
    }
    fn name(&self) -> &'static str {
        "levenshtein"
    }
}
