//! Shared helpers for similarity scoring.

use strsim::levenshtein;

/// Length of the longest common subsequence, one DP row at a time.
pub(crate) fn lcs_len<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    // keep the shorter side as the DP row
    let (outer, inner) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut row = vec![0usize; inner.len() + 1];
    for x in outer {
        let mut diag = 0usize;
        for (j, y) in inner.iter().enumerate() {
            let up = row[j + 1];
            row[j + 1] = if x == y { diag + 1 } else { up.max(row[j]) };
            diag = up;
        }
    }
    row[inner.len()]
}

/// Normalized indel similarity, 0.0-100.0. Two empty inputs are identical.
pub(crate) fn indel_ratio<T: PartialEq>(a: &[T], b: &[T]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(a, b) as f64 / total as f64
}

/// Compute Levenshtein similarity as a percentage (0.0-100.0).
pub(crate) fn sim_levenshtein_pct(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 100.0;
    }
    let dist = levenshtein(a, b);
    (1.0 - (dist as f64 / max_len as f64)) * 100.0
}

/// Run `f` over both inputs as byte slices when both are ASCII, otherwise as chars.
#[inline]
pub(crate) fn with_units<R>(
    a: &str,
    b: &str,
    bytes: impl FnOnce(&[u8], &[u8]) -> R,
    chars: impl FnOnce(&[char], &[char]) -> R,
) -> R {
    if a.is_ascii() && b.is_ascii() {
        bytes(a.as_bytes(), b.as_bytes())
    } else {
        let ca: Vec<char> = a.chars().collect();
        let cb: Vec<char> = b.chars().collect();
        chars(&ca, &cb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lcs_basic() {
        assert_eq!(lcs_len(b"acme corp", b"acme corporation"), 9);
        assert_eq!(lcs_len(b"abc", b"xyz"), 0);
        assert_eq!(lcs_len(b"", b"abc"), 0);
        assert_eq!(lcs_len(b"abcbdab", b"bdcaba"), 4);
    }

    #[test]
    fn indel_ratio_values() {
        assert_eq!(indel_ratio::<u8>(b"", b""), 100.0);
        assert_eq!(indel_ratio(b"abc", b"abc"), 100.0);
        assert_eq!(indel_ratio(b"abc", b""), 0.0);
        // 2 * 9 / 25
        assert!((indel_ratio(b"acme corp", b"acme corporation") - 72.0).abs() < 1e-9);
    }

    #[test]
    fn levenshtein_pct_counts_chars() {
        assert_eq!(sim_levenshtein_pct("", ""), 100.0);
        let expected = (1.0 - 3.0 / 7.0) * 100.0;
        assert!((sim_levenshtein_pct("kitten", "sitting") - expected).abs() < 1e-9);
        assert_eq!(sim_levenshtein_pct("é", "é"), 100.0);
    }
}
