//! Surface-level similarity between two spans.

use crate::blocks::matched_len;

/// Mean of the character block ratio and the edit-similarity ratio, in `[0, 1]`.
pub fn lexical_similarity(a: &str, b: &str) -> f64 {
    ((block_ratio(a, b) + edit_ratio(a, b)) / 2.0).clamp(0.0, 1.0)
}

/// `2 * M / (len(a) + len(b))` where `M` is the total length of the matching
/// character blocks. Two empty strings are identical (1.0).
///
/// The pair is put in a canonical order first; block alignment breaks ties
/// positionally, so this keeps the ratio symmetric.
pub fn block_ratio(a: &str, b: &str) -> f64 {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    let x: Vec<char> = first.chars().collect();
    let y: Vec<char> = second.chars().collect();
    let total = x.len() + y.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matched_len(&x, &y) as f64 / total as f64
}

/// Indel similarity `(len_a + len_b - indel) / (len_a + len_b)`, rounded to a
/// whole percent and rescaled to `[0, 1]`.
///
/// With insertions and deletions only, `indel = len_a + len_b - 2 * lcs`, so
/// the ratio is `2 * lcs / (len_a + len_b)`.
pub fn edit_ratio(a: &str, b: &str) -> f64 {
    let x: Vec<char> = a.chars().collect();
    let y: Vec<char> = b.chars().collect();
    let total = x.len() + y.len();
    if total == 0 {
        return 1.0;
    }
    let ratio = 2.0 * lcs_len(&x, &y) as f64 / total as f64;
    (ratio * 100.0).round() / 100.0
}

/// Longest common subsequence length, two-row table.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut prev = vec![0usize; short.len() + 1];
    let mut cur = vec![0usize; short.len() + 1];
    for &ca in long {
        for (j, &cb) in short.iter().enumerate() {
            cur[j + 1] = if ca == cb { prev[j] + 1 } else { prev[j + 1].max(cur[j]) };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[short.len()]
}
