//! Character-level similarity used by the fuzzy match steps.
//!
//! Scores come from `similar`'s diff ratio: `2·M / T`, where `T` is the
//! combined length and `M` the number of characters the two sides share
//! in the diff. Comparison is over Unicode scalar values.

use similar::TextDiff;

/// Minimum ratio a candidate needs to count as a match.
pub const DEFAULT_CUTOFF: f32 = 0.6;

/// Similarity of `a` and `b` in `0.0..=1.0`. Two empty strings score 1.0.
pub fn ratio(a: &str, b: &str) -> f32 {
    TextDiff::from_chars(a, b).ratio()
}

/// Best candidate for `word` scoring at least `cutoff`.
///
/// Equal ratios are broken toward the lexicographically greatest
/// candidate, so the result depends only on the candidate set, not on
/// its order.
pub fn close_match<'a, I>(word: &str, candidates: I, cutoff: f32) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .map(|candidate| (ratio(candidate, word), candidate))
        .filter(|(score, _)| *score >= cutoff)
        .max_by(|(a_score, a), (b_score, b)| a_score.total_cmp(b_score).then_with(|| a.cmp(b)))
        .map(|(_, candidate)| candidate)
}
