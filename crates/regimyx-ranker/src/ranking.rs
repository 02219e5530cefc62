//! Final ordering of scored candidates.

use crate::scorer::ScoreBreakdown;

/// Sort by overall score descending, keep `top_n`, number ranks 1..k.
///
/// The sort is stable, so equal scores keep the order the candidates were
/// generated in.
pub fn rank_and_truncate(mut scored: Vec<ScoreBreakdown>, top_n: usize) -> Vec<ScoreBreakdown> {
    scored.sort_by(|a, b| b.overall_score.total_cmp(&a.overall_score));
    scored.truncate(top_n);
    for (i, item) in scored.iter_mut().enumerate() {
        item.rank = i + 1;
    }
    scored
}
