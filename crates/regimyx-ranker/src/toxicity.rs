//! Combination toxicity on the 0–10 scale.

use regimyx_common::entities::{Covariates, DrugRecord};

pub const MAX_TOXICITY: f64 = 10.0;

/// Summed member toxicity, discounted for multi-drug regimens and adjusted
/// for age, clamped to [0, 10].
pub fn aggregate_toxicity(members: &[&DrugRecord], covariates: Covariates) -> f64 {
    let mut total: f64 = members.iter().map(|d| d.toxicity_score).sum();

    // Combination regimens run at reduced per-drug doses.
    if members.len() > 1 {
        total *= 0.9;
    }

    if covariates.age > 70 {
        total *= 1.2;
    } else if covariates.age < 50 {
        total *= 0.9;
    }

    total.clamp(0.0, MAX_TOXICITY)
}
