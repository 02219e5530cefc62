//! Candidate combination generation.
//!
//! Enumerates every n-drug subset of the pool in lexicographic order and,
//! when the space is larger than the cap, keeps the least toxic subsets.

use std::collections::BTreeSet;

use regimyx_common::entities::DrugRecord;
use regimyx_common::{EngineWarning, RegimyxError, Result};
use tracing::{info, warn};

/// Largest regimen the engine will assemble.
pub const MAX_COMBINATION_SIZE: usize = 3;

#[derive(Debug, Clone)]
pub struct CombinationCandidate<'a> {
    pub members: Vec<&'a DrugRecord>,
    /// Position in the generated list; the ranker's tie-breaker.
    pub ordinal: usize,
}

impl<'a> CombinationCandidate<'a> {
    pub fn drug_ids(&self) -> Vec<&'a str> {
        self.members.iter().map(|d| d.id.as_str()).collect()
    }

    pub fn drug_names(&self) -> Vec<String> {
        self.members.iter().map(|d| d.name.clone()).collect()
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }
}

#[derive(Debug)]
pub struct GeneratedCandidates<'a> {
    pub candidates: Vec<CombinationCandidate<'a>>,
    /// Combination size actually used (may be below the request).
    pub effective_size: usize,
    /// Number of subsets before pruning.
    pub total_enumerated: usize,
    pub warnings: Vec<EngineWarning>,
}

/// Enumerate n-drug candidates from `pool`.
///
/// A pool smaller than `n` reduces `n` to the pool size and records a
/// warning. When more than `max_candidates` subsets exist, the lowest
/// summed-toxicity subsets are kept, ties in enumeration order.
pub fn generate_combinations<'a>(
    pool: &[&'a DrugRecord],
    n: usize,
    max_candidates: Option<usize>,
) -> Result<GeneratedCandidates<'a>> {
    if n == 0 {
        return Err(RegimyxError::Input("combination size must be at least 1".to_string()));
    }
    if n > MAX_COMBINATION_SIZE {
        return Err(RegimyxError::Input(format!(
            "combination size {n} exceeds the maximum of {MAX_COMBINATION_SIZE}"
        )));
    }

    // A drug listed twice must never pair with itself.
    let mut seen = BTreeSet::new();
    let pool: Vec<&'a DrugRecord> = pool
        .iter()
        .copied()
        .filter(|d| seen.insert(d.id.as_str()))
        .collect();

    let mut warnings = Vec::new();
    let mut effective_size = n;
    if pool.len() < n {
        warn!("Not enough drugs in pool: {} available, {} requested", pool.len(), n);
        effective_size = pool.len();
        if effective_size == 0 {
            return Err(RegimyxError::Input(
                "no drugs available for the requested cancer type".to_string(),
            ));
        }
        warnings.push(EngineWarning::CombinationSizeReduced { requested: n, effective: effective_size });
    }

    let mut subsets: Vec<Vec<&'a DrugRecord>> = k_combinations(pool.len(), effective_size)
        .into_iter()
        .map(|idx| idx.into_iter().map(|i| pool[i]).collect())
        .collect();
    let total_enumerated = subsets.len();

    if let Some(cap) = max_candidates {
        if subsets.len() > cap {
            // Stable: equal toxicity keeps enumeration order.
            subsets.sort_by(|a, b| summed_toxicity(a).total_cmp(&summed_toxicity(b)));
            subsets.truncate(cap);
        }
    }

    let candidates: Vec<CombinationCandidate<'a>> = subsets
        .into_iter()
        .enumerate()
        .map(|(ordinal, members)| CombinationCandidate { members, ordinal })
        .collect();

    info!(
        "{} combinations generated ({} enumerated, size {})",
        candidates.len(),
        total_enumerated,
        effective_size
    );

    Ok(GeneratedCandidates { candidates, effective_size, total_enumerated, warnings })
}

fn summed_toxicity(members: &[&DrugRecord]) -> f64 {
    members.iter().map(|d| d.toxicity_score).sum()
}

/// Index sets of every k-subset of 0..p, in lexicographic order.
fn k_combinations(p: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    if k == 0 || k > p {
        return out;
    }
    let mut idx: Vec<usize> = (0..k).collect();
    loop {
        out.push(idx.clone());
        let Some(i) = (0..k).rev().find(|&i| idx[i] != i + p - k) else {
            return out;
        };
        idx[i] += 1;
        for j in i + 1..k {
            idx[j] = idx[j - 1] + 1;
        }
    }
}

/// Binomial coefficient C(p, k).
pub fn binomial(p: usize, k: usize) -> usize {
    if k > p {
        return 0;
    }
    let k = k.min(p - k);
    (0..k).fold(1usize, |acc, i| acc * (p - i) / (i + 1))
}
