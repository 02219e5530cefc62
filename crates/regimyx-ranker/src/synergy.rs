//! Drug interaction models: Bliss independence, Loewe additivity and the
//! Chou–Talalay Combination Index, plus the category heuristic used when
//! neither curated nor measured data exists.

use rand::Rng;
use regimyx_common::entities::{CombinationResponse, DrugRecord, KnownCombination};
use regimyx_common::SynergyMethod;
use serde::{Deserialize, Serialize};

use crate::efficacy::single_agent_efficacy;

/// Heuristic synergy never exceeds this.
pub const MAX_HEURISTIC_SYNERGY: f64 = 1.6;

/// Expected combined effect under Bliss independence: 1 − Π(1 − eᵢ).
pub fn expected_bliss(single_efficacies: &[f64]) -> f64 {
    1.0 - single_efficacies.iter().map(|e| 1.0 - e).product::<f64>()
}

/// Observed / Bliss-expected effect; 1.0 when nothing is expected.
pub fn bliss_independence(single_efficacies: &[f64], observed: f64) -> f64 {
    ratio_or_neutral(observed, expected_bliss(single_efficacies))
}

/// Observed / mean single-agent effect; 1.0 when nothing is expected.
pub fn loewe_additivity(single_efficacies: &[f64], observed: f64) -> f64 {
    if single_efficacies.is_empty() {
        return 1.0;
    }
    let expected = single_efficacies.iter().sum::<f64>() / single_efficacies.len() as f64;
    ratio_or_neutral(observed, expected)
}

pub fn synergy_score(single_efficacies: &[f64], observed: f64, method: SynergyMethod) -> f64 {
    match method {
        SynergyMethod::Bliss => bliss_independence(single_efficacies, observed),
        SynergyMethod::Loewe => loewe_additivity(single_efficacies, observed),
    }
}

fn ratio_or_neutral(observed: f64, expected: f64) -> f64 {
    if expected.abs() < f64::EPSILON {
        return 1.0;
    }
    observed / expected
}

/// Combination Index CI = Σ doseᵢ / IC50ᵢ over `(dose, ic50)` pairs.
/// A zero IC50 makes the index undefined and reads as additive (1.0).
pub fn combination_index(dose_ic50: &[(f64, f64)]) -> f64 {
    if dose_ic50.iter().any(|&(_, ic50)| ic50.abs() < f64::EPSILON) {
        return 1.0;
    }
    dose_ic50.iter().map(|&(dose, ic50)| dose / ic50).sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CiClass {
    Synergistic,
    Additive,
    Antagonistic,
}

impl CiClass {
    pub fn from_ci(ci: f64) -> Self {
        const TOLERANCE: f64 = 1e-9;
        if ci < 1.0 - TOLERANCE {
            CiClass::Synergistic
        } else if ci > 1.0 + TOLERANCE {
            CiClass::Antagonistic
        } else {
            CiClass::Additive
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CiClass::Synergistic => "synergistic",
            CiClass::Additive => "additive",
            CiClass::Antagonistic => "antagonistic",
        }
    }
}

/// Reading of a synergy ratio (1.0 = no interaction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynergyClass {
    SingleAgent,
    Synergistic,
    Enhanced,
    Additive,
    Antagonistic,
}

impl SynergyClass {
    pub fn from_score(score: f64) -> Self {
        if score > 1.2 {
            SynergyClass::Synergistic
        } else if score > 1.0 {
            SynergyClass::Enhanced
        } else if score > 0.8 {
            SynergyClass::Additive
        } else {
            SynergyClass::Antagonistic
        }
    }

    pub fn interpretation(&self) -> &'static str {
        match self {
            SynergyClass::SingleAgent => "Single agent",
            SynergyClass::Synergistic => "Strong synergy",
            SynergyClass::Enhanced => "Enhanced effect",
            SynergyClass::Additive => "Additive effect",
            SynergyClass::Antagonistic => "Possible antagonism",
        }
    }
}

/// Category heuristic. Regimens drawing every drug from a different class
/// are assumed to interact favourably.
pub fn heuristic_synergy<R: Rng + ?Sized>(members: &[&DrugRecord], rng: &mut R) -> f64 {
    if members.len() <= 1 {
        return 1.0;
    }
    let mut categories: Vec<&str> = members.iter().map(|d| d.category.as_str()).collect();
    categories.sort_unstable();
    categories.dedup();

    if categories.len() == members.len() {
        (1.2 + rng.gen_range(-0.1_f64..0.2)).min(MAX_HEURISTIC_SYNERGY)
    } else {
        1.0 + rng.gen_range(-0.1_f64..0.1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynergySource {
    SingleAgent,
    Curated,
    Measured,
    Heuristic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynergyEstimate {
    pub score: f64,
    pub source: SynergySource,
    /// Present when a measured response carried a dose for every member.
    pub combination_index: Option<f64>,
}

/// Synergy for one candidate: curated record, then measured response,
/// then the category heuristic.
pub fn estimate_synergy<R: Rng + ?Sized>(
    members: &[&DrugRecord],
    known: Option<&KnownCombination>,
    measured: Option<&CombinationResponse>,
    method: SynergyMethod,
    rng: &mut R,
) -> SynergyEstimate {
    if members.len() <= 1 {
        return SynergyEstimate { score: 1.0, source: SynergySource::SingleAgent, combination_index: None };
    }
    if let Some(record) = known {
        return SynergyEstimate {
            score: record.synergy_score,
            source: SynergySource::Curated,
            combination_index: None,
        };
    }
    if let Some(response) = measured {
        let singles: Vec<f64> = members.iter().map(|d| single_agent_efficacy(d)).collect();
        let dose_ic50: Option<Vec<(f64, f64)>> = members
            .iter()
            .map(|d| response.doses.get(&d.id).map(|&dose| (dose, d.mean_ic50())))
            .collect();
        return SynergyEstimate {
            score: synergy_score(&singles, response.combined_efficacy, method),
            source: SynergySource::Measured,
            combination_index: dose_ic50.map(|pairs| combination_index(&pairs)),
        };
    }
    SynergyEstimate {
        score: heuristic_synergy(members, rng),
        source: SynergySource::Heuristic,
        combination_index: None,
    }
}
