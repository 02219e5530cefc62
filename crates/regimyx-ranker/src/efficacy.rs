//! Efficacy estimation.
//!
//! Curated clinical efficacy wins outright. Otherwise single-agent
//! efficacies are derived from IC50 and combined under independence, then
//! adjusted for stage and age.

use regimyx_common::entities::{CancerStage, Covariates, DrugRecord, KnownCombination};
use serde::{Deserialize, Serialize};

use crate::synergy::expected_bliss;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EfficacySource {
    Curated,
    Estimated,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EfficacyEstimate {
    pub value: f64,
    pub source: EfficacySource,
}

/// eᵢ = 1 / (1 + mean IC50). Lower IC50 means a more potent drug.
pub fn single_agent_efficacy(drug: &DrugRecord) -> f64 {
    1.0 / (1.0 + drug.mean_ic50())
}

pub fn stage_factor(stage: CancerStage) -> f64 {
    match stage {
        CancerStage::I => 1.10,
        CancerStage::II => 1.00,
        CancerStage::III => 0.95,
        CancerStage::IV => 0.90,
    }
}

fn age_factor(age: u32) -> f64 {
    if age > 70 {
        0.95
    } else if age < 50 {
        1.05
    } else {
        1.0
    }
}

/// Efficacy of a candidate regimen for one patient, in [0, 1].
pub fn estimate_efficacy(
    members: &[&DrugRecord],
    known: Option<&KnownCombination>,
    covariates: Covariates,
) -> EfficacyEstimate {
    if let Some(record) = known {
        return EfficacyEstimate { value: record.clinical_efficacy, source: EfficacySource::Curated };
    }

    let singles: Vec<f64> = members.iter().map(|d| single_agent_efficacy(d)).collect();
    let combined = expected_bliss(&singles);
    let adjusted = combined * stage_factor(covariates.stage) * age_factor(covariates.age);

    EfficacyEstimate { value: adjusted.clamp(0.0, 1.0), source: EfficacySource::Estimated }
}
