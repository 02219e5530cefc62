//! Response Score (PRS): a 0–100 composite of molecular, cellular and
//! functional sub-scores for KRAS-profiled patients.
//!
//! PRS = molecular (≤35) + cellular (≤35) + functional (≤30)

use chrono::{DateTime, Utc};
use regimyx_common::confidence::{confidence_interval, prs_confidence};
use regimyx_common::entities::{
    CellularPhenotypeMetrics, ExpressionLevel, FunctionalAssay, KrasProfile, KrasStatus,
    MolecularMarkers, PatientContext,
};
use regimyx_common::{RegimyxError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const MOLECULAR_CAP: f64 = 35.0;
pub const CELLULAR_CAP: f64 = 35.0;
pub const FUNCTIONAL_CAP: f64 = 30.0;

pub const MODEL_VERSION: &str = "v4.0";

/// Ages and ECOG assumed by the toxicity-risk call when unrecorded.
const DEFAULT_RISK_AGE: u32 = 65;
const DEFAULT_RISK_ECOG: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseCategory {
    #[serde(rename = "Excellent Responder")]
    Excellent,
    #[serde(rename = "Good Responder")]
    Good,
    #[serde(rename = "Fair Responder")]
    Fair,
    #[serde(rename = "Poor Responder")]
    Poor,
}

impl ResponseCategory {
    pub fn from_score(total: f64) -> Self {
        if total >= 75.0 {
            ResponseCategory::Excellent
        } else if total >= 60.0 {
            ResponseCategory::Good
        } else if total >= 40.0 {
            ResponseCategory::Fair
        } else {
            ResponseCategory::Poor
        }
    }

    pub fn expected_tgi(&self) -> &'static str {
        match self {
            ResponseCategory::Excellent => "70-85%",
            ResponseCategory::Good => "55-70%",
            ResponseCategory::Fair => "35-55%",
            ResponseCategory::Poor => "15-35%",
        }
    }

    pub fn expected_survival_benefit(&self) -> &'static str {
        match self {
            ResponseCategory::Excellent => "12-18 months",
            ResponseCategory::Good => "8-12 months",
            ResponseCategory::Fair => "4-8 months",
            ResponseCategory::Poor => "2-4 months",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToxicityRisk {
    Low,
    #[serde(rename = "Low-Moderate")]
    LowModerate,
    #[serde(rename = "Moderate-High")]
    ModerateHigh,
}

impl ToxicityRisk {
    pub fn assess(age: u32, ecog: u8) -> Self {
        if age > 75 || ecog >= 2 {
            ToxicityRisk::ModerateHigh
        } else if age > 65 || ecog == 1 {
            ToxicityRisk::LowModerate
        } else {
            ToxicityRisk::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrsBreakdown {
    pub molecular_contribution: f64,
    pub cellular_phenotype: f64,
    pub functional_assay: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrsInterpretation {
    pub response_category: ResponseCategory,
    pub expected_tgi: String,
    pub expected_survival_benefit: String,
    pub toxicity_risk: ToxicityRisk,
    pub kras_significance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrsReport {
    /// Total rounded to one decimal
    pub prs_score: f64,
    pub confidence_interval: (f64, f64),
    /// Fraction in [0.5, 1.0]
    pub prediction_confidence: f64,
    pub score_breakdown: PrsBreakdown,
    pub interpretation: PrsInterpretation,
    pub timestamp: DateTime<Utc>,
    pub model_version: String,
}

/// Unrounded PRS figures, used for scoring before presentation rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrsScores {
    pub molecular: f64,
    pub cellular: f64,
    pub functional: f64,
    pub confidence: f64,
}

impl PrsScores {
    pub fn total(&self) -> f64 {
        self.molecular + self.cellular + self.functional
    }
}

#[derive(Debug, Clone, Default)]
pub struct PrsCalculator;

impl PrsCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Raw sub-scores and confidence. Fails when no KRAS profile is recorded.
    pub fn scores(&self, patient: &PatientContext) -> Result<PrsScores> {
        let kras = patient.kras.as_ref().ok_or_else(|| {
            RegimyxError::Input("Response Score requires a KRAS profile".to_string())
        })?;
        let default_markers = MolecularMarkers::default();
        let markers = patient.markers.as_ref().unwrap_or(&default_markers);

        Ok(PrsScores {
            molecular: molecular_score(kras, markers),
            cellular: patient.cellular.as_ref().map(cellular_score).unwrap_or(0.0),
            functional: patient.functional.as_ref().map(functional_score).unwrap_or(0.0),
            confidence: prs_confidence(
                patient.cellular.is_some(),
                patient.functional.is_some(),
                markers.marker_count(),
            ),
        })
    }

    /// Full report with interpretation.
    pub fn calculate(&self, patient: &PatientContext) -> Result<PrsReport> {
        let scores = self.scores(patient)?;
        Ok(self.report(patient, &scores))
    }

    /// Rounded, interpreted report for already computed scores.
    pub fn report(&self, patient: &PatientContext, scores: &PrsScores) -> PrsReport {
        let total = scores.total();
        let (lower, upper) = confidence_interval(total, scores.confidence);
        let category = ResponseCategory::from_score(total);
        let risk = ToxicityRisk::assess(
            patient.age.unwrap_or(DEFAULT_RISK_AGE),
            patient.ecog_score.unwrap_or(DEFAULT_RISK_ECOG),
        );

        debug!(
            "PRS {:.1} (molecular {:.1}, cellular {:.1}, functional {:.1}), confidence {:.2}",
            total, scores.molecular, scores.cellular, scores.functional, scores.confidence
        );

        PrsReport {
            prs_score: round1(total),
            confidence_interval: (round1(lower), round1(upper)),
            prediction_confidence: round2(scores.confidence),
            score_breakdown: PrsBreakdown {
                molecular_contribution: round1(scores.molecular),
                cellular_phenotype: round1(scores.cellular),
                functional_assay: round1(scores.functional),
            },
            interpretation: PrsInterpretation {
                response_category: category,
                expected_tgi: category.expected_tgi().to_string(),
                expected_survival_benefit: category.expected_survival_benefit().to_string(),
                toxicity_risk: risk,
                kras_significance: patient
                    .kras
                    .as_ref()
                    .map_or("KRAS testing required", |k| k.clinical_significance())
                    .to_string(),
            },
            timestamp: Utc::now(),
            model_version: MODEL_VERSION.to_string(),
        }
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

// ── Domain sub-scores ────────────────────────────────────────────────────────

pub fn molecular_score(kras: &KrasProfile, markers: &MolecularMarkers) -> f64 {
    let mut score: f64 = match (kras.status, kras.mutation_type.as_deref()) {
        (KrasStatus::Mutant, Some("G12D" | "G12V")) => 15.0,
        (KrasStatus::Mutant, Some("G12C")) => 10.0,
        (KrasStatus::Mutant, _) => 12.0,
        (KrasStatus::WildType, _) => 8.0,
        (KrasStatus::Unknown, _) => 0.0,
    };

    score += match markers.prpc {
        ExpressionLevel::High => 5.0,
        ExpressionLevel::Medium => 3.0,
        _ => 0.0,
    };
    if markers.lrp_lr == ExpressionLevel::High {
        score += 3.0;
    }

    // Strong pathway activation predicts resistance.
    let activated = markers.phosphorylation_ratio("p_ERK") > 2.0
        || markers.phosphorylation_ratio("p_AKT") > 2.0;
    score += if activated { 4.0 } else { 7.0 };

    score.min(MOLECULAR_CAP)
}

pub fn cellular_score(metrics: &CellularPhenotypeMetrics) -> f64 {
    let viability = metrics.viability_rate.unwrap_or(0.0);
    let diameter = metrics.spheroid_diameter_um.unwrap_or(0.0);
    let compactness = metrics.spheroid_compactness.unwrap_or(0.0);
    let emt_reversal = metrics.emt_reversal_degree.unwrap_or(0.0);

    let mut score: f64 = if viability > 80.0 {
        12.0
    } else if viability > 60.0 {
        8.0
    } else {
        5.0
    };

    score += if diameter > 400.0 && compactness > 0.8 {
        10.0
    } else if diameter > 300.0 {
        7.0
    } else {
        4.0
    };

    score += if emt_reversal > 40.0 {
        10.0
    } else if emt_reversal > 20.0 {
        6.0
    } else {
        3.0
    };

    score.min(CELLULAR_CAP)
}

pub fn functional_score(assay: &FunctionalAssay) -> f64 {
    let synergy = assay.dose_response_synergy.unwrap_or(1.0);
    let organoid_ic50 = assay.organoid_ic50.unwrap_or(100.0);
    let tgi = assay.animal_tgi.unwrap_or(0.0);

    let mut score: f64 = if synergy > 1.3 {
        15.0
    } else if synergy > 1.1 {
        10.0
    } else {
        5.0
    };

    score += if organoid_ic50 < 30.0 {
        10.0
    } else if organoid_ic50 < 50.0 {
        7.0
    } else {
        4.0
    };

    score += if tgi > 60.0 {
        5.0
    } else if tgi > 40.0 {
        3.0
    } else {
        1.0
    };

    score.min(FUNCTIONAL_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use regimyx_test_utils::{fully_profiled_patient, g12d_patient};
    use std::collections::BTreeMap;

    #[test]
    fn test_g12d_without_assays() {
        let report = PrsCalculator::new().calculate(&g12d_patient()).unwrap();
        // KRAS 15 + pathways at baseline 7
        assert_eq!(report.score_breakdown.molecular_contribution, 22.0);
        assert_eq!(report.score_breakdown.cellular_phenotype, 0.0);
        assert_eq!(report.score_breakdown.functional_assay, 0.0);
        assert_eq!(report.prediction_confidence, 0.5);
        assert_eq!(report.confidence_interval, (17.0, 27.0));
        assert_eq!(report.interpretation.response_category, ResponseCategory::Poor);
        assert_eq!(report.interpretation.expected_tgi, "15-35%");
        assert!(report.interpretation.kras_significance.starts_with("Resistant to anti-EGFR"));
        assert_eq!(report.model_version, MODEL_VERSION);
    }

    #[test]
    fn test_missing_kras_is_input_error() {
        let patient = PatientContext::builder().age(55).build();
        assert!(matches!(PrsCalculator::new().calculate(&patient), Err(RegimyxError::Input(_))));
    }

    #[test]
    fn test_kras_lookup() {
        let m = MolecularMarkers::default();
        assert_eq!(molecular_score(&KrasProfile::mutant("G12V"), &m), 22.0);
        assert_eq!(molecular_score(&KrasProfile::mutant("G12C"), &m), 17.0);
        assert_eq!(molecular_score(&KrasProfile::mutant("G13D"), &m), 19.0);
        assert_eq!(molecular_score(&KrasProfile::wild_type(), &m), 15.0);
        assert_eq!(molecular_score(&KrasProfile::default(), &m), 7.0);
    }

    #[test]
    fn test_pathway_activation_lowers_molecular() {
        let markers = MolecularMarkers {
            prpc: ExpressionLevel::High,
            lrp_lr: ExpressionLevel::High,
            phosphorylation: BTreeMap::from([("p_ERK".to_string(), 2.3), ("p_AKT".to_string(), 1.8)]),
            ..Default::default()
        };
        // 15 + 5 + 3 + 4
        assert_eq!(molecular_score(&KrasProfile::mutant("G12D"), &markers), 27.0);
    }

    #[test]
    fn test_fully_profiled_patient_is_excellent() {
        let report = PrsCalculator::new().calculate(&fully_profiled_patient()).unwrap();
        // molecular 15+5+3+7=30, cellular 12+10+10=32, functional 15+10+5=30
        assert_eq!(report.prs_score, 92.0);
        assert_eq!(report.prediction_confidence, 1.0);
        assert_eq!(report.confidence_interval, (92.0, 92.0));
        assert_eq!(report.interpretation.response_category, ResponseCategory::Excellent);
        assert_eq!(report.interpretation.expected_survival_benefit, "12-18 months");
        assert_eq!(report.interpretation.toxicity_risk, ToxicityRisk::Low);
    }

    #[test]
    fn test_sub_scores_within_caps() {
        let cellular = CellularPhenotypeMetrics {
            viability_rate: Some(99.0),
            spheroid_diameter_um: Some(900.0),
            spheroid_compactness: Some(1.0),
            emt_reversal_degree: Some(99.0),
            ..Default::default()
        };
        assert!(cellular_score(&cellular) <= CELLULAR_CAP);
        assert_eq!(cellular_score(&CellularPhenotypeMetrics::default()), 12.0);

        let functional = FunctionalAssay {
            dose_response_synergy: Some(2.0),
            organoid_ic50: Some(1.0),
            animal_tgi: Some(95.0),
            ..Default::default()
        };
        assert!(functional_score(&functional) <= FUNCTIONAL_CAP);
        assert_eq!(functional_score(&FunctionalAssay::default()), 10.0);
    }

    #[test]
    fn test_toxicity_risk_bands() {
        assert_eq!(ToxicityRisk::assess(80, 0), ToxicityRisk::ModerateHigh);
        assert_eq!(ToxicityRisk::assess(50, 2), ToxicityRisk::ModerateHigh);
        assert_eq!(ToxicityRisk::assess(70, 0), ToxicityRisk::LowModerate);
        assert_eq!(ToxicityRisk::assess(50, 1), ToxicityRisk::LowModerate);
        assert_eq!(ToxicityRisk::assess(50, 0), ToxicityRisk::Low);
    }

    #[test]
    fn test_category_thresholds() {
        assert_eq!(ResponseCategory::from_score(75.0), ResponseCategory::Excellent);
        assert_eq!(ResponseCategory::from_score(74.9), ResponseCategory::Good);
        assert_eq!(ResponseCategory::from_score(40.0), ResponseCategory::Fair);
        assert_eq!(ResponseCategory::from_score(39.9), ResponseCategory::Poor);
    }

    #[test]
    fn test_report_serializes_category_names() {
        let report = PrsCalculator::new().calculate(&g12d_patient()).unwrap();
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["interpretation"]["response_category"], "Poor Responder");
        // No ECOG on record: resolved to 1
        assert_eq!(v["interpretation"]["toxicity_risk"], "Low-Moderate");

        let fit = PatientContext { ecog_score: Some(0), ..g12d_patient() };
        let v = serde_json::to_value(PrsCalculator::new().calculate(&fit).unwrap()).unwrap();
        assert_eq!(v["interpretation"]["toxicity_risk"], "Low");
    }
}
