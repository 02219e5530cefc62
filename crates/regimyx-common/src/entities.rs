/// Core entity types consumed by the scoring engine.
/// Reference data (drugs, curated regimens) is loaded once and shared
/// read-only; the patient snapshot is owned by each request.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Age assumed for efficacy and toxicity covariates when none is recorded.
pub const DEFAULT_AGE: u32 = 60;

// ---------------------------------------------------------------------------
// Drug reference data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugRecord {
    pub id: String,
    pub name: String,
    pub category: String,
    pub mechanism: String,
    pub toxicity_score: f64,                 // 0–10
    #[serde(default = "default_ic50_range")]
    pub typical_ic50_range: (f64, f64),      // (low, high) μM
    #[serde(default)]
    pub applicable_cancer_types: Vec<String>,
    #[serde(default)]
    pub side_effects: Vec<String>,
}

fn default_ic50_range() -> (f64, f64) { (1.0, 10.0) }

impl DrugRecord {
    /// Midpoint of the typical IC50 range.
    pub fn mean_ic50(&self) -> f64 {
        (self.typical_ic50_range.0 + self.typical_ic50_range.1) / 2.0
    }

    /// Case-insensitive applicability check against a cancer type name.
    pub fn applies_to(&self, cancer_type: &str) -> bool {
        self.applicable_cancer_types
            .iter()
            .any(|c| c.eq_ignore_ascii_case(cancer_type.trim()))
    }
}

// ---------------------------------------------------------------------------
// Curated combination
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownCombination {
    /// Unordered set of member drug ids.
    pub drug_ids: Vec<String>,
    pub display_name: String,
    #[serde(default = "default_synergy")]
    pub synergy_score: f64,
    pub clinical_efficacy: f64,              // 0–1
    pub evidence_level: String,              // e.g. 1A, 2A
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub response_rate: Option<String>,
    #[serde(default)]
    pub survival_benefit: Option<String>,
}

fn default_synergy() -> f64 { 1.0 }

impl KnownCombination {
    pub fn id_set(&self) -> BTreeSet<&str> {
        self.drug_ids.iter().map(String::as_str).collect()
    }

    /// Free-text clinical summary shown alongside a recommendation.
    pub fn notes(&self) -> String {
        format!(
            "Response rate: {}, survival benefit: {}",
            self.response_rate.as_deref().unwrap_or("N/A"),
            self.survival_benefit.as_deref().unwrap_or("N/A"),
        )
    }
}

// ---------------------------------------------------------------------------
// Patient snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CancerStage {
    I,
    #[default]
    II,
    III,
    IV,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KrasStatus {
    Mutant,
    #[serde(rename = "Wild-type", alias = "WildType")]
    WildType,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KrasProfile {
    #[serde(default)]
    pub status: KrasStatus,
    pub mutation_type: Option<String>,       // e.g. G12D
    pub allele_frequency: Option<f64>,       // %
    pub detection_method: Option<String>,    // NGS | PCR | IHC
}

impl KrasProfile {
    pub fn mutant(mutation_type: &str) -> Self {
        Self {
            status: KrasStatus::Mutant,
            mutation_type: Some(mutation_type.to_string()),
            ..Default::default()
        }
    }

    pub fn wild_type() -> Self {
        Self { status: KrasStatus::WildType, ..Default::default() }
    }

    /// Clinical reading of the KRAS result for the report.
    pub fn clinical_significance(&self) -> &'static str {
        match (self.status, self.mutation_type.as_deref()) {
            (KrasStatus::WildType, _) => "Anti-EGFR antibody therapy (cetuximab, panitumumab) may be effective",
            (KrasStatus::Mutant, Some("G12D" | "G12V")) => "Resistant to anti-EGFR antibodies; alternative therapy required",
            (KrasStatus::Mutant, Some("G12C")) => "Candidate for KRAS G12C inhibitors (sotorasib, adagrasib)",
            (KrasStatus::Mutant, _) => "Resistant to anti-EGFR antibodies",
            (KrasStatus::Unknown, _) => "KRAS testing required",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExpressionLevel {
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MolecularMarkers {
    #[serde(rename = "PrPc")]
    pub prpc: ExpressionLevel,
    #[serde(rename = "LRP_LR")]
    pub lrp_lr: ExpressionLevel,
    #[serde(rename = "EGFR")]
    pub egfr: ExpressionLevel,
    #[serde(rename = "c_MET")]
    pub c_met: ExpressionLevel,
    /// Phosphorylation ratio per signalling pathway, keyed `p_ERK`, `p_AKT`, ...
    pub phosphorylation: BTreeMap<String, f64>,
    pub emt_score: Option<f64>,              // 0–10
    pub msi_status: Option<String>,
    pub tmb: Option<f64>,                    // mutations/Mb
    pub pd_l1: Option<f64>,                  // % positive
}

impl MolecularMarkers {
    /// Ratio for one pathway; an unmeasured pathway reads as baseline 1.0.
    pub fn phosphorylation_ratio(&self, pathway: &str) -> f64 {
        self.phosphorylation.get(pathway).copied().unwrap_or(1.0)
    }

    pub fn marker_count(&self) -> usize {
        self.phosphorylation.len()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SizeDistribution {
    pub small: u32,
    pub medium: u32,
    pub large: u32,
}

/// Precomputed metrics from the image-analysis collaborator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CellularPhenotypeMetrics {
    pub total_cells: Option<u32>,
    pub avg_cell_area: Option<f64>,
    pub size_distribution: Option<SizeDistribution>,
    pub viability_rate: Option<f64>,         // %
    pub spheroid_diameter_um: Option<f64>,
    pub spheroid_compactness: Option<f64>,   // 0–1
    pub emt_reversal_degree: Option<f64>,    // %
}

/// A measured response for one drug set (dose-response experiment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinationResponse {
    pub drug_ids: Vec<String>,
    pub combined_efficacy: f64,              // 0–1
    /// Dose per drug id in μM; enables the Combination Index diagnostic.
    #[serde(default)]
    pub doses: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionalAssay {
    pub dose_response_synergy: Option<f64>,
    pub organoid_ic50: Option<f64>,          // PDO IC50
    pub animal_tgi: Option<f64>,             // % tumour growth inhibition
    pub combination_responses: Vec<CombinationResponse>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientContext {
    pub patient_id: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub cancer_type: Option<String>,
    pub cancer_stage: Option<CancerStage>,
    pub ecog_score: Option<u8>,
    pub kras: Option<KrasProfile>,
    pub markers: Option<MolecularMarkers>,
    pub cellular: Option<CellularPhenotypeMetrics>,
    pub functional: Option<FunctionalAssay>,
}

/// Patient covariates with defaults already applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Covariates {
    pub age: u32,
    pub stage: CancerStage,
}

impl PatientContext {
    pub fn builder() -> PatientContextBuilder {
        PatientContextBuilder::default()
    }

    pub fn covariates(&self) -> Covariates {
        Covariates {
            age: self.age.unwrap_or(DEFAULT_AGE),
            stage: self.cancer_stage.unwrap_or_default(),
        }
    }

    /// Measured response whose drug set equals `drug_ids`, if any.
    pub fn measured_response(&self, drug_ids: &[&str]) -> Option<&CombinationResponse> {
        let wanted: BTreeSet<&str> = drug_ids.iter().copied().collect();
        self.functional.as_ref()?.combination_responses.iter().find(|r| {
            r.drug_ids.iter().map(String::as_str).collect::<BTreeSet<_>>() == wanted
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PatientContextBuilder {
    inner: PatientContext,
}

impl PatientContextBuilder {
    pub fn patient_id(mut self, id: impl Into<String>) -> Self {
        self.inner.patient_id = Some(id.into());
        self
    }

    pub fn age(mut self, age: u32) -> Self {
        self.inner.age = Some(age);
        self
    }

    pub fn gender(mut self, gender: impl Into<String>) -> Self {
        self.inner.gender = Some(gender.into());
        self
    }

    pub fn cancer_type(mut self, cancer_type: impl Into<String>) -> Self {
        self.inner.cancer_type = Some(cancer_type.into());
        self
    }

    pub fn stage(mut self, stage: CancerStage) -> Self {
        self.inner.cancer_stage = Some(stage);
        self
    }

    pub fn ecog(mut self, ecog: u8) -> Self {
        self.inner.ecog_score = Some(ecog);
        self
    }

    pub fn kras(mut self, kras: KrasProfile) -> Self {
        self.inner.kras = Some(kras);
        self
    }

    pub fn markers(mut self, markers: MolecularMarkers) -> Self {
        self.inner.markers = Some(markers);
        self
    }

    pub fn cellular(mut self, cellular: CellularPhenotypeMetrics) -> Self {
        self.inner.cellular = Some(cellular);
        self
    }

    pub fn functional(mut self, functional: FunctionalAssay) -> Self {
        self.inner.functional = Some(functional);
        self
    }

    pub fn build(self) -> PatientContext {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_covariates_fill_defaults() {
        let p = PatientContext::default();
        let c = p.covariates();
        assert_eq!(c.age, DEFAULT_AGE);
        assert_eq!(c.stage, CancerStage::II);
    }

    #[test]
    fn test_kras_status_wire_names() {
        let k: KrasProfile = serde_json::from_str(r#"{"status":"Wild-type"}"#).unwrap();
        assert_eq!(k.status, KrasStatus::WildType);
        let k: KrasProfile = serde_json::from_str(r#"{"status":"Mutant","mutation_type":"G12D"}"#).unwrap();
        assert_eq!(k.status, KrasStatus::Mutant);
        assert_eq!(k.mutation_type.as_deref(), Some("G12D"));
    }

    #[test]
    fn test_kras_clinical_significance() {
        assert!(KrasProfile::wild_type().clinical_significance().starts_with("Anti-EGFR"));
        assert!(KrasProfile::mutant("G12C").clinical_significance().contains("G12C inhibitors"));
        assert_eq!(KrasProfile::default().clinical_significance(), "KRAS testing required");
    }

    #[test]
    fn test_partial_patient_json() {
        let p: PatientContext = serde_json::from_str(r#"{"age": 72, "cancer_stage": "IV"}"#).unwrap();
        assert_eq!(p.age, Some(72));
        assert_eq!(p.cancer_stage, Some(CancerStage::IV));
        assert!(p.kras.is_none());
        assert!(p.cellular.is_none());
    }

    #[test]
    fn test_unmeasured_pathway_is_baseline() {
        let m = MolecularMarkers::default();
        assert_eq!(m.phosphorylation_ratio("p_ERK"), 1.0);
        assert_eq!(m.marker_count(), 0);
    }

    #[test]
    fn test_measured_response_is_order_independent() {
        let p = PatientContext::builder()
            .functional(FunctionalAssay {
                combination_responses: vec![CombinationResponse {
                    drug_ids: vec!["a".into(), "b".into()],
                    combined_efficacy: 0.7,
                    doses: BTreeMap::new(),
                }],
                ..Default::default()
            })
            .build();
        assert!(p.measured_response(&["b", "a"]).is_some());
        assert!(p.measured_response(&["a"]).is_none());
    }

    #[test]
    fn test_applies_to_ignores_case() {
        let d = DrugRecord {
            id: "x".into(),
            name: "X".into(),
            category: "c".into(),
            mechanism: "m".into(),
            toxicity_score: 1.0,
            typical_ic50_range: (2.0, 4.0),
            applicable_cancer_types: vec!["Colorectal".into()],
            side_effects: vec![],
        };
        assert!(d.applies_to("colorectal"));
        assert!(!d.applies_to("Lung"));
        assert!((d.mean_ic50() - 3.0).abs() < 1e-12);
    }
}
