//! Fixtures shared by the Regimyx test suites.

use std::collections::BTreeMap;

use regimyx_common::entities::{
    CancerStage, CellularPhenotypeMetrics, DrugRecord, ExpressionLevel, FunctionalAssay,
    KnownCombination, KrasProfile, MolecularMarkers, PatientContext,
};

/// Minimal drug record. Name mirrors the id, applicable to colorectal cancer.
pub fn drug(id: &str, category: &str, toxicity: f64, ic50: (f64, f64)) -> DrugRecord {
    DrugRecord {
        id: id.to_string(),
        name: id.to_string(),
        category: category.to_string(),
        mechanism: format!("{category} mechanism"),
        toxicity_score: toxicity,
        typical_ic50_range: ic50,
        applicable_cancer_types: vec!["Colorectal".to_string()],
        side_effects: Vec::new(),
    }
}

/// Pool {A(3.5), B(4.0), C(4.5)}, one drug per category.
pub fn scenario_a_pool() -> Vec<DrugRecord> {
    vec![
        drug("A", "antimetabolite", 3.5, (1.0, 5.0)),
        drug("B", "platinum", 4.0, (2.0, 8.0)),
        drug("C", "targeted", 4.5, (0.5, 2.5)),
    ]
}

pub fn known_combination(ids: &[&str], efficacy: f64, synergy: f64) -> KnownCombination {
    KnownCombination {
        drug_ids: ids.iter().map(|s| s.to_string()).collect(),
        display_name: ids.join(" + "),
        synergy_score: synergy,
        clinical_efficacy: efficacy,
        evidence_level: "1A".to_string(),
        references: vec!["Fixture et al.".to_string()],
        response_rate: None,
        survival_benefit: None,
    }
}

/// Colorectal patient with only KRAS G12D recorded beyond demographics.
pub fn g12d_patient() -> PatientContext {
    PatientContext::builder()
        .patient_id("PT-0001")
        .age(62)
        .gender("M")
        .cancer_type("Colorectal")
        .stage(CancerStage::III)
        .kras(KrasProfile::mutant("G12D"))
        .build()
}

pub fn high_expression_markers() -> MolecularMarkers {
    MolecularMarkers {
        prpc: ExpressionLevel::High,
        lrp_lr: ExpressionLevel::High,
        phosphorylation: BTreeMap::from([
            ("p_ERK".to_string(), 1.4),
            ("p_AKT".to_string(), 1.2),
            ("p_FAK".to_string(), 1.1),
            ("p_STAT3".to_string(), 0.9),
            ("p_mTOR".to_string(), 1.0),
        ]),
        ..Default::default()
    }
}

pub fn favourable_cellular() -> CellularPhenotypeMetrics {
    CellularPhenotypeMetrics {
        total_cells: Some(1250),
        viability_rate: Some(85.0),
        spheroid_diameter_um: Some(420.0),
        spheroid_compactness: Some(0.85),
        emt_reversal_degree: Some(45.0),
        ..Default::default()
    }
}

pub fn favourable_functional() -> FunctionalAssay {
    FunctionalAssay {
        dose_response_synergy: Some(1.35),
        organoid_ic50: Some(25.0),
        animal_tgi: Some(65.0),
        combination_responses: Vec::new(),
    }
}

/// G12D patient with every assay domain populated at the top band.
pub fn fully_profiled_patient() -> PatientContext {
    PatientContext {
        markers: Some(high_expression_markers()),
        cellular: Some(favourable_cellular()),
        functional: Some(favourable_functional()),
        ecog_score: Some(0),
        ..g12d_patient()
    }
}

/// Patient record parsed from JSON, for wire-format tests.
pub fn patient_from_json(json: &str) -> PatientContext {
    serde_json::from_str(json).expect("fixture patient JSON must parse")
}
