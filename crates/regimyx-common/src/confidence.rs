/// Confidence estimation for recommendations.
/// Two models: a general one driven by data completeness and reference
/// corpus size, and the PRS one driven by which assay domains are present.

use crate::entities::PatientContext;

/// Score in [0, 100] for how much reference data backs the estimates.
pub fn data_size_score(reference_corpus_size: usize) -> f64 {
    (reference_corpus_size as f64 / 5.0).min(100.0)
}

/// Completeness of the patient record in [0, 100].
///
/// Required fields (age, gender, cancer type, stage) share 50 points,
/// optional fields (ECOG, KRAS profile, cellular metrics) share the other 50.
/// A field counts when it is recorded, so ECOG 0 is present.
pub fn data_completeness(patient: &PatientContext) -> f64 {
    let required = [
        patient.age.is_some(),
        patient.gender.is_some(),
        patient.cancer_type.is_some(),
        patient.cancer_stage.is_some(),
    ];
    let optional = [
        patient.ecog_score.is_some(),
        patient.kras.is_some(),
        patient.cellular.is_some(),
    ];
    share_of_fifty(&required) + share_of_fifty(&optional)
}

fn share_of_fifty(present: &[bool]) -> f64 {
    if present.is_empty() {
        return 0.0;
    }
    let hits = present.iter().filter(|&&p| p).count() as f64;
    hits * 50.0 / present.len() as f64
}

/// General recommendation confidence on the 0–100 scale.
///
/// C = data_size×0.3 + completeness×0.3 + (overall×100)×0.4
pub fn recommendation_confidence(
    overall_score: f64,
    patient: &PatientContext,
    reference_corpus_size: usize,
) -> f64 {
    let rec_score = overall_score * 100.0;
    data_size_score(reference_corpus_size) * 0.3
        + data_completeness(patient) * 0.3
        + rec_score * 0.4
}

/// PRS prediction confidence in [0.5, 1.0].
pub fn prs_confidence(has_cellular: bool, has_functional: bool, marker_count: usize) -> f64 {
    let mut confidence = 0.5;

    if has_cellular {
        confidence += 0.2;
    }
    if has_functional {
        confidence += 0.2;
    }
    if marker_count >= 5 {
        confidence += 0.1;
    }

    // Cap at 1.0
    f64::min(confidence, 1.0)
}

/// Symmetric interval around a 0–100 score, widened as confidence drops.
pub fn confidence_interval(score: f64, confidence: f64) -> (f64, f64) {
    let margin = (1.0 - confidence) * 10.0;
    ((score - margin).max(0.0), (score + margin).min(100.0))
}
