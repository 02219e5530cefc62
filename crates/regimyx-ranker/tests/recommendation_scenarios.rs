//! End-to-end recommendation runs over fixture and built-in catalogs.

use pretty_assertions::assert_eq;
use regimyx_common::entities::PatientContext;
use regimyx_common::{EngineConfig, EngineWarning, ScoringPolicy};
use regimyx_ranker::scorer::EvidenceSource;
use regimyx_ranker::{DrugCatalog, KnownCombinationCatalog, RecommendationEngine};
use regimyx_ranker::prs::{ResponseCategory, ToxicityRisk};
use regimyx_test_utils::{
    drug, fully_profiled_patient, g12d_patient, known_combination, patient_from_json, scenario_a_pool,
};

fn scenario_a_catalogs() -> (DrugCatalog, KnownCombinationCatalog) {
    (
        DrugCatalog::new(scenario_a_pool()).unwrap(),
        KnownCombinationCatalog::new(vec![known_combination(&["A", "B"], 0.82, 1.25)]).unwrap(),
    )
}

#[test]
fn scenario_a_all_pairs_scored_and_known_pair_curated() {
    let (drugs, known) = scenario_a_catalogs();
    let engine = RecommendationEngine::new(&drugs, &known, EngineConfig::default()).unwrap();
    let result = engine.recommend(&engine.request(PatientContext::default()).with_seed(17)).unwrap();

    let mut sets: Vec<Vec<String>> = result.recommendations.iter().map(|r| r.drug_ids.clone()).collect();
    sets.sort();
    assert_eq!(
        sets,
        vec![
            vec!["A".to_string(), "B".to_string()],
            vec!["A".to_string(), "C".to_string()],
            vec!["B".to_string(), "C".to_string()],
        ]
    );

    let curated: Vec<_> = result
        .recommendations
        .iter()
        .filter(|r| r.evidence_source == EvidenceSource::KnownCombination)
        .collect();
    assert_eq!(curated.len(), 1);
    assert_eq!(curated[0].efficacy_score, 0.82);
    assert_eq!(curated[0].synergy_score, 1.25);
}

#[test]
fn scenario_b_prs_from_molecular_data_only() {
    let (drugs, known) = scenario_a_catalogs();
    let engine = RecommendationEngine::new(&drugs, &known, EngineConfig::default()).unwrap();
    let request = engine.request(g12d_patient()).with_policy(ScoringPolicy::Prs).with_seed(1);
    let result = engine.recommend(&request).unwrap();

    let prs = result.prs.unwrap();
    assert_eq!(prs.score_breakdown.molecular_contribution, 22.0);
    assert_eq!(prs.score_breakdown.cellular_phenotype, 0.0);
    assert_eq!(prs.score_breakdown.functional_assay, 0.0);
    assert_eq!(prs.prediction_confidence, 0.5);
}

#[test]
fn scenario_c_toxicity_ceiling() {
    let drugs = DrugCatalog::new(vec![
        drug("x", "alkylating", 9.0, (1.0, 2.0)),
        drug("y", "anthracycline", 8.0, (1.0, 2.0)),
        drug("z", "platinum", 8.0, (1.0, 2.0)),
    ])
    .unwrap();
    let known = KnownCombinationCatalog::default();
    let engine = RecommendationEngine::new(&drugs, &known, EngineConfig::default()).unwrap();
    let request = engine
        .request(PatientContext::default())
        .with_combination_size(3)
        .with_seed(8);
    let result = engine.recommend(&request).unwrap();

    assert_eq!(result.recommendations.len(), 1);
    let only = &result.recommendations[0];
    assert_eq!(only.toxicity_score, 10.0);
    assert_eq!(only.overall_score, 0.0);
}

#[test]
fn same_seed_same_output() {
    let drugs = DrugCatalog::builtin();
    let known = KnownCombinationCatalog::builtin();
    let engine = RecommendationEngine::new(&drugs, &known, EngineConfig::default()).unwrap();
    let request = engine
        .request(fully_profiled_patient())
        .with_combination_size(3)
        .with_max_candidates(None)
        .with_top_n(10)
        .with_seed(2024);

    let first = engine.recommend(&request).unwrap();
    let second = engine.recommend(&request).unwrap();
    assert_eq!(first.recommendations, second.recommendations);
    assert_ne!(first.id, second.id);
}

#[test]
fn parallel_and_sequential_agree() {
    let drugs = DrugCatalog::builtin();
    let known = KnownCombinationCatalog::builtin();

    let mut sequential = EngineConfig::default();
    sequential.execution.parallel = false;
    let mut parallel = EngineConfig::default();
    parallel.execution.parallel = true;
    parallel.execution.parallel_threshold = 1;

    let seq_engine = RecommendationEngine::new(&drugs, &known, sequential).unwrap();
    let par_engine = RecommendationEngine::new(&drugs, &known, parallel).unwrap();
    let request = seq_engine
        .request(g12d_patient())
        .with_combination_size(3)
        .with_max_candidates(None)
        .with_top_n(35)
        .with_seed(99);

    let a = seq_engine.recommend(&request).unwrap();
    let b = par_engine.recommend(&request).unwrap();
    assert_eq!(a.candidates_evaluated, 35);
    assert_eq!(a.recommendations, b.recommendations);
}

#[test]
fn colorectal_triples_pruned_to_cap() {
    let drugs = DrugCatalog::builtin();
    let known = KnownCombinationCatalog::builtin();
    let engine = RecommendationEngine::new(&drugs, &known, EngineConfig::default()).unwrap();
    let request = engine.request(g12d_patient()).with_combination_size(3).with_seed(5);
    let result = engine.recommend(&request).unwrap();

    assert_eq!(result.candidates_evaluated, 20);
    assert_eq!(result.recommendations.len(), 5);
    let ranks: Vec<usize> = result.recommendations.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
}

#[test]
fn small_pool_reduces_size_with_warning() {
    let drugs = DrugCatalog::new(scenario_a_pool().into_iter().take(2).collect()).unwrap();
    let known = KnownCombinationCatalog::default();
    let engine = RecommendationEngine::new(&drugs, &known, EngineConfig::default()).unwrap();
    let request = engine
        .request(PatientContext::default())
        .with_combination_size(3)
        .with_seed(3);
    let result = engine.recommend(&request).unwrap();

    assert_eq!(result.combination_size, 2);
    assert_eq!(
        result.warnings,
        vec![EngineWarning::CombinationSizeReduced { requested: 3, effective: 2 }]
    );
}

#[test]
fn weighted_additive_policy_applies_weights() {
    let (drugs, known) = scenario_a_catalogs();
    let mut config = EngineConfig::default();
    config.scoring.policy = ScoringPolicy::WeightedAdditive;
    let engine = RecommendationEngine::new(&drugs, &known, config).unwrap();
    let result = engine.recommend(&engine.request(PatientContext::default()).with_seed(6)).unwrap();

    assert_eq!(result.policy, ScoringPolicy::WeightedAdditive);
    let ab = result.recommendations.iter().find(|r| r.evidence_source == EvidenceSource::KnownCombination).unwrap();
    let expected = 0.82 * 0.5 + 1.25 * 0.3 - 0.675 * 0.2;
    assert!((ab.overall_score - expected).abs() < 1e-9);
}

#[test]
fn demo_patient_record_runs_end_to_end() {
    let patient = patient_from_json(include_str!("../../../demos/patient_g12d.json"));
    let drugs = DrugCatalog::builtin();
    let known = KnownCombinationCatalog::builtin();
    let engine = RecommendationEngine::new(&drugs, &known, EngineConfig::default()).unwrap();
    let request = engine.request(patient).with_policy(ScoringPolicy::Prs).with_seed(11);
    let result = engine.recommend(&request).unwrap();

    let prs = result.prs.as_ref().unwrap();
    // molecular 15 + 5 + 3 + 4, cellular 12 + 10 + 10
    assert_eq!(prs.score_breakdown.molecular_contribution, 27.0);
    assert_eq!(prs.score_breakdown.cellular_phenotype, 32.0);
    assert_eq!(prs.prs_score, 59.0);
    assert_eq!(prs.interpretation.response_category, ResponseCategory::Good);
    assert_eq!(prs.interpretation.toxicity_risk, ToxicityRisk::LowModerate);
    assert_eq!(result.patient_ref.as_deref(), Some("PT-0001"));
    assert_eq!(result.top().map(|r| r.rank), Some(1));
}
