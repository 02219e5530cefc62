//! Orchestrator for one recommendation run.
//!
//! pool → generator → {matcher, efficacy, synergy, toxicity} → policy
//! (+ confidence) → ranker

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use regimyx_common::confidence::recommendation_confidence;
use regimyx_common::entities::{Covariates, PatientContext};
use regimyx_common::{
    EngineConfig, EngineWarning, RegimyxError, Result, ScoringConfig, ScoringPolicy, SynergyMethod,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::{DrugCatalog, KnownCombinationCatalog};
use crate::efficacy::estimate_efficacy;
use crate::generator::{generate_combinations, CombinationCandidate};
use crate::matcher::KnownCombinationMatcher;
use crate::prs::{PrsCalculator, PrsReport};
use crate::ranking::rank_and_truncate;
use crate::scorer::{build_policy, ComponentScores, CompositePolicy, EvidenceSource, ScoreBreakdown};
use crate::synergy::{estimate_synergy, CiClass, SynergyEstimate, SynergySource};
use crate::toxicity::aggregate_toxicity;

/// Caller-owned parameters of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub patient: PatientContext,
    pub policy: ScoringPolicy,
    pub combination_size: usize,
    pub top_n: usize,
    pub max_candidates: Option<usize>,
    /// `None` draws from the thread RNG; results then vary run to run.
    pub seed: Option<u64>,
}

impl RecommendationRequest {
    /// Request with every knob taken from the scoring configuration.
    pub fn new(patient: PatientContext, scoring: &ScoringConfig) -> Self {
        Self {
            patient,
            policy: scoring.policy,
            combination_size: scoring.combination_size,
            top_n: scoring.top_n,
            max_candidates: scoring.max_candidates,
            seed: scoring.seed,
        }
    }

    pub fn with_policy(mut self, policy: ScoringPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_combination_size(mut self, n: usize) -> Self {
        self.combination_size = n;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_max_candidates(mut self, cap: Option<usize>) -> Self {
        self.max_candidates = cap;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub id: Uuid,
    pub patient_ref: Option<String>,
    pub policy: ScoringPolicy,
    pub generated_at: DateTime<Utc>,
    /// Size actually used, after any pool-size reduction
    pub combination_size: usize,
    /// Candidates scored before truncation
    pub candidates_evaluated: usize,
    pub recommendations: Vec<ScoreBreakdown>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prs: Option<PrsReport>,
    #[serde(default)]
    pub warnings: Vec<EngineWarning>,
}

impl RecommendationResult {
    pub fn new(patient_ref: Option<String>, policy: ScoringPolicy, combination_size: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_ref,
            policy,
            generated_at: Utc::now(),
            combination_size,
            candidates_evaluated: 0,
            recommendations: Vec::new(),
            prs: None,
            warnings: Vec::new(),
        }
    }

    pub fn top(&self) -> Option<&ScoreBreakdown> {
        self.recommendations.first()
    }
}

/// Per-run inputs shared by every candidate.
struct ScoringContext<'r> {
    patient: &'r PatientContext,
    covariates: Covariates,
    policy: &'r dyn CompositePolicy,
    synergy_method: SynergyMethod,
    /// Replaces the general confidence model under the prs policy
    prs_confidence: Option<f64>,
}

struct CandidateOutcome {
    breakdown: Option<ScoreBreakdown>,
    warnings: Vec<EngineWarning>,
}

pub struct RecommendationEngine<'a> {
    drugs: &'a DrugCatalog,
    matcher: KnownCombinationMatcher<'a>,
    config: EngineConfig,
}

impl<'a> RecommendationEngine<'a> {
    pub fn new(
        drugs: &'a DrugCatalog,
        known: &'a KnownCombinationCatalog,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        for set in known.duplicate_sets() {
            warn!("Data integrity: curated catalog lists drug set {:?} more than once", set);
        }
        Ok(Self { drugs, matcher: KnownCombinationMatcher::new(known), config })
    }

    /// Request for `patient` using the engine's configured defaults.
    pub fn request(&self, patient: PatientContext) -> RecommendationRequest {
        RecommendationRequest::new(patient, &self.config.scoring)
    }

    /// Run with the request's seed, or the thread RNG when unseeded.
    pub fn recommend(&self, request: &RecommendationRequest) -> Result<RecommendationResult> {
        match request.seed {
            Some(seed) => self.recommend_with_rng(request, &mut ChaCha8Rng::seed_from_u64(seed)),
            None => self.recommend_with_rng(request, &mut rand::thread_rng()),
        }
    }

    /// Run with a caller-supplied RNG. The request's own seed is ignored.
    pub fn recommend_with_rng<R: Rng + ?Sized>(
        &self,
        request: &RecommendationRequest,
        rng: &mut R,
    ) -> Result<RecommendationResult> {
        if request.top_n == 0 {
            return Err(RegimyxError::Input("top_n must be at least 1".to_string()));
        }
        if request.max_candidates == Some(0) {
            return Err(RegimyxError::Input("max_candidates must be at least 1".to_string()));
        }
        let patient = &request.patient;
        info!(
            "Recommending {}-drug combinations for {} (policy {})",
            request.combination_size,
            patient.patient_id.as_deref().unwrap_or("anonymous patient"),
            request.policy
        );

        let prs_scores = match request.policy {
            ScoringPolicy::Prs => Some(PrsCalculator::new().scores(patient)?),
            _ => None,
        };
        let policy = build_policy(
            request.policy,
            &self.config.scoring.additive_weights,
            prs_scores.map(|s| s.total()),
        )?;

        let pool = self.drugs.pool_for(patient.cancer_type.as_deref());
        debug!("Pool of {} drugs for cancer type {:?}", pool.len(), patient.cancer_type);
        let generated = generate_combinations(&pool, request.combination_size, request.max_candidates)?;

        let mut result = RecommendationResult::new(
            patient.patient_id.clone(),
            request.policy,
            generated.effective_size,
        );
        result.warnings.extend(generated.warnings);

        // Seeds are drawn up front so parallel and sequential runs agree.
        let seeds: Vec<u64> = (0..generated.candidates.len()).map(|_| rng.gen()).collect();
        let ctx = ScoringContext {
            patient,
            covariates: patient.covariates(),
            policy: policy.as_ref(),
            synergy_method: self.config.scoring.synergy_method,
            prs_confidence: prs_scores.map(|s| s.confidence),
        };

        let exec = &self.config.execution;
        let outcomes: Vec<CandidateOutcome> =
            if exec.parallel && generated.candidates.len() >= exec.parallel_threshold {
                debug!("Scoring {} candidates in parallel", generated.candidates.len());
                generated
                    .candidates
                    .par_iter()
                    .zip(seeds.par_iter())
                    .map(|(candidate, &seed)| self.score_candidate(candidate, seed, &ctx))
                    .collect()
            } else {
                generated
                    .candidates
                    .iter()
                    .zip(&seeds)
                    .map(|(candidate, &seed)| self.score_candidate(candidate, seed, &ctx))
                    .collect()
            };

        let mut scored = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            result.warnings.extend(outcome.warnings);
            scored.extend(outcome.breakdown);
        }
        result.candidates_evaluated = scored.len();
        result.recommendations = rank_and_truncate(scored, request.top_n);
        result.prs = prs_scores.map(|scores| PrsCalculator::new().report(patient, &scores));

        info!(
            "{} recommendations from {} candidates ({} warnings)",
            result.recommendations.len(),
            result.candidates_evaluated,
            result.warnings.len()
        );
        Ok(result)
    }

    fn score_candidate(
        &self,
        candidate: &CombinationCandidate<'_>,
        seed: u64,
        ctx: &ScoringContext<'_>,
    ) -> CandidateOutcome {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let ids = candidate.drug_ids();
        let mut warnings = Vec::new();

        let known = self.matcher.find(&ids);
        warnings.extend(known.and_then(|m| m.integrity_warning()));
        let record = known.map(|m| m.record);
        let measured = match record {
            Some(_) => None,
            None => ctx.patient.measured_response(&ids),
        };

        let efficacy = estimate_efficacy(&candidate.members, record, ctx.covariates);
        let synergy = estimate_synergy(&candidate.members, record, measured, ctx.synergy_method, &mut rng);
        let toxicity = aggregate_toxicity(&candidate.members, ctx.covariates);
        let components = ComponentScores {
            efficacy: efficacy.value,
            synergy: synergy.score,
            toxicity,
        };
        let overall = ctx.policy.overall(&components);

        if let Some(reason) = non_finite_reason(&components, overall) {
            warn!("Dropping candidate {:?}: {}", ids, reason);
            warnings.push(EngineWarning::CandidateDropped {
                drug_ids: ids.iter().map(|s| s.to_string()).collect(),
                reason,
            });
            return CandidateOutcome { breakdown: None, warnings };
        }

        let confidence = match ctx.prs_confidence {
            Some(c) => c,
            None => {
                let general = recommendation_confidence(
                    overall,
                    ctx.patient,
                    self.config.confidence.reference_corpus_size,
                );
                (general / 100.0).clamp(0.0, 1.0)
            }
        };

        let drugs = candidate.drug_names();
        let (evidence_source, combination_name, evidence_level, references, notes) = match record {
            Some(r) => (
                EvidenceSource::KnownCombination,
                r.display_name.clone(),
                r.evidence_level.clone(),
                r.references.clone(),
                r.notes(),
            ),
            None if synergy.source == SynergySource::Measured => (
                EvidenceSource::MeasuredResponse,
                drugs.join(" + "),
                "Functional assay".to_string(),
                vec!["Patient dose-response experiment".to_string()],
                measured_notes(&synergy, measured.map(|m| m.combined_efficacy), ctx.synergy_method),
            ),
            None => (
                EvidenceSource::ModelEstimate,
                drugs.join(" + "),
                "Model".to_string(),
                vec!["IC50-based estimation model".to_string()],
                "Personalised estimate".to_string(),
            ),
        };

        CandidateOutcome {
            breakdown: Some(ScoreBreakdown {
                rank: 0,
                drugs,
                drug_ids: ids.iter().map(|s| s.to_string()).collect(),
                combination_name,
                efficacy_score: components.efficacy,
                synergy_score: components.synergy,
                toxicity_score: components.toxicity,
                overall_score: overall,
                evidence_source,
                evidence_level,
                references,
                notes,
                confidence: Some(confidence),
            }),
            warnings,
        }
    }
}

fn non_finite_reason(c: &ComponentScores, overall: f64) -> Option<String> {
    let fields = [
        ("efficacy", c.efficacy),
        ("synergy", c.synergy),
        ("toxicity", c.toxicity),
        ("overall", overall),
    ];
    fields
        .iter()
        .find(|(_, v)| !v.is_finite())
        .map(|(name, v)| format!("non-finite {name} score ({v})"))
}

fn measured_notes(synergy: &SynergyEstimate, observed: Option<f64>, method: SynergyMethod) -> String {
    let model = match method {
        SynergyMethod::Bliss => "Bliss",
        SynergyMethod::Loewe => "Loewe",
    };
    let mut notes = format!(
        "Measured combined efficacy {:.2}; {} synergy {:.2}",
        observed.unwrap_or(0.0),
        model,
        synergy.score
    );
    if let Some(ci) = synergy.combination_index {
        notes.push_str(&format!("; CI {:.2} ({})", ci, CiClass::from_ci(ci).as_str()));
    }
    notes
}
