//! Composite scoring policies and the per-candidate score record.
//!
//! ranking_multiplicative: S = e × s × (1 − t/10)
//! weighted_additive:      S = e×w_e + s×w_s − (t/10)×w_t
//! prs:                    S = ranking_multiplicative × PRS/100

use regimyx_common::{AdditiveWeights, RegimyxError, Result, ScoringPolicy};
use serde::{Deserialize, Serialize};

use crate::toxicity::MAX_TOXICITY;

/// Component scores of one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub efficacy: f64,   // 0–1
    pub synergy: f64,    // ratio, 1.0 = no interaction
    pub toxicity: f64,   // 0–10
}

impl ComponentScores {
    /// Toxicity mapped onto [0, 1].
    pub fn toxicity_fraction(&self) -> f64 {
        self.toxicity / MAX_TOXICITY
    }
}

/// A named way of blending component scores into one overall score.
pub trait CompositePolicy: Send + Sync {
    fn policy(&self) -> ScoringPolicy;
    fn overall(&self, scores: &ComponentScores) -> f64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RankingMultiplicative;

impl CompositePolicy for RankingMultiplicative {
    fn policy(&self) -> ScoringPolicy {
        ScoringPolicy::RankingMultiplicative
    }

    fn overall(&self, s: &ComponentScores) -> f64 {
        s.efficacy * s.synergy * (1.0 - s.toxicity_fraction())
    }
}

#[derive(Debug, Clone, Default)]
pub struct WeightedAdditive {
    pub weights: AdditiveWeights,
}

impl CompositePolicy for WeightedAdditive {
    fn policy(&self) -> ScoringPolicy {
        ScoringPolicy::WeightedAdditive
    }

    fn overall(&self, s: &ComponentScores) -> f64 {
        let w = &self.weights;
        s.efficacy * w.efficacy + s.synergy * w.synergy - s.toxicity_fraction() * w.toxicity
    }
}

/// Multiplicative score scaled by the patient's Response Score.
#[derive(Debug, Clone, Copy)]
pub struct PrsWeighted {
    /// PRS total in [0, 100]
    pub prs_total: f64,
}

impl CompositePolicy for PrsWeighted {
    fn policy(&self) -> ScoringPolicy {
        ScoringPolicy::Prs
    }

    fn overall(&self, s: &ComponentScores) -> f64 {
        RankingMultiplicative.overall(s) * self.prs_total / 100.0
    }
}

/// Build the policy object for a run. `prs_total` is required for `prs`.
pub fn build_policy(
    policy: ScoringPolicy,
    weights: &AdditiveWeights,
    prs_total: Option<f64>,
) -> Result<Box<dyn CompositePolicy>> {
    match policy {
        ScoringPolicy::RankingMultiplicative => Ok(Box::new(RankingMultiplicative)),
        ScoringPolicy::WeightedAdditive => {
            if !weights.validate() {
                return Err(RegimyxError::Config(
                    "additive weights must be non-negative and sum to 1.0".to_string(),
                ));
            }
            Ok(Box::new(WeightedAdditive { weights: weights.clone() }))
        }
        ScoringPolicy::Prs => {
            let prs_total = prs_total.ok_or_else(|| {
                RegimyxError::Input("prs policy requires a computed Response Score".to_string())
            })?;
            Ok(Box::new(PrsWeighted { prs_total }))
        }
    }
}

/// Where a recommendation's numbers came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    /// Curated literature / clinical-trial record
    KnownCombination,
    /// Patient's own dose-response experiment
    MeasuredResponse,
    /// IC50 and category heuristics
    ModelEstimate,
}

/// One scored recommendation, flat for JSON export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub rank: usize,
    pub drugs: Vec<String>,
    pub drug_ids: Vec<String>,
    pub combination_name: String,
    pub efficacy_score: f64,
    pub synergy_score: f64,
    pub toxicity_score: f64,
    pub overall_score: f64,
    pub evidence_source: EvidenceSource,
    pub evidence_level: String,
    pub references: Vec<String>,
    pub notes: String,
    /// Fraction in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl ScoreBreakdown {
    pub fn components(&self) -> ComponentScores {
        ComponentScores {
            efficacy: self.efficacy_score,
            synergy: self.synergy_score,
            toxicity: self.toxicity_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(e: f64, s: f64, t: f64) -> ComponentScores {
        ComponentScores { efficacy: e, synergy: s, toxicity: t }
    }

    #[test]
    fn test_multiplicative_formula() {
        let c = scores(0.82, 1.25, 6.75);
        assert!((RankingMultiplicative.overall(&c) - 0.82 * 1.25 * 0.325).abs() < 1e-12);
    }

    #[test]
    fn test_multiplicative_never_exceeds_efficacy_times_synergy() {
        for t in [0.0, 2.5, 5.0, 10.0] {
            let c = scores(0.7, 1.3, t);
            assert!(RankingMultiplicative.overall(&c) <= 0.7 * 1.3 + 1e-12);
        }
        assert_eq!(RankingMultiplicative.overall(&scores(0.9, 1.4, 10.0)), 0.0);
    }

    #[test]
    fn test_weighted_additive_default_weights() {
        let policy = WeightedAdditive::default();
        // 0.8×0.5 + 1.2×0.3 − 0.5×0.2 = 0.66
        assert!((policy.overall(&scores(0.8, 1.2, 5.0)) - 0.66).abs() < 1e-12);
        assert_eq!(policy.policy(), ScoringPolicy::WeightedAdditive);
    }

    #[test]
    fn test_prs_scales_multiplicative() {
        let c = scores(0.8, 1.0, 0.0);
        assert!((PrsWeighted { prs_total: 50.0 }.overall(&c) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_build_policy() {
        let w = AdditiveWeights::default();
        assert_eq!(
            build_policy(ScoringPolicy::RankingMultiplicative, &w, None).unwrap().policy(),
            ScoringPolicy::RankingMultiplicative
        );
        assert!(matches!(
            build_policy(ScoringPolicy::Prs, &w, None),
            Err(RegimyxError::Input(_))
        ));
        let bad = AdditiveWeights { efficacy: 0.9, synergy: 0.9, toxicity: 0.9 };
        assert!(matches!(
            build_policy(ScoringPolicy::WeightedAdditive, &bad, None),
            Err(RegimyxError::Config(_))
        ));
    }

    #[test]
    fn test_breakdown_serializes_flat() {
        let b = ScoreBreakdown {
            rank: 1,
            drugs: vec!["5-Fluorouracil".into(), "Oxaliplatin".into()],
            drug_ids: vec!["5fu".into(), "oxaliplatin".into()],
            combination_name: "FOLFOX".into(),
            efficacy_score: 0.82,
            synergy_score: 1.25,
            toxicity_score: 6.75,
            overall_score: 0.333,
            evidence_source: EvidenceSource::KnownCombination,
            evidence_level: "1A".into(),
            references: vec!["MOSAIC Trial".into()],
            notes: String::new(),
            confidence: None,
        };
        let v = serde_json::to_value(&b).unwrap();
        assert_eq!(v["evidence_source"], "known_combination");
        assert_eq!(v["combination_name"], "FOLFOX");
        assert!(v.get("confidence").is_none());
        assert_eq!(b.components().synergy, 1.25);
    }
}
