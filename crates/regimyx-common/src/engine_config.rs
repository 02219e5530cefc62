//! Engine configuration for recommendation runs.
//!
//! Loaded from YAML/JSON or embedded in the agent's TOML file. Every field
//! has a default so a partial file (or none at all) yields a working engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{RegimyxError, Result};

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Policy, sizes and model choices
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Threading options
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// General confidence model inputs
    #[serde(default)]
    pub confidence: ConfidenceConfig,

    /// Reference data locations
    #[serde(default)]
    pub catalogs: CatalogConfig,
}

// ── Policies ─────────────────────────────────────────────────────────────────

/// Named composite scoring policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    #[default]
    RankingMultiplicative,
    WeightedAdditive,
    Prs,
}

impl ScoringPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringPolicy::RankingMultiplicative => "ranking_multiplicative",
            ScoringPolicy::WeightedAdditive => "weighted_additive",
            ScoringPolicy::Prs => "prs",
        }
    }
}

impl fmt::Display for ScoringPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringPolicy {
    type Err = RegimyxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ranking_multiplicative" => Ok(ScoringPolicy::RankingMultiplicative),
            "weighted_additive" => Ok(ScoringPolicy::WeightedAdditive),
            "prs" => Ok(ScoringPolicy::Prs),
            other => Err(RegimyxError::Input(format!("unknown scoring policy: {other}"))),
        }
    }
}

/// Interaction model used when a measured combination response is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynergyMethod {
    #[default]
    Bliss,
    Loewe,
}

// ── Scoring Configuration ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub policy: ScoringPolicy,

    /// Drugs per combination (1–3)
    #[serde(default = "default_combination_size")]
    pub combination_size: usize,

    /// Number of recommendations returned
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Candidate cap before toxicity pruning; `None` disables pruning
    #[serde(default = "default_max_candidates")]
    pub max_candidates: Option<usize>,

    /// Seed for heuristic fallbacks; unseeded runs are nondeterministic
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub synergy_method: SynergyMethod,

    #[serde(default)]
    pub additive_weights: AdditiveWeights,
}

fn default_combination_size() -> usize { 2 }
fn default_top_n() -> usize { 5 }
fn default_max_candidates() -> Option<usize> { Some(20) }

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            policy: ScoringPolicy::default(),
            combination_size: default_combination_size(),
            top_n: default_top_n(),
            max_candidates: default_max_candidates(),
            seed: None,
            synergy_method: SynergyMethod::default(),
            additive_weights: AdditiveWeights::default(),
        }
    }
}

/// Weights of the weighted-additive policy.
/// overall = efficacy×w_e + synergy×w_s − (toxicity/10)×w_t
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditiveWeights {
    #[serde(default = "default_efficacy_weight")]
    pub efficacy: f64,
    #[serde(default = "default_synergy_weight")]
    pub synergy: f64,
    #[serde(default = "default_toxicity_weight")]
    pub toxicity: f64,
}

fn default_efficacy_weight() -> f64 { 0.5 }
fn default_synergy_weight() -> f64 { 0.3 }
fn default_toxicity_weight() -> f64 { 0.2 }

impl Default for AdditiveWeights {
    fn default() -> Self {
        Self {
            efficacy: default_efficacy_weight(),
            synergy: default_synergy_weight(),
            toxicity: default_toxicity_weight(),
        }
    }
}

impl AdditiveWeights {
    /// Validate that all weights are non-negative and sum to ~1.0
    pub fn validate(&self) -> bool {
        let all_positive = self.efficacy >= 0.0 && self.synergy >= 0.0 && self.toxicity >= 0.0;
        all_positive && (self.efficacy + self.synergy + self.toxicity - 1.0).abs() < 1e-6
    }

    /// Renormalise weights so they sum to 1.0
    pub fn normalise(&mut self) {
        let sum = self.efficacy + self.synergy + self.toxicity;
        if sum > 0.0 {
            self.efficacy /= sum;
            self.synergy  /= sum;
            self.toxicity /= sum;
        }
    }
}

// ── Execution Configuration ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Score candidates on the rayon pool
    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Minimum candidate count before going parallel
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

fn default_true() -> bool { true }
fn default_parallel_threshold() -> usize { 64 }

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

// ── Confidence / Catalogs ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfidenceConfig {
    /// Number of reference records backing the estimates
    #[serde(default)]
    pub reference_corpus_size: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON/YAML file of drug records; built-in catalog when absent
    pub drugs_path: Option<String>,

    /// JSON/YAML file of curated combinations; built-in catalog when absent
    pub combinations_path: Option<String>,
}

// ── Helper Methods ─────────────────────────────────────────────────────────────

impl EngineConfig {
    /// Standalone engine file, YAML for `.yaml`/`.yml` and JSON otherwise.
    /// The loaded settings are validated before they are returned.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => serde_yaml::from_str(&content)?,
            _ => serde_json::from_str(&content)?,
        };
        config.validate()?;
        tracing::debug!("engine config loaded from {}", path.display());
        Ok(config)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let s = &self.scoring;
        if !(1..=3).contains(&s.combination_size) {
            return Err(RegimyxError::Config(format!(
                "combination_size must be 1, 2 or 3 (got {})",
                s.combination_size
            )));
        }
        if s.top_n == 0 {
            return Err(RegimyxError::Config("top_n must be at least 1".to_string()));
        }
        if s.max_candidates == Some(0) {
            return Err(RegimyxError::Config("max_candidates must be at least 1".to_string()));
        }
        if !s.additive_weights.validate() {
            return Err(RegimyxError::Config(
                "additive weights must be non-negative and sum to 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.scoring.policy, ScoringPolicy::RankingMultiplicative);
        assert_eq!(config.scoring.combination_size, 2);
        assert_eq!(config.scoring.top_n, 5);
        assert_eq!(config.scoring.max_candidates, Some(20));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_additive_weights_sum_to_one() {
        assert!(AdditiveWeights::default().validate());
    }

    #[test]
    fn test_normalise_restores_sum() {
        let mut w = AdditiveWeights { efficacy: 1.0, synergy: 0.6, toxicity: 0.4 };
        assert!(!w.validate());
        w.normalise();
        assert!(w.validate());
        assert!((w.efficacy - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("prs".parse::<ScoringPolicy>().unwrap(), ScoringPolicy::Prs);
        assert_eq!(
            "Weighted_Additive".parse::<ScoringPolicy>().unwrap(),
            ScoringPolicy::WeightedAdditive
        );
        assert!("random".parse::<ScoringPolicy>().is_err());
    }

    #[test]
    fn test_invalid_combination_size_rejected() {
        let mut config = EngineConfig::default();
        config.scoring.combination_size = 4;
        assert!(matches!(config.validate(), Err(RegimyxError::Config(_))));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "scoring:\n  policy: weighted_additive\n  seed: 7\n";
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.scoring.policy, ScoringPolicy::WeightedAdditive);
        assert_eq!(config.scoring.seed, Some(7));
        assert_eq!(config.scoring.top_n, 5);
        assert!(config.execution.parallel);
    }

    #[test]
    fn test_from_path_by_extension() {
        let dir = std::env::temp_dir();
        let yaml = dir.join(format!("regimyx-engine-{}.yaml", std::process::id()));
        let json = dir.join(format!("regimyx-engine-{}.json", std::process::id()));
        std::fs::write(&yaml, "scoring:\n  combination_size: 3\n").unwrap();
        std::fs::write(&json, r#"{"scoring": {"policy": "prs"}}"#).unwrap();

        let from_yaml = EngineConfig::from_path(&yaml);
        let from_json = EngineConfig::from_path(&json);
        std::fs::remove_file(&yaml).unwrap();
        std::fs::remove_file(&json).unwrap();

        assert_eq!(from_yaml.unwrap().scoring.combination_size, 3);
        assert_eq!(from_json.unwrap().scoring.policy, ScoringPolicy::Prs);
    }

    #[test]
    fn test_from_path_rejects_invalid_settings() {
        let path = std::env::temp_dir().join(format!("regimyx-engine-bad-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"scoring": {"top_n": 0}}"#).unwrap();
        let result = EngineConfig::from_path(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(RegimyxError::Config(_))));
        assert!(matches!(EngineConfig::from_path("/nonexistent/engine.yaml"), Err(RegimyxError::Io(_))));
    }
}
