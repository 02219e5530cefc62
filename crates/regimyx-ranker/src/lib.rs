//! regimyx-ranker — Drug-combination recommendation and scoring engine.
//!
//! Generates candidate regimens from a drug pool, scores efficacy, synergy
//! and toxicity, blends them under a named policy and ranks the result.

pub mod catalog;
pub mod generator;
pub mod matcher;
pub mod synergy;
pub mod efficacy;
pub mod toxicity;
pub mod scorer;
pub mod prs;
pub mod ranking;
pub mod pipeline;
pub mod analysis;

pub use analysis::CombinationAnalyzer;
pub use catalog::{DrugCatalog, KnownCombinationCatalog};
pub use pipeline::{RecommendationEngine, RecommendationRequest, RecommendationResult};
pub use prs::{PrsCalculator, PrsReport};
pub use scorer::{CompositePolicy, ScoreBreakdown};
