//! regimyx-common — Shared types, errors, and configuration used across all Regimyx crates.

pub mod error;
pub mod entities;
pub mod confidence;
pub mod engine_config;

// Re-export commonly used types
pub use engine_config::{EngineConfig, ScoringConfig, ScoringPolicy, SynergyMethod, AdditiveWeights};
pub use error::{EngineWarning, RegimyxError, Result};
