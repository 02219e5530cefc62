//! Regimyx — drug-combination recommendation engine.
//! Entry point for the command-line binary.

mod config;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use regimyx_common::entities::PatientContext;
use regimyx_common::{EngineConfig, ScoringPolicy};
use regimyx_ranker::{
    CombinationAnalyzer, DrugCatalog, KnownCombinationCatalog, PrsCalculator, RecommendationEngine,
};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "regimyx", version, about = "Drug-combination recommendation engine")]
struct Cli {
    /// Standalone engine settings (YAML or JSON), replacing the [engine] section
    #[arg(long, global = true)]
    engine_config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank drug combinations for a patient record
    Recommend {
        /// Patient record (JSON)
        patient: PathBuf,

        /// ranking_multiplicative, weighted_additive or prs
        #[arg(long, value_parser = ScoringPolicy::from_str)]
        policy: Option<ScoringPolicy>,

        /// Drugs per combination
        #[arg(long)]
        size: Option<usize>,

        /// Recommendations to keep
        #[arg(long)]
        top: Option<usize>,

        /// Candidate cap before scoring
        #[arg(long)]
        max_candidates: Option<usize>,

        /// RNG seed for heuristic synergy estimates
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Response Score report for a patient record
    Prs {
        /// Patient record (JSON)
        patient: PathBuf,
    },
    /// Dose range for one drug
    Dosage { drug_id: String },
    /// Mechanisms, side effects and curated evidence for a drug set
    Details {
        #[arg(required = true)]
        drug_ids: Vec<String>,
    },
    /// Synergy reading for a drug set
    Synergy {
        #[arg(required = true)]
        drug_ids: Vec<String>,

        /// RNG seed; defaults to the configured seed
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Config first: it may carry the log filter.
    let loaded = config::Config::load();
    let filter = loaded
        .as_ref()
        .map(|c| c.logging.filter.clone())
        .unwrap_or_else(|_| "regimyx=debug,info".to_string());

    // Logs go to stderr so stdout stays pure JSON.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    info!("Regimyx {} starting", env!("CARGO_PKG_VERSION"));

    let mut config = match loaded {
        Ok(c) => c,
        Err(e) => {
            warn!("Could not load {}: {e}", config::Config::path());
            warn!("Falling back to default engine settings.");
            config::Config::default()
        }
    };
    if let Some(path) = &cli.engine_config {
        config.engine = EngineConfig::from_path(path)
            .with_context(|| format!("loading engine config {}", path.display()))?;
    }
    info!(
        "Configuration loaded. Policy: {}, combination size: {}",
        config.engine.scoring.policy, config.engine.scoring.combination_size
    );

    let (drugs, known) = load_catalogs(&config)?;
    info!("Catalogs ready: {} drugs, {} curated combinations", drugs.len(), known.len());

    match cli.command {
        Commands::Recommend { patient, policy, size, top, max_candidates, seed } => {
            let engine = RecommendationEngine::new(&drugs, &known, config.engine.clone())?;
            let mut request = engine.request(read_patient(&patient)?);
            if let Some(policy) = policy {
                request = request.with_policy(policy);
            }
            if let Some(n) = size {
                request = request.with_combination_size(n);
            }
            if let Some(n) = top {
                request = request.with_top_n(n);
            }
            if max_candidates.is_some() {
                request = request.with_max_candidates(max_candidates);
            }
            if let Some(seed) = seed {
                request = request.with_seed(seed);
            }

            let result = engine.recommend(&request)?;
            for w in &result.warnings {
                warn!("{w}");
            }
            if let Some(best) = result.top() {
                info!("Top recommendation: {} ({:.4})", best.drugs.join(" + "), best.overall_score);
            }
            print_json(&result)
        }
        Commands::Prs { patient } => {
            print_json(&PrsCalculator::new().calculate(&read_patient(&patient)?)?)
        }
        Commands::Dosage { drug_id } => {
            print_json(&CombinationAnalyzer::new(&drugs, &known).recommend_dosage(&drug_id)?)
        }
        Commands::Details { drug_ids } => {
            let ids: Vec<&str> = drug_ids.iter().map(String::as_str).collect();
            print_json(&CombinationAnalyzer::new(&drugs, &known).combination_details(&ids)?)
        }
        Commands::Synergy { drug_ids, seed } => {
            let ids: Vec<&str> = drug_ids.iter().map(String::as_str).collect();
            let analyzer = CombinationAnalyzer::new(&drugs, &known);
            let analysis = match seed.or(config.engine.scoring.seed) {
                Some(seed) => analyzer.analyze_synergy(&ids, &mut ChaCha8Rng::seed_from_u64(seed))?,
                None => analyzer.analyze_synergy(&ids, &mut rand::thread_rng())?,
            };
            print_json(&analysis)
        }
    }
}

fn load_catalogs(config: &config::Config) -> anyhow::Result<(DrugCatalog, KnownCombinationCatalog)> {
    let paths = &config.engine.catalogs;
    let drugs = match &paths.drugs_path {
        Some(p) => DrugCatalog::from_path(p).with_context(|| format!("loading drug catalog {p}"))?,
        None => DrugCatalog::builtin(),
    };
    let known = match &paths.combinations_path {
        Some(p) => KnownCombinationCatalog::from_path(p)
            .with_context(|| format!("loading combination catalog {p}"))?,
        None => KnownCombinationCatalog::builtin(),
    };
    Ok((drugs, known))
}

fn read_patient(path: &Path) -> anyhow::Result<PatientContext> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let patient: PatientContext = serde_json::from_str(&content)
        .with_context(|| format!("parsing patient record {}", path.display()))?;
    Ok(patient)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
