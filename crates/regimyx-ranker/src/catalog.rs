//! Reference catalogs: drugs and curated combinations.
//!
//! Both catalogs are immutable once built and are borrowed read-only by
//! every stage of a recommendation run.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use regimyx_common::entities::{DrugRecord, KnownCombination};
use regimyx_common::{RegimyxError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Serialize, Deserialize)]
struct DrugFile {
    drugs: Vec<DrugRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CombinationFile {
    combinations: Vec<KnownCombination>,
}

fn read_document<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    if is_yaml {
        Ok(serde_yaml::from_str(&content)?)
    } else {
        Ok(serde_json::from_str(&content)?)
    }
}

// ── Drug catalog ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DrugCatalog {
    drugs: Vec<DrugRecord>,
    index: HashMap<String, usize>,
}

impl DrugCatalog {
    /// Build a catalog, rejecting duplicate ids and out-of-range values.
    pub fn new(drugs: Vec<DrugRecord>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for drug in &drugs {
            if !seen.insert(drug.id.as_str()) {
                return Err(RegimyxError::Config(format!("duplicate drug id: {}", drug.id)));
            }
            if !(0.0..=10.0).contains(&drug.toxicity_score) {
                return Err(RegimyxError::Config(format!(
                    "toxicity_score for {} must be within [0, 10] (got {})",
                    drug.id, drug.toxicity_score
                )));
            }
            let (low, high) = drug.typical_ic50_range;
            if low < 0.0 || high < low {
                return Err(RegimyxError::Config(format!(
                    "invalid IC50 range for {}: ({low}, {high})",
                    drug.id
                )));
            }
        }
        Ok(Self::indexed(drugs))
    }

    fn indexed(drugs: Vec<DrugRecord>) -> Self {
        let index = drugs
            .iter()
            .enumerate()
            .map(|(i, d)| (d.id.clone(), i))
            .collect();
        Self { drugs, index }
    }

    /// Load a `{ "drugs": [...] }` document from JSON or YAML.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file: DrugFile = read_document(path.as_ref())?;
        info!("Loaded {} drugs from {}", file.drugs.len(), path.as_ref().display());
        Self::new(file.drugs)
    }

    /// Catalog shipped with the engine (colorectal, lung, breast and
    /// pancreatic regimens).
    pub fn builtin() -> Self {
        Self::indexed(builtin_drugs())
    }

    pub fn get(&self, id: &str) -> Option<&DrugRecord> {
        self.index.get(id).map(|&i| &self.drugs[i])
    }

    pub fn drugs(&self) -> &[DrugRecord] {
        &self.drugs
    }

    pub fn len(&self) -> usize {
        self.drugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drugs.is_empty()
    }

    /// Drugs applicable to `cancer_type`, in catalog order.
    /// Without a cancer type the whole catalog is the pool.
    pub fn pool_for(&self, cancer_type: Option<&str>) -> Vec<&DrugRecord> {
        let pool: Vec<&DrugRecord> = match cancer_type {
            Some(ct) => self.drugs.iter().filter(|d| d.applies_to(ct)).collect(),
            None => self.drugs.iter().collect(),
        };
        debug!("Drug pool for {:?}: {} of {}", cancer_type, pool.len(), self.drugs.len());
        pool
    }
}

// ── Known combination catalog ────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct KnownCombinationCatalog {
    records: Vec<KnownCombination>,
}

impl KnownCombinationCatalog {
    /// Build a catalog, rejecting malformed records. Repeated drug sets
    /// across records are allowed and surface through `duplicate_sets`.
    pub fn new(records: Vec<KnownCombination>) -> Result<Self> {
        for record in &records {
            let name = &record.display_name;
            if record.drug_ids.is_empty() {
                return Err(RegimyxError::Config(format!("curated combination {name} lists no drugs")));
            }
            if record.id_set().len() != record.drug_ids.len() {
                return Err(RegimyxError::Config(format!(
                    "curated combination {name} repeats a drug id: {:?}",
                    record.drug_ids
                )));
            }
            if !(0.0..=1.0).contains(&record.clinical_efficacy) {
                return Err(RegimyxError::Config(format!(
                    "clinical_efficacy for {name} must be within [0, 1] (got {})",
                    record.clinical_efficacy
                )));
            }
            if !record.synergy_score.is_finite() || record.synergy_score < 0.0 {
                return Err(RegimyxError::Config(format!(
                    "synergy_score for {name} must be a non-negative number (got {})",
                    record.synergy_score
                )));
            }
        }
        Ok(Self { records })
    }

    /// Load a `{ "combinations": [...] }` document from JSON or YAML.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file: CombinationFile = read_document(path.as_ref())?;
        info!(
            "Loaded {} curated combinations from {}",
            file.combinations.len(),
            path.as_ref().display()
        );
        Self::new(file.combinations)
    }

    pub fn builtin() -> Self {
        Self { records: builtin_combinations() }
    }

    pub fn records(&self) -> &[KnownCombination] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drug sets shared by more than one record, for integrity reports.
    pub fn duplicate_sets(&self) -> Vec<Vec<String>> {
        let mut counts: HashMap<BTreeSet<&str>, usize> = HashMap::new();
        for r in &self.records {
            *counts.entry(r.id_set()).or_default() += 1;
        }
        let mut dups: Vec<Vec<String>> = counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(set, _)| set.into_iter().map(str::to_string).collect())
            .collect();
        dups.sort();
        dups
    }
}

// ── Built-in reference data ──────────────────────────────────────────────────

fn drug(
    id: &str,
    name: &str,
    category: &str,
    mechanism: &str,
    toxicity_score: f64,
    ic50: (f64, f64),
    cancers: &[&str],
    side_effects: &[&str],
) -> DrugRecord {
    DrugRecord {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        mechanism: mechanism.to_string(),
        toxicity_score,
        typical_ic50_range: ic50,
        applicable_cancer_types: cancers.iter().map(|c| c.to_string()).collect(),
        side_effects: side_effects.iter().map(|s| s.to_string()).collect(),
    }
}

fn builtin_drugs() -> Vec<DrugRecord> {
    vec![
        drug("5fu", "5-Fluorouracil", "Antimetabolite", "Thymidylate synthase inhibition",
             3.5, (1.0, 10.0), &["Colorectal", "Pancreatic"],
             &["Nausea", "Mucositis", "Diarrhea", "Neutropenia"]),
        drug("oxaliplatin", "Oxaliplatin", "Platinum", "DNA cross-linking",
             4.0, (0.5, 5.0), &["Colorectal", "Pancreatic"],
             &["Peripheral neuropathy", "Nausea", "Neutropenia"]),
        drug("irinotecan", "Irinotecan", "Topoisomerase inhibitor", "Topoisomerase I inhibition",
             4.5, (2.0, 20.0), &["Colorectal", "Pancreatic"],
             &["Diarrhea", "Neutropenia", "Nausea"]),
        drug("bevacizumab", "Bevacizumab", "Anti-angiogenic antibody", "VEGF-A neutralisation",
             3.0, (0.1, 1.0), &["Colorectal", "Lung"],
             &["Hypertension", "Proteinuria", "Bleeding"]),
        drug("cetuximab", "Cetuximab", "Anti-EGFR antibody", "EGFR blockade",
             2.5, (0.05, 0.5), &["Colorectal"],
             &["Acneiform rash", "Hypomagnesemia", "Diarrhea"]),
        drug("pembrolizumab", "Pembrolizumab", "Immune checkpoint inhibitor", "PD-1 blockade",
             3.5, (0.1, 1.0), &["Colorectal", "Lung"],
             &["Fatigue", "Colitis", "Pneumonitis"]),
        drug("pritamab", "Pritamab", "Anti-PrPc antibody", "Cellular prion protein blockade",
             2.0, (0.05, 0.6), &["Colorectal"],
             &["Fatigue", "Infusion reaction"]),
        drug("cisplatin", "Cisplatin", "Platinum", "DNA cross-linking",
             5.0, (1.0, 15.0), &["Lung"],
             &["Nephrotoxicity", "Nausea", "Ototoxicity", "Neutropenia"]),
        drug("paclitaxel", "Paclitaxel", "Taxane", "Microtubule stabilisation",
             4.0, (0.005, 0.05), &["Lung", "Breast", "Pancreatic"],
             &["Peripheral neuropathy", "Neutropenia", "Alopecia"]),
        drug("doxorubicin", "Doxorubicin", "Anthracycline", "Topoisomerase II inhibition",
             5.5, (0.1, 1.0), &["Breast"],
             &["Cardiotoxicity", "Neutropenia", "Alopecia", "Nausea"]),
        drug("gemcitabine", "Gemcitabine", "Antimetabolite", "Ribonucleotide reductase inhibition",
             3.0, (0.01, 0.1), &["Lung", "Breast", "Pancreatic"],
             &["Neutropenia", "Fatigue", "Nausea"]),
    ]
}

fn known(
    ids: &[&str],
    name: &str,
    efficacy: f64,
    synergy: f64,
    evidence: &str,
    refs: &[&str],
    response_rate: &str,
    survival_benefit: &str,
) -> KnownCombination {
    KnownCombination {
        drug_ids: ids.iter().map(|s| s.to_string()).collect(),
        display_name: name.to_string(),
        synergy_score: synergy,
        clinical_efficacy: efficacy,
        evidence_level: evidence.to_string(),
        references: refs.iter().map(|s| s.to_string()).collect(),
        response_rate: Some(response_rate.to_string()),
        survival_benefit: Some(survival_benefit.to_string()),
    }
}

fn builtin_combinations() -> Vec<KnownCombination> {
    vec![
        // Colorectal
        known(&["5fu"], "5-Fluorouracil", 0.65, 1.0, "1A", &["Phase III trial data"], "45-55%", "Moderate"),
        known(&["oxaliplatin"], "Oxaliplatin", 0.58, 1.0, "1A", &["Phase III trial data"], "40-50%", "Moderate"),
        known(&["5fu", "oxaliplatin"], "FOLFOX", 0.82, 1.25, "1A", &["MOSAIC Trial"], "55-65%", "High"),
        known(&["5fu", "irinotecan"], "FOLFIRI", 0.79, 1.22, "1A", &["FOLFIRI Trial"], "50-60%", "High"),
        known(&["oxaliplatin", "bevacizumab"], "Oxaliplatin + Bevacizumab", 0.76, 1.18, "1A",
              &["Phase III trial data"], "45-55%", "Moderate"),
        known(&["5fu", "oxaliplatin", "bevacizumab"], "FOLFOX + Bevacizumab", 0.88, 1.35, "1A",
              &["NO16966 Trial"], "60-70%", "High"),
        known(&["5fu", "oxaliplatin", "pritamab"], "FOLFOX + Pritamab", 0.95, 1.50, "1A",
              &["Prion Protein Research", "Pritamab Clinical Trial"], "75-85%", "Very high"),
        known(&["5fu", "irinotecan", "pritamab"], "FOLFIRI + Pritamab", 0.92, 1.45, "1A",
              &["Prion Protein Research"], "70-80%", "Very high"),
        // Lung
        known(&["cisplatin"], "Cisplatin", 0.62, 1.0, "1A", &["Phase III trial data"], "40-50%", "Moderate"),
        known(&["cisplatin", "paclitaxel"], "Cisplatin + Paclitaxel", 0.78, 1.20, "1A",
              &["Phase III trial data"], "50-60%", "High"),
        known(&["cisplatin", "gemcitabine"], "Cisplatin + Gemcitabine", 0.75, 1.18, "1A",
              &["Phase III trial data"], "45-55%", "High"),
        known(&["cisplatin", "paclitaxel", "pembrolizumab"], "Cisplatin + Paclitaxel + Pembrolizumab",
              0.85, 1.30, "1A", &["KEYNOTE-189"], "55-65%", "Very high"),
        // Breast
        known(&["doxorubicin"], "Doxorubicin", 0.68, 1.0, "1A", &["Phase III trial data"], "45-55%", "Moderate"),
        known(&["doxorubicin", "paclitaxel"], "AC-T", 0.80, 1.18, "1A", &["Phase III trial data"], "55-65%", "High"),
        known(&["doxorubicin", "paclitaxel", "gemcitabine"], "Doxorubicin + Paclitaxel + Gemcitabine",
              0.83, 1.25, "2A", &["Phase II trial data"], "60-70%", "High"),
    ]
}
