//! Catalog-level analysis of individual drugs and fixed combinations:
//! dosage ranges, mechanism / side-effect summaries and synergy readings.

use std::collections::BTreeSet;

use rand::Rng;
use regimyx_common::entities::{DrugRecord, KnownCombination};
use regimyx_common::{RegimyxError, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::{DrugCatalog, KnownCombinationCatalog};
use crate::matcher::KnownCombinationMatcher;
use crate::synergy::{heuristic_synergy, SynergyClass};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DosageRecommendation {
    pub drug_id: String,
    pub drug_name: String,
    pub recommended_dose: f64,
    pub min_dose: f64,
    pub max_dose: f64,
    pub unit: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugSummary {
    pub id: String,
    pub name: String,
    pub category: String,
    pub mechanism: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinationDetails {
    pub drugs: Vec<DrugSummary>,
    pub mechanisms: Vec<String>,
    pub categories: Vec<String>,
    pub unique_mechanisms: usize,
    pub unique_categories: usize,
    /// First-seen order
    pub all_side_effects: Vec<String>,
    /// Reported for two or more members
    pub common_side_effects: Vec<String>,
    pub known_combination: Option<KnownCombination>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisConfidence {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergyAnalysis {
    pub synergy_class: SynergyClass,
    pub synergy_score: f64,
    pub interpretation: String,
    pub is_known: bool,
    pub confidence: Option<AnalysisConfidence>,
}

pub struct CombinationAnalyzer<'a> {
    drugs: &'a DrugCatalog,
    matcher: KnownCombinationMatcher<'a>,
}

impl<'a> CombinationAnalyzer<'a> {
    pub fn new(drugs: &'a DrugCatalog, known: &'a KnownCombinationCatalog) -> Self {
        Self { drugs, matcher: KnownCombinationMatcher::new(known) }
    }

    fn lookup(&self, drug_id: &str) -> Result<&'a DrugRecord> {
        self.drugs
            .get(drug_id)
            .ok_or_else(|| RegimyxError::Input(format!("unknown drug id: {drug_id}")))
    }

    fn lookup_all(&self, drug_ids: &[&str]) -> Result<Vec<&'a DrugRecord>> {
        let mut seen = BTreeSet::new();
        if let Some(repeated) = drug_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(RegimyxError::Input(format!("drug id listed more than once: {repeated}")));
        }
        drug_ids.iter().map(|id| self.lookup(id)).collect()
    }

    /// Dose range in μM derived from the typical IC50 range.
    pub fn recommend_dosage(&self, drug_id: &str) -> Result<DosageRecommendation> {
        let drug = self.lookup(drug_id)?;
        let (low, high) = drug.typical_ic50_range;
        Ok(DosageRecommendation {
            drug_id: drug.id.clone(),
            drug_name: drug.name.clone(),
            recommended_dose: drug.mean_ic50() * 3.0,
            min_dose: low * 2.0,
            max_dose: high * 5.0,
            unit: "μM".to_string(),
            notes: format!("Dosing based on {}", drug.mechanism.to_lowercase()),
        })
    }

    pub fn combination_details(&self, drug_ids: &[&str]) -> Result<CombinationDetails> {
        let members = self.lookup_all(drug_ids)?;

        let mechanisms: Vec<String> = members.iter().map(|d| d.mechanism.clone()).collect();
        let categories: Vec<String> = members.iter().map(|d| d.category.clone()).collect();

        let mut all_side_effects: Vec<String> = Vec::new();
        let mut counts: Vec<usize> = Vec::new();
        for effect in members.iter().flat_map(|d| d.side_effects.iter()) {
            match all_side_effects.iter().position(|e| e == effect) {
                Some(i) => counts[i] += 1,
                None => {
                    all_side_effects.push(effect.clone());
                    counts.push(1);
                }
            }
        }
        let common_side_effects = all_side_effects
            .iter()
            .zip(&counts)
            .filter(|&(_, &n)| n >= 2)
            .map(|(e, _)| e.clone())
            .collect();

        Ok(CombinationDetails {
            drugs: members
                .iter()
                .map(|d| DrugSummary {
                    id: d.id.clone(),
                    name: d.name.clone(),
                    category: d.category.clone(),
                    mechanism: d.mechanism.clone(),
                })
                .collect(),
            unique_mechanisms: count_unique(&mechanisms),
            unique_categories: count_unique(&categories),
            mechanisms,
            categories,
            all_side_effects,
            common_side_effects,
            known_combination: self.matcher.find(drug_ids).map(|m| m.record.clone()),
        })
    }

    /// Synergy reading: curated record when one exists, else the category
    /// heuristic.
    pub fn analyze_synergy<R: Rng + ?Sized>(&self, drug_ids: &[&str], rng: &mut R) -> Result<SynergyAnalysis> {
        let members = self.lookup_all(drug_ids)?;
        if members.is_empty() {
            return Err(RegimyxError::Input("synergy analysis needs at least one drug".to_string()));
        }
        if members.len() == 1 {
            return Ok(SynergyAnalysis {
                synergy_class: SynergyClass::SingleAgent,
                synergy_score: 1.0,
                interpretation: SynergyClass::SingleAgent.interpretation().to_string(),
                is_known: false,
                confidence: None,
            });
        }

        let known = self.matcher.find(drug_ids);
        let score = match known {
            Some(m) => m.record.synergy_score,
            None => heuristic_synergy(&members, rng),
        };
        let class = SynergyClass::from_score(score);
        Ok(SynergyAnalysis {
            synergy_class: class,
            synergy_score: score,
            interpretation: class.interpretation().to_string(),
            is_known: known.is_some(),
            confidence: Some(if known.is_some() { AnalysisConfidence::High } else { AnalysisConfidence::Medium }),
        })
    }
}

fn count_unique(values: &[String]) -> usize {
    let mut sorted: Vec<&String> = values.iter().collect();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}
