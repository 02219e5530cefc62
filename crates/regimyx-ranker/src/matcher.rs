//! Set-equality lookup of candidates against the curated catalog.

use std::collections::{BTreeSet, HashMap};

use regimyx_common::entities::KnownCombination;
use regimyx_common::EngineWarning;
use tracing::warn;

use crate::catalog::KnownCombinationCatalog;

/// A curated record matched to a candidate.
#[derive(Debug, Clone, Copy)]
pub struct KnownMatch<'a> {
    pub record: &'a KnownCombination,
    /// How many catalog records share the drug set (1 for a healthy catalog).
    pub match_count: usize,
}

impl KnownMatch<'_> {
    /// Data-integrity warning when the catalog holds duplicates for this set.
    pub fn integrity_warning(&self) -> Option<EngineWarning> {
        (self.match_count > 1).then(|| EngineWarning::DuplicateKnownCombination {
            drug_ids: sorted_ids(&self.record.drug_ids),
            matches: self.match_count,
        })
    }
}

fn sorted_ids(ids: &[String]) -> Vec<String> {
    let set: BTreeSet<&String> = ids.iter().collect();
    set.into_iter().cloned().collect()
}

/// Order-independent matcher, indexed once per catalog.
pub struct KnownCombinationMatcher<'a> {
    catalog: &'a KnownCombinationCatalog,
    index: HashMap<BTreeSet<String>, Vec<usize>>,
}

impl<'a> KnownCombinationMatcher<'a> {
    pub fn new(catalog: &'a KnownCombinationCatalog) -> Self {
        let mut index: HashMap<BTreeSet<String>, Vec<usize>> = HashMap::new();
        for (i, record) in catalog.records().iter().enumerate() {
            let key: BTreeSet<String> = record.drug_ids.iter().cloned().collect();
            index.entry(key).or_default().push(i);
        }
        Self { catalog, index }
    }

    /// Record whose drug set equals `drug_ids`, first in catalog order.
    pub fn find(&self, drug_ids: &[&str]) -> Option<KnownMatch<'a>> {
        let key: BTreeSet<String> = drug_ids.iter().map(|s| s.to_string()).collect();
        let positions = self.index.get(&key)?;
        let first = *positions.first()?;
        let found = KnownMatch {
            record: &self.catalog.records()[first],
            match_count: positions.len(),
        };
        if found.match_count > 1 {
            warn!(
                "Data integrity: {} curated records share drug set {:?}; using '{}'",
                found.match_count, key, found.record.display_name
            );
        }
        Some(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regimyx_test_utils::known_combination;

    #[test]
    fn test_match_is_permutation_invariant() {
        let catalog = KnownCombinationCatalog::new(vec![known_combination(&["A", "B"], 0.82, 1.25)]).unwrap();
        let matcher = KnownCombinationMatcher::new(&catalog);
        let ab = matcher.find(&["A", "B"]).unwrap();
        let ba = matcher.find(&["B", "A"]).unwrap();
        assert!(std::ptr::eq(ab.record, ba.record));
        assert_eq!(ab.record.clinical_efficacy, 0.82);
        assert_eq!(ab.record.synergy_score, 1.25);
        assert!(ab.integrity_warning().is_none());
    }

    #[test]
    fn test_subset_and_superset_do_not_match() {
        let catalog = KnownCombinationCatalog::new(vec![known_combination(&["A", "B"], 0.82, 1.25)]).unwrap();
        let matcher = KnownCombinationMatcher::new(&catalog);
        assert!(matcher.find(&["A"]).is_none());
        assert!(matcher.find(&["A", "B", "C"]).is_none());
        assert!(matcher.find(&["A", "C"]).is_none());
    }

    #[test]
    fn test_duplicate_records_use_first_and_warn() {
        let catalog = KnownCombinationCatalog::new(vec![
            known_combination(&["A", "B"], 0.70, 1.10),
            known_combination(&["C"], 0.50, 1.0),
            known_combination(&["B", "A"], 0.90, 1.40),
        ])
        .unwrap();
        let matcher = KnownCombinationMatcher::new(&catalog);
        let m = matcher.find(&["B", "A"]).unwrap();
        assert_eq!(m.record.clinical_efficacy, 0.70);
        assert_eq!(m.match_count, 2);
        assert_eq!(
            m.integrity_warning(),
            Some(EngineWarning::DuplicateKnownCombination {
                drug_ids: vec!["A".to_string(), "B".to_string()],
                matches: 2,
            })
        );
    }
}
