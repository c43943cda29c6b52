//! Evidence records (isolectic areas) and vocabulary selection.

use std::collections::{BTreeMap, BTreeSet};
use serde::{Deserialize, Serialize};

/// One attested word: in `language`, `lemma` denotes every concept in `concepts`.
///
/// Two concepts sharing a record colexify in that language.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub language: String,
    pub lemma: String,
    pub concepts: BTreeSet<String>,
}

impl EvidenceRecord {
    pub fn new<I, S>(language: impl Into<String>, lemma: impl Into<String>, concepts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            language: language.into(),
            lemma: lemma.into(),
            concepts: concepts.into_iter().map(Into::into).collect(),
        }
    }

    pub fn attests(&self, concept: &str) -> bool {
        self.concepts.contains(concept)
    }
}

/// How the set of concepts (variables) is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Vocabulary {
    /// Every concept attested at least once.
    #[default]
    All,
    /// Concepts attested in at least `k` records.
    MinOccurrences(usize),
    /// An explicit list; names without any attestation become isolated variables.
    Explicit(Vec<String>),
}

/// Number of records attesting each concept.
pub fn concept_counts(records: &[EvidenceRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        for concept in &record.concepts {
            *counts.entry(concept.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Resolve a vocabulary against the evidence. The result is ordered by name.
pub fn select_concepts(records: &[EvidenceRecord], vocabulary: &Vocabulary) -> BTreeSet<String> {
    match vocabulary {
        Vocabulary::All => concept_counts(records).into_keys().collect(),
        Vocabulary::MinOccurrences(min) => concept_counts(records)
            .into_iter()
            .filter(|(_, count)| count >= min)
            .map(|(concept, _)| concept)
            .collect(),
        Vocabulary::Explicit(names) => names.iter().cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<EvidenceRecord> {
        vec![
            EvidenceRecord::new("deu", "Baum", ["TREE"]),
            EvidenceRecord::new("fin", "puu", ["TREE", "WOOD"]),
            EvidenceRecord::new("rus", "derevo", ["TREE", "WOOD"]),
            EvidenceRecord::new("deu", "Holz", ["WOOD", "FIREWOOD"]),
        ]
    }

    #[test]
    fn test_concept_counts() {
        let counts = concept_counts(&records());
        assert_eq!(counts["TREE"], 3);
        assert_eq!(counts["WOOD"], 3);
        assert_eq!(counts["FIREWOOD"], 1);
    }

    #[test]
    fn test_min_occurrence_filter() {
        let selected = select_concepts(&records(), &Vocabulary::MinOccurrences(2));
        assert_eq!(selected.into_iter().collect::<Vec<_>>(), vec!["TREE", "WOOD"]);
    }

    #[test]
    fn test_explicit_vocabulary_overrides_evidence() {
        let selected = select_concepts(
            &records(),
            &Vocabulary::Explicit(vec!["WOOD".into(), "FOREST".into()]),
        );
        assert!(selected.contains("FOREST"));
        assert!(!selected.contains("TREE"));
    }
}
