//! Concepts and their variable indices.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use crate::{Error, Result};

/// Variable index of a concept, `0..n` for the lifetime of a run.
pub type VarId = usize;

/// Bidirectional concept ↔ variable registry.
///
/// Built once from the vocabulary; indices follow the iteration order of the
/// input (lexicographic when built from a `BTreeSet`) and are never
/// renumbered afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptRegistry {
    names: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, VarId>,
}

impl ConceptRegistry {
    /// Build a registry from concept names. Duplicate names keep their first index.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self { names: Vec::new(), index: HashMap::new() };
        for name in names {
            let name = name.into();
            if registry.index.contains_key(&name) {
                continue;
            }
            registry.index.insert(name.clone(), registry.names.len());
            registry.names.push(name);
        }
        registry
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Variable index of a concept.
    pub fn var(&self, name: &str) -> Result<VarId> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownConcept(name.to_string()))
    }

    /// Variable index of a concept, `None` when it is outside the vocabulary.
    pub fn get(&self, name: &str) -> Option<VarId> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Concept name of a variable.
    pub fn name(&self, var: VarId) -> Result<&str> {
        self.names
            .get(var)
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownConcept(format!("#{var}")))
    }

    /// All names in variable order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Rebuild the reverse index (after deserialization).
    pub fn reindex(&mut self) {
        self.index = self
            .names
            .iter()
            .enumerate()
            .map(|(var, name)| (name.clone(), var))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bidirectional_lookup() {
        let registry = ConceptRegistry::new(["ARM", "HAND", "TREE"]);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.var("HAND").unwrap(), 1);
        assert_eq!(registry.name(2).unwrap(), "TREE");
    }

    #[test]
    fn test_unknown_concept_is_an_error() {
        let registry = ConceptRegistry::new(["ARM"]);
        assert!(matches!(registry.var("LEG"), Err(Error::UnknownConcept(_))));
        assert!(registry.name(7).is_err());
        assert_eq!(registry.get("LEG"), None);
    }

    #[test]
    fn test_duplicates_keep_first_index() {
        let registry = ConceptRegistry::new(["A", "B", "A"]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.var("A").unwrap(), 0);
    }

    #[test]
    fn test_reindex_after_roundtrip() {
        let registry = ConceptRegistry::new(["X", "Y"]);
        let json = serde_json::to_string(&registry).unwrap();
        let mut restored: ConceptRegistry = serde_json::from_str(&json).unwrap();
        restored.reindex();
        assert_eq!(restored.var("Y").unwrap(), 1);
    }
}
