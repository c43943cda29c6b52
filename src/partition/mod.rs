//! # Evidence Partitioner
//!
//! Groups evidence records into per-language samples: for each language, the
//! equivalence classes of concepts bundled under one lemma. This is the
//! observational unit consumed by the independence oracle.
//!
//! ```text
//! records ──► BTreeMap<language, BTreeSet<record>> ──► coverage filter ──► SampleSet
//!                                                                           │
//!                                          resample(rng) ◄──────────────────┘
//! ```
//!
//! Languages are ordered lexicographically (or by an explicit language list)
//! so that a run without randomization enumerates evidence deterministically.
//! Samples are immutable and shared by `Arc`; resampling only clones handles.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::model::{ConceptRegistry, EvidenceRecord, VarId};

/// Number of missing concepts listed by name in reports and logs.
const MAX_LISTED_GAPS: usize = 5;

// ============================================================================
// Sample types
// ============================================================================

/// The vocabulary concepts one lemma covers in one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColexClass {
    pub lemma: String,
    /// Sorted, duplicate-free.
    pub concepts: SmallVec<[VarId; 4]>,
}

impl ColexClass {
    pub fn new(lemma: impl Into<String>, concepts: impl IntoIterator<Item = VarId>) -> Self {
        let mut concepts: SmallVec<[VarId; 4]> = concepts.into_iter().collect();
        concepts.sort_unstable();
        concepts.dedup();
        Self { lemma: lemma.into(), concepts }
    }

    #[inline]
    pub fn contains(&self, var: VarId) -> bool {
        self.concepts.binary_search(&var).is_ok()
    }
}

/// All classes observed for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSample {
    pub language: String,
    pub classes: Vec<ColexClass>,
}

impl LanguageSample {
    pub fn attests(&self, var: VarId) -> bool {
        self.classes.iter().any(|c| c.contains(var))
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Ordered collection of language samples (one entry per drawn language).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleSet {
    languages: Vec<Arc<LanguageSample>>,
}

impl SampleSet {
    pub fn new(languages: Vec<LanguageSample>) -> Self {
        Self { languages: languages.into_iter().map(Arc::new).collect() }
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LanguageSample> {
        self.languages.iter().map(Arc::as_ref)
    }

    pub fn language_names(&self) -> Vec<&str> {
        self.iter().map(|l| l.language.as_str()).collect()
    }

    /// Language-level bootstrap: draw `len()` languages uniformly with
    /// replacement. The input languages are shared, never copied or mutated.
    pub fn resample<R: Rng + ?Sized>(&self, rng: &mut R) -> SampleSet {
        let m = self.languages.len();
        let languages = (0..m)
            .map(|_| Arc::clone(&self.languages[rng.gen_range(0..m)]))
            .collect();
        SampleSet { languages }
    }

    /// Whether `sample` is (pointer-)identical to one of this set's entries.
    pub fn shares(&self, sample: &LanguageSample) -> bool {
        self.languages.iter().any(|l| std::ptr::eq(l.as_ref(), sample))
    }
}

// ============================================================================
// Coverage report
// ============================================================================

/// How a language fared against the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageCoverage {
    pub language: String,
    /// Vocabulary concepts the language does not attest.
    pub gaps: usize,
    /// Names of the missing concepts, listed only when there are few.
    pub missing: Vec<String>,
    pub included: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionReport {
    pub languages: Vec<LanguageCoverage>,
}

impl PartitionReport {
    pub fn included(&self) -> impl Iterator<Item = &LanguageCoverage> {
        self.languages.iter().filter(|l| l.included)
    }

    pub fn discarded(&self) -> impl Iterator<Item = &LanguageCoverage> {
        self.languages.iter().filter(|l| !l.included)
    }
}

// ============================================================================
// Partitioner
// ============================================================================

/// Which languages enter the sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CoverageMode {
    /// Every language present in the evidence.
    #[default]
    Unconstrained,
    /// Only languages missing at most `max_gaps` vocabulary concepts.
    Complete { max_gaps: usize },
}

pub struct Partitioner<'r> {
    registry: &'r ConceptRegistry,
    mode: CoverageMode,
    languages: Option<Vec<String>>,
}

impl<'r> Partitioner<'r> {
    pub fn new(registry: &'r ConceptRegistry) -> Self {
        Self { registry, mode: CoverageMode::Unconstrained, languages: None }
    }

    pub fn with_mode(mut self, mode: CoverageMode) -> Self {
        self.mode = mode;
        self
    }

    /// Shorthand for `CoverageMode::Complete { max_gaps }`.
    pub fn with_max_gaps(self, max_gaps: usize) -> Self {
        self.with_mode(CoverageMode::Complete { max_gaps })
    }

    /// Restrict the sample to these languages, in this order. Listed
    /// languages without records yield empty samples.
    pub fn with_languages(mut self, languages: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.languages = Some(languages.into_iter().map(Into::into).collect());
        self
    }

    /// Build the sample set and a per-language coverage report.
    pub fn partition(&self, records: &[EvidenceRecord]) -> (SampleSet, PartitionReport) {
        let mut per_language: BTreeMap<&str, BTreeSet<&EvidenceRecord>> = BTreeMap::new();
        for record in records {
            per_language.entry(record.language.as_str()).or_default().insert(record);
        }

        let order: Vec<&str> = match &self.languages {
            Some(list) => list.iter().map(String::as_str).collect(),
            None => per_language.keys().copied().collect(),
        };

        let mut samples = Vec::with_capacity(order.len());
        let mut report = PartitionReport::default();
        let empty = BTreeSet::new();

        for language in order {
            let language_records = per_language.get(language).unwrap_or(&empty);
            let coverage = self.coverage(language, language_records);
            if coverage.included {
                samples.push(self.sample_for(language, language_records));
            }
            report.languages.push(coverage);
        }

        let discarded = report.discarded().count();
        tracing::info!(
            languages = samples.len(),
            discarded,
            "extracted isolectic sets"
        );

        (SampleSet::new(samples), report)
    }

    fn sample_for(&self, language: &str, records: &BTreeSet<&EvidenceRecord>) -> LanguageSample {
        let classes = records
            .iter()
            .filter_map(|record| {
                let class = ColexClass::new(
                    record.lemma.clone(),
                    record.concepts.iter().filter_map(|c| self.registry.get(c)),
                );
                (!class.concepts.is_empty()).then_some(class)
            })
            .collect();
        LanguageSample { language: language.to_string(), classes }
    }

    fn coverage(&self, language: &str, records: &BTreeSet<&EvidenceRecord>) -> LanguageCoverage {
        let max_gaps = match self.mode {
            CoverageMode::Unconstrained => {
                return LanguageCoverage {
                    language: language.to_string(),
                    gaps: 0,
                    missing: Vec::new(),
                    included: true,
                };
            }
            CoverageMode::Complete { max_gaps } => max_gaps,
        };

        let missing: Vec<&String> = self
            .registry
            .names()
            .iter()
            .filter(|name| !records.iter().any(|r| r.attests(name)))
            .collect();
        let gaps = missing.len();
        let included = gaps <= max_gaps;
        let listed: Vec<String> = if gaps <= MAX_LISTED_GAPS {
            missing.iter().map(|s| s.to_string()).collect()
        } else {
            Vec::new()
        };

        if gaps == 0 {
            tracing::debug!(language, "data included, all concepts are covered");
        } else if included {
            tracing::debug!(language, gaps, "data included with gaps");
        } else if listed.is_empty() {
            tracing::warn!(language, gaps, "data discarded due to gaps");
        } else {
            tracing::warn!(language, gaps, missing = %listed.join(", "), "data discarded due to gaps");
        }

        LanguageCoverage { language: language.to_string(), gaps, missing: listed, included }
    }
}

// ============================================================================
// Tests
// ============================================================================
