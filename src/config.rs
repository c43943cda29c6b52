//! # Run Configuration
//!
//! One record describes a whole inference: which evidence enters the sample,
//! how the skeleton is searched, whether marks are oriented, and how many
//! runs the ensemble performs.
//!
//! ```text
//!   bootstrap   minimize   runs        result
//!   ─────────   ────────   ─────────   ──────────────────────────────
//!   off         off        1 (default) single map
//!   on          off        1000        single-run maps folded into a summary
//!   off         on         1000        smallest map + summary
//!   on          on         1000        both (warned: atypical)
//! ```
//!
//! The record is `serde`-enabled so a run can be described by a JSON file;
//! every field has a default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::Vocabulary;
use crate::orient::OrientationConfig;
use crate::partition::CoverageMode;
use crate::skeleton::{EdgeOrder, SkeletonConfig};
use crate::{Error, Result};

/// Run count used when the ensemble is randomized and no count is given.
pub const DEFAULT_ENSEMBLE_RUNS: usize = 1000;

/// Which pairs start out linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Seeding {
    /// Concepts that share at least one evidence record.
    #[default]
    CoOccurrence,
    /// Every pair of variables.
    Complete,
}

/// Non-fatal combinations of run options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigWarning {
    /// Minimal map searched over resampled evidence.
    MinimizeWithBootstrap,
    /// `random_order` is implied by `minimize`.
    RedundantRandomOrder,
    /// Minimization with a single run cannot explore anything.
    MinimizeSingleRun,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::MinimizeWithBootstrap => {
                write!(f, "minimal map search combined with bootstrap; the minimal map is taken over resampled evidence")
            }
            ConfigWarning::RedundantRandomOrder => {
                write!(f, "random edge order is always used for minimal map search")
            }
            ConfigWarning::MinimizeSingleRun => {
                write!(f, "minimal map search with a single run returns the only map found")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Resample languages with replacement in every run.
    pub bootstrap: bool,
    /// Orient links; otherwise every mark becomes a plain tail.
    pub directionality: bool,
    /// Track the run with the fewest links.
    pub minimize: bool,
    /// Shuffle edge-processing order per pass.
    pub random_order: bool,
    /// Number of runs; see [`InferenceConfig::effective_runs`].
    pub runs: Option<usize>,
    /// Uniform unit-flow threshold.
    pub link_threshold: f64,
    /// Complete-coverage filter: languages missing more concepts are dropped.
    pub gap_threshold: Option<usize>,
    /// Keep only concepts attested in at least this many records.
    pub min_concept_occurrences: Option<usize>,
    /// Explicit concept vocabulary; overrides `min_concept_occurrences`.
    pub concepts: Option<Vec<String>>,
    /// Explicit language list, in sample order.
    pub languages: Option<Vec<String>>,
    pub stable: bool,
    pub conservative: bool,
    pub max_conditioning_size: Option<usize>,
    pub restrict_to_paths: bool,
    pub seeding: Seeding,
    pub seed: u64,
    /// Keep every run's map in the outcome.
    pub keep_runs: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            bootstrap: false,
            directionality: false,
            minimize: false,
            random_order: false,
            runs: None,
            link_threshold: 0.0,
            gap_threshold: None,
            min_concept_occurrences: None,
            concepts: None,
            languages: None,
            stable: true,
            conservative: true,
            max_conditioning_size: None,
            restrict_to_paths: true,
            seeding: Seeding::CoOccurrence,
            seed: 0,
            keep_runs: false,
        }
    }
}

impl InferenceConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject unusable settings and list the questionable ones.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>> {
        if self.runs == Some(0) {
            return Err(Error::InvalidConfig("runs must be at least 1".into()));
        }
        if !self.link_threshold.is_finite() || self.link_threshold < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "link threshold must be a non-negative number, got {}",
                self.link_threshold
            )));
        }

        let mut warnings = Vec::new();
        if self.minimize && self.bootstrap {
            warnings.push(ConfigWarning::MinimizeWithBootstrap);
        }
        if self.minimize && self.random_order {
            warnings.push(ConfigWarning::RedundantRandomOrder);
        }
        if self.minimize && self.runs == Some(1) {
            warnings.push(ConfigWarning::MinimizeSingleRun);
        }
        Ok(warnings)
    }

    /// Explicit `runs`, else [`DEFAULT_ENSEMBLE_RUNS`] for bootstrap or
    /// minimization, else a single run.
    pub fn effective_runs(&self) -> usize {
        match self.runs {
            Some(runs) => runs,
            None if self.bootstrap || self.minimize => DEFAULT_ENSEMBLE_RUNS,
            None => 1,
        }
    }

    pub fn edge_order(&self) -> EdgeOrder {
        if self.random_order || self.minimize { EdgeOrder::Random } else { EdgeOrder::Fixed }
    }

    pub fn vocabulary(&self) -> Vocabulary {
        match (&self.concepts, self.min_concept_occurrences) {
            (Some(names), _) => Vocabulary::Explicit(names.clone()),
            (None, Some(k)) => Vocabulary::MinOccurrences(k),
            (None, None) => Vocabulary::All,
        }
    }

    pub fn coverage_mode(&self) -> CoverageMode {
        match self.gap_threshold {
            Some(max_gaps) => CoverageMode::Complete { max_gaps },
            None => CoverageMode::Unconstrained,
        }
    }

    pub fn skeleton_config(&self) -> SkeletonConfig {
        SkeletonConfig {
            stable: self.stable,
            order: self.edge_order(),
            max_conditioning_size: self.max_conditioning_size,
            restrict_to_paths: self.restrict_to_paths,
        }
    }

    pub fn orientation_config(&self) -> OrientationConfig {
        OrientationConfig {
            conservative: self.conservative,
            max_conditioning_size: self.max_conditioning_size,
            propagate: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_describe_single_deterministic_run() {
        let config = InferenceConfig::default();
        assert_eq!(config.effective_runs(), 1);
        assert_eq!(config.edge_order(), EdgeOrder::Fixed);
        assert_eq!(config.vocabulary(), Vocabulary::All);
        assert_eq!(config.coverage_mode(), CoverageMode::Unconstrained);
        assert!(config.validate().unwrap().is_empty());
    }

    #[test]
    fn test_randomized_modes_default_to_ensemble() {
        let bootstrap = InferenceConfig { bootstrap: true, ..Default::default() };
        assert_eq!(bootstrap.effective_runs(), DEFAULT_ENSEMBLE_RUNS);
        let minimize = InferenceConfig { minimize: true, runs: Some(20), ..Default::default() };
        assert_eq!(minimize.effective_runs(), 20);
        assert_eq!(minimize.edge_order(), EdgeOrder::Random);
    }

    #[test]
    fn test_conflicting_options_warn() {
        let config = InferenceConfig {
            minimize: true,
            bootstrap: true,
            random_order: true,
            runs: Some(1),
            ..Default::default()
        };
        assert_eq!(
            config.validate().unwrap(),
            vec![
                ConfigWarning::MinimizeWithBootstrap,
                ConfigWarning::RedundantRandomOrder,
                ConfigWarning::MinimizeSingleRun,
            ]
        );
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let zero = InferenceConfig { runs: Some(0), ..Default::default() };
        assert!(matches!(zero.validate(), Err(Error::InvalidConfig(_))));
        let negative = InferenceConfig { link_threshold: -1.0, ..Default::default() };
        assert!(matches!(negative.validate(), Err(Error::InvalidConfig(_))));
        let nan = InferenceConfig { link_threshold: f64::NAN, ..Default::default() };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = InferenceConfig::from_json_str(
            r#"{ "bootstrap": true, "runs": 50, "gap_threshold": 2, "seeding": "Complete" }"#,
        )
        .unwrap();
        assert!(config.bootstrap);
        assert_eq!(config.runs, Some(50));
        assert_eq!(config.coverage_mode(), CoverageMode::Complete { max_gaps: 2 });
        assert_eq!(config.seeding, Seeding::Complete);
        assert!(config.stable);
    }

    #[test]
    fn test_explicit_concepts_override_occurrence_filter() {
        let config = InferenceConfig {
            concepts: Some(vec!["SUN".into()]),
            min_concept_occurrences: Some(3),
            ..Default::default()
        };
        assert_eq!(config.vocabulary(), Vocabulary::Explicit(vec!["SUN".into()]));
    }
}
