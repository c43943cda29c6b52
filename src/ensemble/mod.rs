//! # Ensemble Controller
//!
//! Prepares the evidence once and drives one or many inference runs over it.
//!
//! ```text
//!   records ──► vocabulary ──► ConceptRegistry ──► Partitioner ──► SampleSet
//!                                                                    │
//!   run k:  ChaCha8Rng(seed, stream k)                               │
//!           ├─ bootstrap? resample languages ◄────────────────────────┘
//!           ├─ fresh CandidateGraph (seeded)
//!           ├─ infer_skeleton (fixed or shuffled order)
//!           └─ orient  |  convert_undetermined_to_plain
//!                         │
//!                         ▼
//!   Mutex<Accumulator> ── summary (runs > 1) ── minimal map ── kept maps
//! ```
//!
//! Runs share nothing mutable: each owns its graph, oracle and random
//! stream. With the `parallel` feature runs are spread over the rayon pool
//! and every worker keeps a partial summary that is merged at the end; the
//! outcome is identical to the sequential one.

pub mod summary;

use std::sync::Arc;

use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::{ConfigWarning, InferenceConfig, Seeding};
use crate::graph::CandidateGraph;
use crate::model::{ConceptRegistry, EvidenceRecord, select_concepts};
use crate::oracle::{ThresholdMatrix, UnitFlowOracle};
use crate::orient::{OrientationStats, orient};
use crate::partition::{PartitionReport, Partitioner, SampleSet};
use crate::skeleton::{SkeletonStats, infer_skeleton};
use crate::{Error, Result};

pub use summary::{GraphSummary, SummaryEdge};

// ============================================================================
// Results
// ============================================================================

/// Result of a single run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub index: usize,
    pub graph: CandidateGraph,
    pub skeleton: SkeletonStats,
    /// `None` when directionality was skipped.
    pub orientation: Option<OrientationStats>,
}

/// Smallest map found by minimization.
#[derive(Debug, Clone)]
pub struct MinimalMap {
    /// Index of the run that produced it.
    pub run: usize,
    pub graph: CandidateGraph,
}

impl MinimalMap {
    pub fn size(&self) -> usize {
        self.graph.size()
    }
}

/// Totals over every run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnsembleStats {
    pub runs: usize,
    pub tests: u64,
    pub removed_without_evidence: usize,
    pub colliders: usize,
    pub ambiguous_triples: usize,
}

#[derive(Debug, Clone)]
pub struct EnsembleOutcome {
    /// The map of a single-run inference.
    pub graph: Option<CandidateGraph>,
    /// Set when minimization was requested.
    pub minimal: Option<MinimalMap>,
    /// Set when more than one run was performed.
    pub summary: Option<GraphSummary>,
    /// Every run's map in run order, when `keep_runs` is set.
    pub runs: Vec<CandidateGraph>,
    pub stats: EnsembleStats,
    pub warnings: Vec<ConfigWarning>,
}

// ============================================================================
// Accumulator
// ============================================================================

struct Accumulator {
    summary: Option<GraphSummary>,
    minimal: Option<MinimalMap>,
    single: Option<CandidateGraph>,
    kept: Vec<(usize, CandidateGraph)>,
    stats: EnsembleStats,
}

impl Accumulator {
    fn absorb(&mut self, run: RunResult, track_minimal: bool, keep: bool) {
        self.stats.runs += 1;
        self.stats.tests += run.skeleton.tests;
        self.stats.removed_without_evidence += run.skeleton.removed_without_evidence;
        if let Some(orientation) = &run.orientation {
            self.stats.colliders += orientation.colliders;
            self.stats.ambiguous_triples += orientation.ambiguous;
        }

        if track_minimal {
            let size = run.graph.size();
            let better = match &self.minimal {
                None => true,
                Some(best) => size < best.size() || (size == best.size() && run.index < best.run),
            };
            if better {
                if self.minimal.as_ref().is_none_or(|best| size < best.size()) {
                    tracing::info!(run = run.index, size, "new minimal map");
                }
                self.minimal = Some(MinimalMap { run: run.index, graph: run.graph.clone() });
            }
        }

        if keep {
            self.kept.push((run.index, run.graph.clone()));
        }
        if self.summary.is_none() {
            self.single = Some(run.graph);
        }
    }

    /// Count `graph` into the summary, when one is being built.
    #[cfg(not(feature = "parallel"))]
    fn fold_in(&mut self, graph: &CandidateGraph) {
        if let Some(summary) = self.summary.as_mut() {
            summary.fold_in(graph);
        }
    }

    /// Add one worker's partial summary.
    #[cfg(feature = "parallel")]
    fn merge(&mut self, partial: GraphSummary) {
        if let Some(summary) = self.summary.as_mut() {
            summary.merge(partial);
        }
    }
}

// ============================================================================
// Inference
// ============================================================================

/// Evidence prepared for inference: vocabulary fixed, languages partitioned,
/// thresholds set.
pub struct Inference {
    config: InferenceConfig,
    warnings: Vec<ConfigWarning>,
    registry: Arc<ConceptRegistry>,
    samples: SampleSet,
    report: PartitionReport,
    thresholds: ThresholdMatrix,
    seed_graph: CandidateGraph,
}

impl Inference {
    /// Validate `config`, select the vocabulary and partition `records`.
    pub fn prepare(records: &[EvidenceRecord], config: InferenceConfig) -> Result<Self> {
        let warnings = config.validate()?;
        for warning in &warnings {
            tracing::warn!(%warning, "conflicting run options");
        }

        let concepts = select_concepts(records, &config.vocabulary());
        let registry = Arc::new(ConceptRegistry::new(concepts));

        let mut partitioner = Partitioner::new(&registry).with_mode(config.coverage_mode());
        if let Some(languages) = &config.languages {
            partitioner = partitioner.with_languages(languages.iter().cloned());
        }
        let (samples, report) = partitioner.partition(records);

        let thresholds = ThresholdMatrix::uniform(registry.len(), config.link_threshold)?;
        let seed_graph = match config.seeding {
            Seeding::CoOccurrence => CandidateGraph::seeded(Arc::clone(&registry), records),
            Seeding::Complete => CandidateGraph::complete(Arc::clone(&registry)),
        };

        tracing::info!(
            concepts = registry.len(),
            languages = samples.len(),
            candidate_links = seed_graph.size(),
            "evidence prepared"
        );

        Ok(Self { config, warnings, registry, samples, report, thresholds, seed_graph })
    }

    /// Replace the uniform thresholds with a tuned matrix.
    pub fn with_thresholds(mut self, thresholds: ThresholdMatrix) -> Result<Self> {
        if thresholds.len() != self.registry.len() {
            return Err(Error::DimensionMismatch { expected: self.registry.len(), got: thresholds.len() });
        }
        self.thresholds = thresholds;
        Ok(self)
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    pub fn warnings(&self) -> &[ConfigWarning] {
        &self.warnings
    }

    pub fn registry(&self) -> &ConceptRegistry {
        &self.registry
    }

    pub fn samples(&self) -> &SampleSet {
        &self.samples
    }

    pub fn report(&self) -> &PartitionReport {
        &self.report
    }

    pub fn thresholds(&self) -> &ThresholdMatrix {
        &self.thresholds
    }

    /// Perform run `index` alone. Replays exactly the run of the same index
    /// inside [`Inference::run`].
    pub fn run_single(&self, index: usize) -> Result<RunResult> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        rng.set_stream(index as u64);

        let resampled;
        let samples = if self.config.bootstrap {
            resampled = self.samples.resample(&mut rng);
            &resampled
        } else {
            &self.samples
        };

        let oracle = UnitFlowOracle::new(samples, &self.thresholds, self.registry.len())?;
        let mut graph = self.seed_graph.clone();
        let skeleton = infer_skeleton(&mut graph, &oracle, &self.config.skeleton_config(), &mut rng);

        let orientation = if self.config.directionality {
            let mut orientation_config = self.config.orientation_config();
            // never re-test larger sets than the skeleton search reached
            orientation_config.max_conditioning_size = Some(
                orientation_config
                    .max_conditioning_size
                    .map_or(skeleton.max_level, |max| max.min(skeleton.max_level)),
            );
            Some(orient(&mut graph, &oracle, &orientation_config))
        } else {
            graph.convert_undetermined_to_plain();
            None
        };

        tracing::debug!(run = index, links = graph.size(), tests = skeleton.tests, "run finished");
        Ok(RunResult { index, graph, skeleton, orientation })
    }

    /// Perform every run and collect the outcome.
    pub fn run(&self) -> Result<EnsembleOutcome> {
        let runs = self.config.effective_runs();
        let track_minimal = self.config.minimize;
        let keep = self.config.keep_runs;
        tracing::info!(
            runs,
            bootstrap = self.config.bootstrap,
            minimize = track_minimal,
            directionality = self.config.directionality,
            "starting inference"
        );

        let accumulator = Mutex::new(Accumulator {
            summary: (runs > 1).then(|| GraphSummary::new(Arc::clone(&self.registry))),
            minimal: None,
            single: None,
            kept: Vec::new(),
            stats: EnsembleStats::default(),
        });

        // each rayon worker counts its runs into a partial summary, merged
        // under the lock once the worker's share is done
        #[cfg(feature = "parallel")]
        (0..runs)
            .into_par_iter()
            .try_fold(
                || (runs > 1).then(|| GraphSummary::new(Arc::clone(&self.registry))),
                |mut partial, index| -> Result<Option<GraphSummary>> {
                    let result = self.run_single(index)?;
                    if let Some(partial) = partial.as_mut() {
                        partial.fold_in(&result.graph);
                    }
                    accumulator.lock().absorb(result, track_minimal, keep);
                    Ok(partial)
                },
            )
            .try_for_each(|partial| -> Result<()> {
                if let Some(partial) = partial? {
                    accumulator.lock().merge(partial);
                }
                Ok(())
            })?;

        #[cfg(not(feature = "parallel"))]
        (0..runs).try_for_each(|index| -> Result<()> {
            let result = self.run_single(index)?;
            let mut accumulator = accumulator.lock();
            accumulator.fold_in(&result.graph);
            accumulator.absorb(result, track_minimal, keep);
            Ok(())
        })?;

        let mut accumulator = accumulator.into_inner();
        accumulator.kept.sort_by_key(|(index, _)| *index);

        if let Some(minimal) = &accumulator.minimal {
            tracing::info!(run = minimal.run, size = minimal.size(), "minimal map selected");
        }
        tracing::info!(
            runs = accumulator.stats.runs,
            tests = accumulator.stats.tests,
            "inference finished"
        );

        Ok(EnsembleOutcome {
            graph: accumulator.single,
            minimal: accumulator.minimal,
            summary: accumulator.summary,
            runs: accumulator.kept.into_iter().map(|(_, graph)| graph).collect(),
            stats: accumulator.stats,
            warnings: self.warnings.clone(),
        })
    }
}

/// Prepare `records` under `config` and run the inference.
pub fn infer(records: &[EvidenceRecord], config: InferenceConfig) -> Result<EnsembleOutcome> {
    Inference::prepare(records, config)?.run()
}
