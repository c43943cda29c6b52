//! # Skeleton Inference
//!
//! Constraint-based pruning of the candidate graph (PC-family search that
//! does not assume acyclicity). Passes run over growing conditioning-set
//! sizes ℓ = 0, 1, 2, …:
//!
//! ```text
//!   for each surviving link x — y (fixed or shuffled order):
//!       for each side (x, y), (y, x):
//!           candidates = neighbors(x) \ {y}     (frozen per pass when stable)
//!           for each ℓ-subset S of candidates:
//!               oracle says x ⫫ y | S  ⇒  remove x — y, record S, next link
//!   stop when no link has ℓ candidates on either side
//! ```
//!
//! The search only removes links; marks are left to the orientation stage.
//! Under non-stable ordering the result depends on the processing order when
//! several minimal separating sets exist, which is what randomized
//! minimization explores.

pub mod combinations;

use hashbrown::HashSet;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::graph::{CandidateGraph, SepSet};
use crate::model::VarId;
use crate::oracle::{IndependenceOracle, Verdict};

pub use combinations::Combinations;

// ============================================================================
// Configuration
// ============================================================================

/// Order in which links are visited within one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EdgeOrder {
    /// Ascending by variable index.
    #[default]
    Fixed,
    /// A fresh random permutation per pass.
    Random,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkeletonConfig {
    /// Draw conditioning candidates from a neighbor snapshot taken at the
    /// start of each pass.
    pub stable: bool,
    pub order: EdgeOrder,
    /// Upper bound on ℓ (`None` = until no link has enough candidates).
    pub max_conditioning_size: Option<usize>,
    /// Only condition on neighbors that still lie on a path to the other end.
    pub restrict_to_paths: bool,
}

impl Default for SkeletonConfig {
    fn default() -> Self {
        Self {
            stable: true,
            order: EdgeOrder::Fixed,
            max_conditioning_size: None,
            restrict_to_paths: true,
        }
    }
}

/// Counters for one skeleton search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkeletonStats {
    /// Oracle evaluations.
    pub tests: u64,
    /// Links removed.
    pub removed: usize,
    /// Links removed because a variable had no evidence at all.
    pub removed_without_evidence: usize,
    /// Largest conditioning-set size that was tested.
    pub max_level: usize,
}

// ============================================================================
// Search
// ============================================================================

/// Prune `graph` in place and record a separating set for every removed link.
pub fn infer_skeleton<O, R>(
    graph: &mut CandidateGraph,
    oracle: &O,
    config: &SkeletonConfig,
    rng: &mut R,
) -> SkeletonStats
where
    O: IndependenceOracle + ?Sized,
    R: Rng + ?Sized,
{
    let mut stats = SkeletonStats::default();
    let mut level = 0;

    loop {
        let frozen = config.stable.then(|| graph.adjacency_snapshot());
        let mut pairs = graph.pairs();
        if config.order == EdgeOrder::Random {
            pairs.shuffle(rng);
        }

        let mut testable = false;
        for (i, j) in pairs {
            if !graph.has_link(i, j) {
                continue;
            }
            let mut tried: HashSet<SepSet> = HashSet::new();
            // at ℓ = 0 both sides test the same empty set
            let sides = [(i, j), (j, i)];
            let sides = if level == 0 { &sides[..1] } else { &sides[..] };

            for &(x, y) in sides {
                let candidates = conditioning_candidates(graph, frozen.as_deref(), x, y, config.restrict_to_paths);
                if candidates.len() < level {
                    continue;
                }
                testable = true;

                let view: &CandidateGraph = graph;
                let separation = Combinations::new(&candidates, level)
                    .filter(|subset| tried.insert(subset.clone()))
                    .find_map(|subset| {
                        stats.tests += 1;
                        let verdict = oracle.test(view, x, y, &subset);
                        verdict.is_independent().then_some((subset, verdict))
                    });

                if let Some((subset, verdict)) = separation {
                    if verdict == Verdict::NoEvidence {
                        stats.removed_without_evidence += 1;
                        tracing::debug!(x, y, "link dropped, no evidence for one endpoint");
                    } else {
                        tracing::debug!(x, y, separating_set = ?subset.as_slice(), level, "link removed");
                    }
                    let separating_set = verdict.separating_set().unwrap_or(&subset);
                    graph.remove_link(x, y);
                    graph.record_separating_set(x, y, separating_set);
                    stats.removed += 1;
                    break;
                }
            }
        }

        stats.max_level = level;
        tracing::debug!(level, links = graph.size(), "skeleton pass finished");

        if !testable || config.max_conditioning_size.is_some_and(|max| level >= max) {
            break;
        }
        level += 1;
    }

    stats
}

/// Neighbors of `x` (minus `y`) eligible for conditioning the test of `x — y`.
fn conditioning_candidates(
    graph: &CandidateGraph,
    frozen: Option<&[Vec<VarId>]>,
    x: VarId,
    y: VarId,
    restrict_to_paths: bool,
) -> Vec<VarId> {
    let mut candidates: Vec<VarId> = match frozen {
        Some(snapshot) => snapshot[x].iter().copied().filter(|&v| v != y).collect(),
        None => graph.neighbors(x).iter().copied().filter(|&v| v != y).collect(),
    };
    if restrict_to_paths && !candidates.is_empty() {
        let on_path = graph.reachable_avoiding(y, x);
        candidates.retain(|&v| on_path[v]);
    }
    candidates
}

// ============================================================================
// Tests
// ============================================================================
