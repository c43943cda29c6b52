//! # Orientation
//!
//! Assigns endpoint marks to the pruned skeleton.
//!
//! 1. **Colliders.** Every unshielded triple `a — k — b` whose separating
//!    evidence excludes `k` becomes `a *-> k <-* b`. In conservative mode the
//!    minimal separating sets of `(a, b)` are re-derived on the final skeleton;
//!    the triple is a collider only if all of them exclude `k`, a non-collider
//!    if all include `k`, and ambiguous otherwise (its marks stay circles).
//! 2. **Propagation.** Circle marks are resolved to a fixed point:
//!
//! ```text
//!   R1  a *-> b o-* c, a ≁ c, (a,b,c) unambiguous   ⇒  b --> c   (no new collider)
//!   R2  a --> b *-> c  or  a *-> b --> c,  a *-o c  ⇒  a *-> c   (no cycle)
//!   R3  a *-> b <-* c, a *-o d o-* c, a ≁ c, d *-o b ⇒  d *-> b
//! ```
//!
//! Rules only ever rewrite circle marks, so the fixed point is reached and
//! orienting an already oriented graph changes nothing.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::graph::{CandidateGraph, SepSet};
use crate::model::{Mark, VarId};
use crate::oracle::IndependenceOracle;
use crate::skeleton::Combinations;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrientationConfig {
    /// Re-check separating sets and leave conflicting triples ambiguous.
    pub conservative: bool,
    /// Largest conditioning set re-tested in conservative mode.
    pub max_conditioning_size: Option<usize>,
    /// Apply R1–R3 after collider detection.
    pub propagate: bool,
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self { conservative: true, max_conditioning_size: None, propagate: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrientationStats {
    pub colliders: usize,
    pub ambiguous: usize,
    /// Marks set by propagation rules.
    pub propagated: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TripleStatus {
    Collider,
    NonCollider,
    Ambiguous,
}

/// Orient `graph` in place.
pub fn orient<O>(graph: &mut CandidateGraph, oracle: &O, config: &OrientationConfig) -> OrientationStats
where
    O: IndependenceOracle + ?Sized,
{
    let mut stats = OrientationStats::default();

    let mut colliders = Vec::new();
    for (a, k, b) in graph.unshielded_triples() {
        let status = if config.conservative {
            classify_conservative(graph, oracle, a, k, b, config.max_conditioning_size)
        } else {
            classify_recorded(graph, a, k, b)
        };
        match status {
            TripleStatus::Collider => colliders.push((a, k, b)),
            TripleStatus::NonCollider => {}
            TripleStatus::Ambiguous => {
                graph.mark_ambiguous(a, k, b);
                stats.ambiguous += 1;
            }
        }
    }

    for &(a, k, b) in &colliders {
        graph.set_mark(a, k, Mark::Arrow);
        graph.set_mark(b, k, Mark::Arrow);
        tracing::debug!(a, k, b, "collider");
    }
    stats.colliders = colliders.len();

    if config.propagate {
        loop {
            let changed = rule_no_new_collider(graph) + rule_no_cycle(graph) + rule_double_triangle(graph);
            if changed == 0 {
                break;
            }
            stats.propagated += changed;
        }
    }

    tracing::debug!(
        colliders = stats.colliders,
        ambiguous = stats.ambiguous,
        propagated = stats.propagated,
        "orientation finished"
    );
    stats
}

// ============================================================================
// Collider classification
// ============================================================================

fn classify_recorded(graph: &CandidateGraph, a: VarId, k: VarId, b: VarId) -> TripleStatus {
    // pairs never seeded as links are separated by the empty set
    let excluded = graph.separating_set(a, b).is_none_or(|set| !set.contains(&k));
    if excluded { TripleStatus::Collider } else { TripleStatus::NonCollider }
}

fn classify_conservative<O>(
    graph: &CandidateGraph,
    oracle: &O,
    a: VarId,
    k: VarId,
    b: VarId,
    max_size: Option<usize>,
) -> TripleStatus
where
    O: IndependenceOracle + ?Sized,
{
    let separating = minimal_separating_sets(graph, oracle, a, b, max_size);
    if separating.is_empty() {
        return classify_recorded(graph, a, k, b);
    }
    let including = separating.iter().filter(|set| set.contains(&k)).count();
    if including == 0 {
        TripleStatus::Collider
    } else if including == separating.len() {
        TripleStatus::NonCollider
    } else {
        tracing::debug!(a, k, b, sets = separating.len(), including, "ambiguous triple");
        TripleStatus::Ambiguous
    }
}

/// Separating sets of `(a, b)` drawn from either neighborhood that have no
/// separating proper subset.
///
/// Conditioning can only explain flow away, so every superset of a
/// separating set separates as well; only minimal sets carry information.
fn minimal_separating_sets<O>(
    graph: &CandidateGraph,
    oracle: &O,
    a: VarId,
    b: VarId,
    max_size: Option<usize>,
) -> Vec<SepSet>
where
    O: IndependenceOracle + ?Sized,
{
    let mut found: Vec<SepSet> = Vec::new();
    for (x, y) in [(a, b), (b, a)] {
        let candidates: Vec<VarId> = graph.neighbors(x).iter().copied().filter(|&v| v != y).collect();
        let limit = max_size.map_or(candidates.len(), |m| m.min(candidates.len()));
        for size in 0..=limit {
            for subset in Combinations::new(&candidates, size) {
                if found.iter().any(|f| is_subset(f, &subset)) {
                    continue;
                }
                if oracle.test(graph, a, b, &subset).is_independent() {
                    found.push(subset);
                }
            }
        }
    }
    found
}

fn is_subset(small: &[VarId], large: &[VarId]) -> bool {
    small.iter().all(|v| large.contains(v))
}

// ============================================================================
// Propagation rules
// ============================================================================

fn neighbor_list(graph: &CandidateGraph, v: VarId) -> SmallVec<[VarId; 8]> {
    graph.neighbors(v).iter().copied().collect()
}

#[inline]
fn is(graph: &CandidateGraph, from: VarId, to: VarId, mark: Mark) -> bool {
    graph.mark(from, to) == Some(mark)
}

/// R1: away from an arrowhead into `b`, an unambiguous non-collider continues
/// as `b --> c`.
fn rule_no_new_collider(graph: &mut CandidateGraph) -> usize {
    let mut changed = 0;
    for b in 0..graph.var_count() {
        let adj = neighbor_list(graph, b);
        for &a in &adj {
            if !is(graph, a, b, Mark::Arrow) {
                continue;
            }
            for &c in &adj {
                if c == a || graph.has_link(a, c) || !is(graph, c, b, Mark::Circle) || graph.is_ambiguous(a, b, c) {
                    continue;
                }
                graph.set_mark(c, b, Mark::Tail);
                changed += 1;
                if is(graph, b, c, Mark::Circle) {
                    graph.set_mark(b, c, Mark::Arrow);
                    changed += 1;
                }
                tracing::trace!(a, b, c, "R1");
            }
        }
    }
    changed
}

/// R2: a directed path `a → b → c` forces an arrowhead at `c` on `a *-o c`.
fn rule_no_cycle(graph: &mut CandidateGraph) -> usize {
    let mut changed = 0;
    for a in 0..graph.var_count() {
        for c in neighbor_list(graph, a) {
            if !is(graph, a, c, Mark::Circle) {
                continue;
            }
            let forced = neighbor_list(graph, a).into_iter().any(|b| {
                b != c
                    && graph.has_link(b, c)
                    && is(graph, a, b, Mark::Arrow)
                    && is(graph, b, c, Mark::Arrow)
                    && (is(graph, b, a, Mark::Tail) || is(graph, c, b, Mark::Tail))
            });
            if forced {
                graph.set_mark(a, c, Mark::Arrow);
                changed += 1;
                tracing::trace!(a, c, "R2");
            }
        }
    }
    changed
}

/// R3: two arrowheads into `b` from non-adjacent `a`, `c`, both joined to `d`
/// by circle-ended links, force `d *-> b`.
fn rule_double_triangle(graph: &mut CandidateGraph) -> usize {
    let mut changed = 0;
    for d in 0..graph.var_count() {
        let adj_d = neighbor_list(graph, d);
        for &b in &adj_d {
            if !is(graph, d, b, Mark::Circle) {
                continue;
            }
            let parents: SmallVec<[VarId; 8]> = adj_d
                .iter()
                .copied()
                .filter(|&v| {
                    v != b
                        && graph.has_link(v, b)
                        && is(graph, v, b, Mark::Arrow)
                        && is(graph, v, d, Mark::Circle)
                })
                .collect();
            let forced = parents.iter().enumerate().any(|(idx, &a)| {
                parents[idx + 1..].iter().any(|&c| !graph.has_link(a, c))
            });
            if forced {
                graph.set_mark(d, b, Mark::Arrow);
                changed += 1;
                tracing::trace!(d, b, "R3");
            }
        }
    }
    changed
}

// ============================================================================
// Tests
// ============================================================================
