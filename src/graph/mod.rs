//! # Candidate Graph
//!
//! The mixed-mark graph shared and mutated by skeleton inference and
//! orientation. Every unordered pair of variables is either unlinked or
//! linked with two independently settable endpoint marks.
//!
//! ```text
//!   marks[from * n + to]  = mark at the `to` end of link from — to
//!   adjacency[v]          = sorted neighbor set of v
//!   separating_sets       = (i, j) → conditioning set that removed i — j
//! ```
//!
//! A graph is owned by exactly one run. Ensembles build one graph per run;
//! only the concept registry is shared, read-only, behind an `Arc`.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::model::{ConceptRegistry, EvidenceRecord, Link, Mark, VarId, ordered_pair};

/// Conditioning set that justified removing a link.
pub type SepSet = SmallVec<[VarId; 4]>;

/// Unshielded triple `a — k — b` with `a < b`.
pub type Triple = (VarId, VarId, VarId);

// ============================================================================
// CandidateGraph
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateGraph {
    registry: Arc<ConceptRegistry>,
    marks: Vec<Option<Mark>>,
    adjacency: Vec<BTreeSet<VarId>>,
    separating_sets: HashMap<(VarId, VarId), SepSet>,
    ambiguous_triples: BTreeSet<Triple>,
}

impl CandidateGraph {
    /// Graph over the registry's variables without any links.
    pub fn empty(registry: Arc<ConceptRegistry>) -> Self {
        let n = registry.len();
        Self {
            registry,
            marks: vec![None; n * n],
            adjacency: vec![BTreeSet::new(); n],
            separating_sets: HashMap::new(),
            ambiguous_triples: BTreeSet::new(),
        }
    }

    /// Fully connected graph, all marks undetermined.
    pub fn complete(registry: Arc<ConceptRegistry>) -> Self {
        let mut graph = Self::empty(registry);
        let n = graph.var_count();
        for i in 0..n {
            for j in (i + 1)..n {
                graph.add_link(i, j);
            }
        }
        graph
    }

    /// Link every two vocabulary concepts that share at least one record.
    ///
    /// Concepts outside the registry are ignored.
    pub fn seeded(registry: Arc<ConceptRegistry>, records: &[EvidenceRecord]) -> Self {
        let mut graph = Self::empty(registry);
        for record in records {
            let vars: SmallVec<[VarId; 8]> = record
                .concepts
                .iter()
                .filter_map(|c| graph.registry.get(c))
                .collect();
            for (idx, &i) in vars.iter().enumerate() {
                for &j in &vars[idx + 1..] {
                    graph.add_link(i, j);
                }
            }
        }
        graph
    }

    pub fn registry(&self) -> &ConceptRegistry {
        &self.registry
    }

    pub fn shared_registry(&self) -> Arc<ConceptRegistry> {
        Arc::clone(&self.registry)
    }

    /// Number of variables.
    pub fn var_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of surviving links, regardless of marks.
    pub fn size(&self) -> usize {
        self.adjacency.iter().map(BTreeSet::len).sum::<usize>() / 2
    }

    #[inline]
    fn slot(&self, from: VarId, to: VarId) -> usize {
        from * self.var_count() + to
    }

    #[inline]
    fn in_range(&self, v: VarId) -> bool {
        v < self.var_count()
    }

    // ========================================================================
    // Links
    // ========================================================================

    /// Insert `i — j` with circle marks at both ends. Returns `false` if the
    /// link already existed or the pair is invalid.
    pub fn add_link(&mut self, i: VarId, j: VarId) -> bool {
        if i == j || !self.in_range(i) || !self.in_range(j) || self.has_link(i, j) {
            return false;
        }
        let (ij, ji) = (self.slot(i, j), self.slot(j, i));
        self.marks[ij] = Some(Mark::Circle);
        self.marks[ji] = Some(Mark::Circle);
        self.adjacency[i].insert(j);
        self.adjacency[j].insert(i);
        true
    }

    /// Remove `i — j`, clearing both marks. Returns whether a link was removed.
    pub fn remove_link(&mut self, i: VarId, j: VarId) -> bool {
        if !self.has_link(i, j) {
            return false;
        }
        let (ij, ji) = (self.slot(i, j), self.slot(j, i));
        self.marks[ij] = None;
        self.marks[ji] = None;
        self.adjacency[i].remove(&j);
        self.adjacency[j].remove(&i);
        true
    }

    pub fn has_link(&self, i: VarId, j: VarId) -> bool {
        i != j && self.in_range(i) && self.in_range(j) && self.marks[self.slot(i, j)].is_some()
    }

    /// Mark at the `to` end of `from — to`, `None` when unlinked.
    pub fn mark(&self, from: VarId, to: VarId) -> Option<Mark> {
        if !self.in_range(from) || !self.in_range(to) {
            return None;
        }
        self.marks[self.slot(from, to)]
    }

    /// Set the mark at the `to` end of `from — to`. Returns `false` when
    /// the link does not exist (nothing is changed).
    pub fn set_mark(&mut self, from: VarId, to: VarId, mark: Mark) -> bool {
        if !self.has_link(from, to) {
            return false;
        }
        let slot = self.slot(from, to);
        self.marks[slot] = Some(mark);
        true
    }

    /// Sorted neighbor set of `v`.
    pub fn neighbors(&self, v: VarId) -> &BTreeSet<VarId> {
        &self.adjacency[v]
    }

    /// Frozen copy of all neighbor sets (used by the stable skeleton variant).
    pub fn adjacency_snapshot(&self) -> Vec<Vec<VarId>> {
        self.adjacency.iter().map(|adj| adj.iter().copied().collect()).collect()
    }

    /// All links as normalized pairs, in index order.
    pub fn pairs(&self) -> Vec<(VarId, VarId)> {
        let mut pairs = Vec::with_capacity(self.size());
        for (i, adj) in self.adjacency.iter().enumerate() {
            pairs.extend(adj.range(i + 1..).map(|&j| (i, j)));
        }
        pairs
    }

    /// All links with their marks, in index order.
    pub fn links(&self) -> Vec<Link> {
        self.pairs()
            .into_iter()
            .map(|(a, b)| Link {
                a,
                b,
                mark_a: self.marks[self.slot(b, a)].unwrap_or(Mark::Circle),
                mark_b: self.marks[self.slot(a, b)].unwrap_or(Mark::Circle),
            })
            .collect()
    }

    /// Number of circle marks over all link ends.
    pub fn circle_count(&self) -> usize {
        self.marks.iter().filter(|m| **m == Some(Mark::Circle)).count()
    }

    /// Downgrade every remaining circle to a plain tail. Link presence is
    /// unchanged. Returns the number of marks rewritten.
    pub fn convert_undetermined_to_plain(&mut self) -> usize {
        let mut converted = 0;
        for mark in self.marks.iter_mut() {
            if *mark == Some(Mark::Circle) {
                *mark = Some(Mark::Tail);
                converted += 1;
            }
        }
        converted
    }

    // ========================================================================
    // Separating sets and ambiguous triples
    // ========================================================================

    pub fn record_separating_set(&mut self, i: VarId, j: VarId, set: &[VarId]) {
        let mut set: SepSet = set.iter().copied().collect();
        set.sort_unstable();
        self.separating_sets.insert(ordered_pair(i, j), set);
    }

    pub fn separating_set(&self, i: VarId, j: VarId) -> Option<&[VarId]> {
        self.separating_sets.get(&ordered_pair(i, j)).map(SmallVec::as_slice)
    }

    pub fn mark_ambiguous(&mut self, a: VarId, k: VarId, b: VarId) {
        let (a, b) = ordered_pair(a, b);
        self.ambiguous_triples.insert((a, k, b));
    }

    pub fn is_ambiguous(&self, a: VarId, k: VarId, b: VarId) -> bool {
        let (a, b) = ordered_pair(a, b);
        self.ambiguous_triples.contains(&(a, k, b))
    }

    pub fn ambiguous_triples(&self) -> impl Iterator<Item = &Triple> {
        self.ambiguous_triples.iter()
    }

    /// Every unshielded triple `a — k — b` (`a < b`, `a` and `b` unlinked).
    pub fn unshielded_triples(&self) -> Vec<Triple> {
        let mut triples = Vec::new();
        for (k, adj) in self.adjacency.iter().enumerate() {
            let adj: Vec<VarId> = adj.iter().copied().collect();
            for (idx, &a) in adj.iter().enumerate() {
                for &b in &adj[idx + 1..] {
                    if !self.has_link(a, b) {
                        triples.push((a, k, b));
                    }
                }
            }
        }
        triples
    }

    // ========================================================================
    // Reachability
    // ========================================================================

    /// Nodes reachable from `start` without passing through `blocked`.
    pub fn reachable_avoiding(&self, start: VarId, blocked: VarId) -> Vec<bool> {
        let mut seen = vec![false; self.var_count()];
        if !self.in_range(start) || start == blocked {
            return seen;
        }
        let mut queue = VecDeque::new();
        seen[start] = true;
        queue.push_back(start);
        while let Some(v) = queue.pop_front() {
            for &w in &self.adjacency[v] {
                if w != blocked && !seen[w] {
                    seen[w] = true;
                    queue.push_back(w);
                }
            }
        }
        seen
    }

    /// Whether `to` is reachable from `from` without using the direct link
    /// `from — to`, passing only through intermediate nodes accepted by
    /// `via`.
    pub fn connects_avoiding_link<F>(&self, from: VarId, to: VarId, via: F) -> bool
    where
        F: Fn(VarId) -> bool,
    {
        if from == to || !self.in_range(from) || !self.in_range(to) {
            return false;
        }
        let mut seen = vec![false; self.var_count()];
        let mut queue = VecDeque::new();
        seen[from] = true;
        queue.push_back(from);
        while let Some(v) = queue.pop_front() {
            for &w in &self.adjacency[v] {
                if seen[w] {
                    continue;
                }
                if w == to {
                    if v != from {
                        return true;
                    }
                    continue;
                }
                if via(w) {
                    seen[w] = true;
                    queue.push_back(w);
                }
            }
        }
        false
    }
}

// ============================================================================
// Tests
// ============================================================================
