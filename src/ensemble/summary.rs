//! Confidence summary over a batch of graphs.
//!
//! Counts, per unordered pair, how many graphs contained the link and how
//! often each endpoint-mark configuration occurred. Summaries merge by
//! addition, so partial summaries from parallel workers fold together in any
//! order.

use std::collections::BTreeMap;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::graph::CandidateGraph;
use crate::model::{ConceptRegistry, Mark, VarId, ordered_pair};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct EdgeTally {
    present: usize,
    /// (mark at the smaller index, mark at the larger index) → count
    marks: BTreeMap<(Mark, Mark), usize>,
}

/// One summarized link, normalized so that `a < b`.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryEdge {
    pub a: VarId,
    pub b: VarId,
    /// Fraction of graphs containing the link.
    pub confidence: f64,
    /// Observed `(mark_a, mark_b)` configurations with their fraction of
    /// all graphs, most frequent first.
    pub marks: Vec<((Mark, Mark), f64)>,
}

impl SummaryEdge {
    /// Most frequent mark configuration (ties: the smaller configuration).
    pub fn dominant_marks(&self) -> Option<(Mark, Mark)> {
        self.marks.first().map(|(marks, _)| *marks)
    }
}

#[derive(Debug, Clone)]
pub struct GraphSummary {
    registry: Arc<ConceptRegistry>,
    graphs: usize,
    edges: HashMap<(VarId, VarId), EdgeTally>,
}

impl GraphSummary {
    pub fn new(registry: Arc<ConceptRegistry>) -> Self {
        Self { registry, graphs: 0, edges: HashMap::new() }
    }

    pub fn registry(&self) -> &ConceptRegistry {
        &self.registry
    }

    /// Number of graphs folded in.
    pub fn graphs(&self) -> usize {
        self.graphs
    }

    /// Count every link and mark configuration of `graph`.
    pub fn fold_in(&mut self, graph: &CandidateGraph) {
        self.graphs += 1;
        for link in graph.links() {
            let tally = self.edges.entry(link.pair()).or_default();
            tally.present += 1;
            *tally.marks.entry((link.mark_a, link.mark_b)).or_insert(0) += 1;
        }
    }

    /// Add the counts of `other` (built over the same registry).
    pub fn merge(&mut self, other: GraphSummary) {
        self.graphs += other.graphs;
        for (pair, tally) in other.edges {
            let mine = self.edges.entry(pair).or_default();
            mine.present += tally.present;
            for (marks, count) in tally.marks {
                *mine.marks.entry(marks).or_insert(0) += count;
            }
        }
    }

    fn fraction(&self, count: usize) -> f64 {
        if self.graphs == 0 { 0.0 } else { count as f64 / self.graphs as f64 }
    }

    /// Fraction of graphs in which `i — j` was present.
    pub fn confidence(&self, i: VarId, j: VarId) -> f64 {
        let present = self.edges.get(&ordered_pair(i, j)).map_or(0, |t| t.present);
        self.fraction(present)
    }

    /// Fraction of graphs in which `i — j` was present with `mark_i` at the
    /// `i` end and `mark_j` at the `j` end.
    pub fn mark_confidence(&self, i: VarId, j: VarId, mark_i: Mark, mark_j: Mark) -> f64 {
        let key = if i <= j { (mark_i, mark_j) } else { (mark_j, mark_i) };
        let count = self
            .edges
            .get(&ordered_pair(i, j))
            .and_then(|t| t.marks.get(&key))
            .copied()
            .unwrap_or(0);
        self.fraction(count)
    }

    /// Every link seen at least once, in index order.
    pub fn edges(&self) -> Vec<SummaryEdge> {
        let mut pairs: Vec<&(VarId, VarId)> = self.edges.keys().collect();
        pairs.sort_unstable();
        pairs
            .into_iter()
            .map(|&(a, b)| {
                let tally = &self.edges[&(a, b)];
                let mut marks: Vec<((Mark, Mark), f64)> =
                    tally.marks.iter().map(|(m, &c)| (*m, self.fraction(c))).collect();
                // stable sort keeps BTreeMap order among equal fractions
                marks.sort_by(|x, y| y.1.total_cmp(&x.1));
                SummaryEdge { a, b, confidence: self.fraction(tally.present), marks }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Arc<ConceptRegistry> {
        Arc::new(ConceptRegistry::new(["A", "B", "C"]))
    }

    fn path(registry: &Arc<ConceptRegistry>, with_ac: bool) -> CandidateGraph {
        let mut graph = CandidateGraph::empty(Arc::clone(registry));
        graph.add_link(0, 1);
        graph.add_link(1, 2);
        if with_ac {
            graph.add_link(0, 2);
        }
        graph.set_mark(0, 1, Mark::Arrow);
        graph
    }

    #[test]
    fn test_confidence_is_fraction_of_graphs() {
        let registry = registry();
        let mut summary = GraphSummary::new(Arc::clone(&registry));
        summary.fold_in(&path(&registry, true));
        summary.fold_in(&path(&registry, false));
        summary.fold_in(&path(&registry, false));
        summary.fold_in(&path(&registry, false));
        assert_eq!(summary.graphs(), 4);
        assert_eq!(summary.confidence(1, 0), 1.0);
        assert_eq!(summary.confidence(0, 2), 0.25);
        assert_eq!(summary.mark_confidence(0, 1, Mark::Circle, Mark::Arrow), 1.0);
        assert_eq!(summary.mark_confidence(1, 0, Mark::Arrow, Mark::Circle), 1.0);
        assert_eq!(summary.mark_confidence(0, 1, Mark::Arrow, Mark::Circle), 0.0);
    }

    #[test]
    fn test_merge_matches_sequential_fold() {
        let registry = registry();
        let mut whole = GraphSummary::new(Arc::clone(&registry));
        let mut left = GraphSummary::new(Arc::clone(&registry));
        let mut right = GraphSummary::new(Arc::clone(&registry));
        for (idx, with_ac) in [true, false, true].into_iter().enumerate() {
            let graph = path(&registry, with_ac);
            whole.fold_in(&graph);
            if idx == 0 { left.fold_in(&graph) } else { right.fold_in(&graph) }
        }
        left.merge(right);
        assert_eq!(left.graphs(), whole.graphs());
        assert_eq!(left.edges(), whole.edges());
    }

    #[test]
    fn test_empty_summary_has_zero_confidence() {
        let summary = GraphSummary::new(registry());
        assert_eq!(summary.confidence(0, 1), 0.0);
        assert!(summary.edges().is_empty());
    }

    #[test]
    fn test_edges_order_marks_by_frequency() {
        let registry = registry();
        let mut summary = GraphSummary::new(Arc::clone(&registry));
        let mut plain = path(&registry, false);
        plain.convert_undetermined_to_plain();
        summary.fold_in(&plain);
        summary.fold_in(&plain);
        summary.fold_in(&path(&registry, false));
        let edges = summary.edges();
        assert_eq!(edges[0].dominant_marks(), Some((Mark::Tail, Mark::Arrow)));
    }
}
