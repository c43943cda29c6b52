//! Discrete unit-flow independence test.
//!
//! Every colexification class attesting both `x` and `y` demands one unit
//! of flow between them: the class only stays connected in the semantic map
//! if `x` reaches `y`. The unit is *explained away* when the current
//! candidate graph already routes it through class members drawn from the
//! conditioning set, without the direct link `x — y`:
//!
//! ```text
//!   class {x, s, y},  S = {s},  graph x — s — y  ⇒  routed, contributes 0
//!   class {x, y},     S = {s}                    ⇒  unrouted, contributes 1
//! ```
//!
//! `flow(x, y | S)` is the number of unrouted classes over every language in
//! the sample (bootstrap duplicates count once per draw). The pair is
//! independent when `flow ≤ threshold(x, y)`.
//!
//! Properties:
//! - symmetric: routes are undirected, so `flow(x, y | S) = flow(y, x | S)`;
//! - monotone: adding members to `S` only adds routes, so flow never grows;
//! - with `S = ∅` flow equals the raw co-attestation count.

use crate::graph::{CandidateGraph, SepSet};
use crate::model::VarId;
use crate::partition::{ColexClass, SampleSet};
use crate::{Error, Result};
use super::{IndependenceOracle, ThresholdMatrix, Verdict};

pub struct UnitFlowOracle<'s> {
    classes: Vec<&'s ColexClass>,
    /// var → ascending indices into `classes`
    occurrences: Vec<Vec<u32>>,
    thresholds: &'s ThresholdMatrix,
}

impl<'s> UnitFlowOracle<'s> {
    /// Index the sample for `var_count` variables.
    pub fn new(samples: &'s SampleSet, thresholds: &'s ThresholdMatrix, var_count: usize) -> Result<Self> {
        if thresholds.len() != var_count {
            return Err(Error::DimensionMismatch { expected: var_count, got: thresholds.len() });
        }

        let classes: Vec<&ColexClass> = samples.iter().flat_map(|l| l.classes.iter()).collect();
        let mut occurrences = vec![Vec::new(); var_count];
        for (idx, class) in classes.iter().enumerate() {
            for &var in &class.concepts {
                if let Some(list) = occurrences.get_mut(var) {
                    list.push(idx as u32);
                }
            }
        }

        Ok(Self { classes, occurrences, thresholds })
    }

    /// Number of classes attesting `var`.
    pub fn attestations(&self, var: VarId) -> usize {
        self.occurrences.get(var).map_or(0, Vec::len)
    }

    /// Classes attesting both `x` and `y`.
    fn shared_classes(&self, x: VarId, y: VarId) -> impl Iterator<Item = &'s ColexClass> + '_ {
        let (a, b) = (&self.occurrences[x], &self.occurrences[y]);
        let (mut i, mut j) = (0, 0);
        std::iter::from_fn(move || {
            while i < a.len() && j < b.len() {
                match a[i].cmp(&b[j]) {
                    std::cmp::Ordering::Less => i += 1,
                    std::cmp::Ordering::Greater => j += 1,
                    std::cmp::Ordering::Equal => {
                        let class = self.classes[a[i] as usize];
                        i += 1;
                        j += 1;
                        return Some(class);
                    }
                }
            }
            None
        })
    }

    /// Unexplained flow between `x` and `y` given `conditioning`, or `None`
    /// when either variable has no attestation.
    pub fn flow(&self, graph: &CandidateGraph, x: VarId, y: VarId, conditioning: &[VarId]) -> Option<usize> {
        if self.attestations(x) == 0 || self.attestations(y) == 0 {
            return None;
        }
        let flow = self
            .shared_classes(x, y)
            .filter(|class| !Self::routed(graph, class, x, y, conditioning))
            .count();
        Some(flow)
    }

    fn routed(graph: &CandidateGraph, class: &ColexClass, x: VarId, y: VarId, conditioning: &[VarId]) -> bool {
        if !conditioning.iter().any(|&s| class.contains(s)) {
            return false;
        }
        graph.connects_avoiding_link(x, y, |v| class.contains(v) && conditioning.contains(&v))
    }
}

impl IndependenceOracle for UnitFlowOracle<'_> {
    fn test(&self, graph: &CandidateGraph, x: VarId, y: VarId, conditioning: &[VarId]) -> Verdict {
        let Some(flow) = self.flow(graph, x, y, conditioning) else {
            tracing::trace!(x, y, "no evidence for pair");
            return Verdict::NoEvidence;
        };
        let threshold = self.thresholds.get(x, y);
        tracing::trace!(x, y, ?conditioning, flow, threshold, "unit flow");
        if flow as f64 <= threshold {
            let separating_set: SepSet = conditioning.iter().copied().collect();
            Verdict::Independent { flow, separating_set }
        } else {
            Verdict::Dependent { flow }
        }
    }
}
