//! # Independence Oracle
//!
//! `IndependenceOracle` is the contract between the structure search and
//! the evidence. The search never looks at samples directly; it asks the
//! oracle whether `x` and `y` are independent given a conditioning set,
//! against the current state of the candidate graph.
//!
//! ## Implementations
//!
//! | Oracle | Module | Description |
//! |--------|--------|-------------|
//! | `UnitFlowOracle` | `unit_flow` | Discrete unit-flow test over colexification classes |

pub mod threshold;
pub mod unit_flow;

use crate::graph::{CandidateGraph, SepSet};
use crate::model::VarId;

pub use threshold::ThresholdMatrix;
pub use unit_flow::UnitFlowOracle;

/// Outcome of one conditional independence test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The evidence keeps `x` and `y` associated.
    Dependent { flow: usize },
    /// The association is explained away by `separating_set`.
    Independent { flow: usize, separating_set: SepSet },
    /// One of the variables has no attestation at all; treated as
    /// independent given the empty set.
    NoEvidence,
}

impl Verdict {
    pub fn is_independent(&self) -> bool {
        !matches!(self, Verdict::Dependent { .. })
    }

    /// The conditioning set that justifies removal, if the pair is independent.
    pub fn separating_set(&self) -> Option<&[VarId]> {
        match self {
            Verdict::Dependent { .. } => None,
            Verdict::Independent { separating_set, .. } => Some(separating_set.as_slice()),
            Verdict::NoEvidence => Some(&[] as &[VarId]),
        }
    }
}

/// Conditional independence test used by skeleton inference and orientation.
///
/// Implementations must be symmetric in `x`/`y`, and conditioning may only
/// explain association away: growing the conditioning set must never turn
/// an independent verdict into a dependent one.
pub trait IndependenceOracle {
    fn test(&self, graph: &CandidateGraph, x: VarId, y: VarId, conditioning: &[VarId]) -> Verdict;
}

impl<O: IndependenceOracle + ?Sized> IndependenceOracle for &O {
    fn test(&self, graph: &CandidateGraph, x: VarId, y: VarId, conditioning: &[VarId]) -> Verdict {
        (**self).test(graph, x, y, conditioning)
    }
}
