//! # Data Model
//!
//! Plain data shared by every stage: concepts and their variable indices,
//! evidence records, and the endpoint-mark vocabulary of the candidate graph.
//!
//! Pure data: no I/O, no randomness.

pub mod concept;
pub mod evidence;
pub mod mark;

pub use concept::{ConceptRegistry, VarId};
pub use evidence::{EvidenceRecord, Vocabulary, concept_counts, select_concepts};
pub use mark::{Link, Mark, ordered_pair};
