//! # semantic-map — Semantic Map Inference from Colexification Data
//!
//! Infers a graph over concepts whose links represent conceptual proximity,
//! from cross-linguistic colexifications (one word form covering several
//! concepts). Links are pruned by a constraint-based causal search over a
//! discrete unit-flow independence test, then optionally oriented.
//!
//! ## Pipeline
//!
//! 1. **Partition**: evidence records → per-language colexification classes
//! 2. **Seed**: fully linked candidate graph, every mark a circle
//! 3. **Skeleton**: remove links whose flow is explained by a conditioning set
//! 4. **Orient**: colliders + mark propagation, or plain undirected lines
//! 5. **Ensemble**: bootstrap confidence and randomized minimal-map search
//!
//! ## Quick Start
//!
//! ```rust
//! use semantic_map::{EvidenceRecord, InferenceConfig, infer};
//!
//! # fn example() -> semantic_map::Result<()> {
//! let records = vec![
//!     EvidenceRecord::new("deu", "Holz", ["WOOD", "TREE"]),
//!     EvidenceRecord::new("fra", "bois", ["WOOD", "FOREST"]),
//! ];
//! let outcome = infer(&records, InferenceConfig::default())?;
//! if let Some(map) = outcome.graph {
//!     semantic_map::export::write_text(&map, &mut std::io::stdout())?;
//! }
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `parallel` | Distribute ensemble runs over the rayon pool |
//! | `cli` | The `semmap` command-line binary |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod graph;
pub mod partition;
pub mod oracle;
pub mod skeleton;
pub mod orient;
pub mod ensemble;
pub mod config;
pub mod io;
pub mod export;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    ConceptRegistry, VarId, EvidenceRecord, Vocabulary,
    Link, Mark,
};

// ============================================================================
// Re-exports: Engine
// ============================================================================

pub use graph::{CandidateGraph, SepSet};
pub use partition::{CoverageMode, PartitionReport, Partitioner, SampleSet};
pub use oracle::{IndependenceOracle, ThresholdMatrix, UnitFlowOracle, Verdict};
pub use skeleton::{EdgeOrder, SkeletonConfig, SkeletonStats, infer_skeleton};
pub use orient::{OrientationConfig, OrientationStats, orient};

// ============================================================================
// Re-exports: Orchestration
// ============================================================================

pub use config::{ConfigWarning, InferenceConfig, Seeding};
pub use ensemble::{EnsembleOutcome, GraphSummary, Inference, MinimalMap, infer};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed input in {source_name} at line {line}: {message}")]
    MalformedInput { source_name: String, line: usize, message: String },

    #[error("Unknown concept: {0}")]
    UnknownConcept(String),

    #[error("Invalid threshold for ({i}, {j}): {value}")]
    InvalidThreshold { i: VarId, j: VarId, value: f64 },

    #[error("Dimension mismatch: expected {expected} variables, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
