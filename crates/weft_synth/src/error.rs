//! Emission-time validation errors.
//!
//! Synthesis errors carry the hierarchical path of the offending module
//! instance (`top.stage_1` style) so a failure in a deep design names the
//! instance, not just the type.

use weft_graph::GraphError;

/// Errors raised while validating or emitting a built design.
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    /// A graph-level error surfaced through a synthesis entry point.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A signal is assigned by more than one sequential block.
    #[error("`{path}` assigns `{signal}` from more than one sequential block")]
    MultipleDrivers {
        /// Hierarchical path of the offending module instance.
        path: String,
        /// The multiply driven signal.
        signal: String,
    },

    /// A `unique` case has two patterns that can match the same selector
    /// value.
    #[error("unique case in `{path}` has overlapping patterns")]
    CaseOverlap {
        /// Hierarchical path of the offending module instance.
        path: String,
    },

    /// A `priority` case has no default and its patterns do not cover
    /// every selector value.
    #[error("priority case in `{path}` does not cover every selector value and has no default")]
    CaseNotExhaustive {
        /// Hierarchical path of the offending module instance.
        path: String,
    },
}
