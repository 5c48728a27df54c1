//! Co-simulation errors.

use weft_sim::SimError;
use weft_synth::SynthError;

/// Errors raised while running vectors or cross-checking against the
/// reference simulator.
#[derive(Debug, thiserror::Error)]
pub enum CosimError {
    /// An output disagreed with the vector's expectation.
    #[error("vector {index}: output `{signal}` expected {expected}, got {actual}")]
    VectorMismatch {
        /// Index of the failing vector.
        index: usize,
        /// The compared output port.
        signal: String,
        /// Expected value.
        expected: String,
        /// Observed value.
        actual: String,
    },

    /// A vector referenced a port the top module does not have.
    #[error("top module has no port named `{port}`")]
    UnknownPort {
        /// The missing port name.
        port: String,
    },

    /// The external reference simulator could not be started.
    #[error("reference simulator `{tool}` is not available: {reason}")]
    ReferenceUnavailable {
        /// The binary that failed to start.
        tool: String,
        /// The underlying failure.
        reason: String,
    },

    /// The reference simulator ran and disagreed or crashed.
    #[error("reference simulation failed:\n{output}")]
    ReferenceFailed {
        /// Combined stdout/stderr of the failing run.
        output: String,
    },

    /// A simulation error surfaced while applying vectors.
    #[error(transparent)]
    Sim(#[from] SimError),

    /// An emission error surfaced while generating HDL for the
    /// reference run.
    #[error(transparent)]
    Synth(#[from] SynthError),

    /// Filesystem or process I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
