//! Simulation errors.

use weft_graph::GraphError;

/// Errors raised while scheduling or propagating signal changes.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A graph-level error surfaced through a simulator entry point.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A single timestamp exceeded the configured delta-cycle budget,
    /// which indicates a combinational cycle that does not settle.
    #[error("delta cycle limit exceeded at {fs} fs (max {max_deltas}): combinational cycle did not settle")]
    DeltaCycleLimit {
        /// The timestamp at which the budget ran out.
        fs: u64,
        /// The configured budget.
        max_deltas: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_limit_display() {
        let e = SimError::DeltaCycleLimit {
            fs: 1000,
            max_deltas: 64,
        };
        assert_eq!(
            e.to_string(),
            "delta cycle limit exceeded at 1000 fs (max 64): combinational cycle did not settle"
        );
    }

    #[test]
    fn graph_errors_pass_through() {
        let e = SimError::from(GraphError::NotBuilt {
            module: "top".into(),
        });
        assert_eq!(e.to_string(), "module `top` has not been built");
    }
}
