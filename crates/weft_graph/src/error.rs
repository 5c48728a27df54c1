//! Construction and access errors for the hardware graph.
//!
//! Every error is an unrecoverable failure of the current construction
//! session, surfaced at the boundary of the user-facing operation that
//! caused it; there is no local recovery.

/// Errors raised while constructing, tracing, or inspecting a design.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A second source was connected to a signal that already has one.
    #[error("signal `{signal}` already has a driver; cannot connect a second source")]
    DriverConflict {
        /// Name of the doubly driven signal.
        signal: String,
    },

    /// Graph tracing reached a port with disallowed polarity or crossed an
    /// unexpected module boundary.
    #[error("port violation while tracing `{module}`: {reason}")]
    PortViolation {
        /// Name of the module whose trace failed.
        module: String,
        /// What the trace encountered.
        reason: String,
    },

    /// A declared width disagrees with the width actually found.
    #[error("width mismatch for `{name}`: expected {expected} bits, found {found}")]
    WidthMismatch {
        /// Name of the signal or port involved.
        name: String,
        /// The declared or required width.
        expected: u32,
        /// The width actually present.
        found: u32,
    },

    /// A name does not satisfy `[A-Za-z_][A-Za-z0-9_]*`.
    #[error("`{name}` is not a legal HDL identifier")]
    InvalidIdentifier {
        /// The rejected name.
        name: String,
    },

    /// A port name already exists within the module or interface.
    #[error("`{scope}` already has a port named `{port}`")]
    DuplicatePort {
        /// The module or interface owning the clashing port.
        scope: String,
        /// The duplicated port name.
        port: String,
    },

    /// `build` was called on a module that has already been built.
    #[error("module `{module}` has already been built")]
    AlreadyBuilt {
        /// Name of the module.
        module: String,
    },

    /// Hierarchy information was requested before `build`.
    #[error("module `{module}` has not been built")]
    NotBuilt {
        /// Name of the module.
        module: String,
    },

    /// An integer conversion was attempted on a value containing X or Z.
    #[error("value {value} contains X or Z bits; integer conversion is undefined")]
    XZPropagation {
        /// Display form of the offending value.
        value: String,
    },

    /// An interface port was tagged as both input and output in one
    /// `connect_io` call.
    #[error("interface port `{port}` is tagged as both input and output")]
    AmbiguousDirection {
        /// The ambiguous port name.
        port: String,
    },
}
