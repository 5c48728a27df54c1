//! SystemVerilog emission for built weft designs.
//!
//! The synthesizer walks a post-build module tree and emits one module
//! definition per unique *type signature* (a content hash over the
//! module's canonical structure), so structurally identical instances
//! share a definition. Emission validates what the graph cannot: a
//! signal targeted by two sequential blocks, overlapping `unique` case
//! patterns, and non-exhaustive `priority` cases without defaults, each
//! reported with the offending instance's hierarchical path.
//!
//! # Modules
//!
//! - `error` — emission-time validation errors
//! - `signature` — module type-signature hashing
//! - `sv` — the SystemVerilog emitter

#![warn(missing_docs)]

pub mod error;
pub mod signature;
pub mod sv;

pub use error::SynthError;
pub use signature::type_signature;
pub use sv::{emit_design, MODULE_DELIMITER};
