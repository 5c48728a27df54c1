//! The weft hardware graph: signals, modules, behavioral IR, and the
//! build trace that discovers the module hierarchy.
//!
//! User code constructs a design through a [`DesignContext`]: create
//! signals, register module ports, wire connections, attach always
//! blocks. Nothing registers sub-modules explicitly: after construction,
//! [`DesignContext::build`] traces the signal graph from the root
//! module's ports and derives the containment tree from connectivity
//! alone.
//!
//! # Modules
//!
//! - `arena` — dense ID-indexed storage
//! - `ids` — opaque ID newtypes
//! - `error` — construction/access errors
//! - `expr` — expression trees over signals
//! - `stmt` — conditional IR (`if`/`case`/assign)
//! - `signal` — signal entities and drivers
//! - `context` — the design context and signal-level DSL
//! - `module` — modules, ports, and the build trace
//! - `process` — always blocks
//! - `interface` — direction-tagged port bundles

#![warn(missing_docs)]

pub mod arena;
pub mod context;
pub mod error;
pub mod expr;
pub mod ids;
pub mod interface;
pub mod module;
pub mod process;
pub mod signal;
pub mod stmt;

pub use context::DesignContext;
pub use error::GraphError;
pub use expr::{BinaryOp, Expr, UnaryOp};
pub use ids::{ModuleId, ProcessId, SignalId};
pub use interface::{DirectionTag, Interface, InterfacePort};
pub use module::{is_valid_identifier, sanitize_identifier, Module};
pub use process::{Process, ProcessKind};
pub use signal::{Driver, Signal};
pub use stmt::{CaseItem, CaseKind, ConditionalType, IfArm, Stmt};
