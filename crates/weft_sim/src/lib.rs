//! Event-driven simulator for weft hardware graphs.
//!
//! The simulator evaluates the same in-memory graph that the synthesizer
//! emits: drive input signals, advance virtual time, observe outputs.
//! Propagation is delta-cycle accurate (combinational re-evaluation and
//! glitch fan-out at a timestamp complete before time moves on), and
//! sequential blocks fire on rising clock edges with non-blocking update
//! semantics.
//!
//! # Usage
//!
//! ```ignore
//! use weft_sim::{SimConfig, SimKernel};
//!
//! let mut kernel = SimKernel::new(&ctx, SimConfig::default());
//! let clock = kernel.add_clock(&mut ctx, "clk", 5_000)?;
//! kernel.drive(&ctx, enable, LogicVec::from_bool(true))?;
//! kernel.run_until(&mut ctx, clock.period_fs())?;
//! assert_eq!(ctx.value_u64(count)?, 1);
//! ```
//!
//! # Modules
//!
//! - `time` — virtual time with delta cycles
//! - `error` — simulation errors
//! - `observer` — the glitch stream
//! - `evaluator` — four-state expression and statement evaluation
//! - `kernel` — the event queue and propagation engine
//! - `clock` — clock generators

#![warn(missing_docs)]

pub mod clock;
pub mod error;
pub mod evaluator;
pub mod kernel;
pub mod observer;
pub mod time;

pub use clock::ClockGenerator;
pub use error::SimError;
pub use evaluator::{eval_expr, exec_block, truthiness, AssignMode, PendingWrites, Truth};
pub use kernel::{SimConfig, SimKernel, StepResult};
pub use observer::{Glitch, GlitchObserver};
pub use time::SimTime;
