//! Shared foundational types for the weft hardware construction library.
//!
//! This crate provides the four-state logic scalar [`Logic`], the packed
//! four-state vector [`LogicVec`] that carries every signal value in a
//! design, and the interned identifier types used for all names.

#![warn(missing_docs)]

pub mod ident;
pub mod logic;
pub mod logic_vec;

pub use ident::{Ident, Interner};
pub use logic::Logic;
pub use logic_vec::LogicVec;
