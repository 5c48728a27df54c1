//! Signal entities: four-state wires with driver/driven edges.

use crate::expr::Expr;
use crate::ids::{ModuleId, ProcessId, SignalId};
use serde::{Deserialize, Serialize};
use weft_common::{Ident, LogicVec};

/// What drives a signal.
///
/// Every signal has at most one source; connecting a second one is a
/// [`DriverConflict`](crate::error::GraphError::DriverConflict).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Driver {
    /// Driven directly by another signal.
    Wire(SignalId),
    /// Continuously driven by an expression (a derived signal).
    Expr(Expr),
    /// Assigned by an always block.
    Process(ProcessId),
}

/// A multi-bit four-state wire in the hardware graph.
///
/// Signals are created free-standing; module membership (`parent`) is
/// assigned at most once, either at port registration or when an
/// ancestor's `build` trace claims the signal as internal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// The signal's name.
    pub name: Ident,
    /// `true` for auto-named derived signals; unpreferred names may be
    /// elided during emission.
    pub unpreferred: bool,
    /// Width in bits.
    pub width: u32,
    /// Current simulation value. All-X until driven.
    pub value: LogicVec,
    /// The value before the most recent change; used for edge detection
    /// and glitch delivery.
    pub prev_value: LogicVec,
    /// The unique source, if connected.
    pub source: Option<Driver>,
    /// Signals (or process targets) this signal feeds.
    pub destinations: Vec<SignalId>,
    /// The owning module, once known.
    pub parent: Option<ModuleId>,
    /// `true` if this signal is an input port of its parent.
    pub is_input: bool,
    /// `true` if this signal is an output port of its parent.
    pub is_output: bool,
}

impl Signal {
    /// Creates a free signal of the given width, valued all-X.
    pub fn new(name: Ident, width: u32) -> Self {
        Self {
            name,
            unpreferred: false,
            width,
            value: LogicVec::all_x(width),
            prev_value: LogicVec::all_x(width),
            source: None,
            destinations: Vec::new(),
            parent: None,
            is_input: false,
            is_output: false,
        }
    }

    /// `true` if this signal is a port of its parent module.
    pub fn is_port(&self) -> bool {
        self.is_input || self.is_output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_signal_is_unowned_and_unknown() {
        let s = Signal::new(Ident::from_raw(0), 8);
        assert_eq!(s.width, 8);
        assert!(s.value.has_xz());
        assert!(s.source.is_none());
        assert!(s.parent.is_none());
        assert!(!s.is_port());
    }

    #[test]
    fn port_flags() {
        let mut s = Signal::new(Ident::from_raw(0), 1);
        s.is_input = true;
        assert!(s.is_port());
        s.is_input = false;
        s.is_output = true;
        assert!(s.is_port());
    }

    #[test]
    fn driver_variants_compare() {
        let w = Driver::Wire(SignalId::from_raw(1));
        assert_eq!(w, Driver::Wire(SignalId::from_raw(1)));
        assert_ne!(w, Driver::Process(ProcessId::from_raw(1)));
    }

    #[test]
    fn serde_roundtrip() {
        let mut s = Signal::new(Ident::from_raw(3), 4);
        s.source = Some(Driver::Expr(Expr::lit_u64(9, 4)));
        let json = serde_json::to_string(&s).unwrap();
        let back: Signal = serde_json::from_str(&json).unwrap();
        assert_eq!(back.width, 4);
        assert_eq!(back.source, s.source);
    }
}
