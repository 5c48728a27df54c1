//! Test vectors: per-cycle input assignments and expected outputs.

use serde::{Deserialize, Serialize};
use std::fmt;
use weft_common::LogicVec;

/// A vector-entry value: a concrete integer, or don't-care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicValue {
    /// An unsigned value, zero-extended to the port width.
    Value(u64),
    /// Don't-care: drives all-X as an input, matches anything as an
    /// expectation.
    X,
}

impl LogicValue {
    /// Renders this value at a concrete width.
    pub fn to_logic_vec(self, width: u32) -> LogicVec {
        match self {
            LogicValue::Value(v) => LogicVec::from_u64(v, width),
            LogicValue::X => LogicVec::all_x(width),
        }
    }

    /// `true` when `actual` satisfies this expectation: don't-care
    /// matches anything, a concrete value matches bit-exact.
    pub fn matches(self, actual: &LogicVec) -> bool {
        match self {
            LogicValue::X => true,
            LogicValue::Value(v) => *actual == LogicVec::from_u64(v, actual.width()),
        }
    }
}

impl fmt::Display for LogicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicValue::Value(v) => write!(f, "{v}"),
            LogicValue::X => write!(f, "x"),
        }
    }
}

/// One clock period of stimulus and checks: inputs applied before the
/// rising edge, outputs compared after the period elapses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vector {
    /// Input assignments by port name.
    pub inputs: Vec<(String, LogicValue)>,
    /// Expected outputs by port name.
    pub expected: Vec<(String, LogicValue)>,
}

impl Vector {
    /// An empty vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an input assignment.
    pub fn input(mut self, name: &str, value: u64) -> Self {
        self.inputs.push((name.to_string(), LogicValue::Value(value)));
        self
    }

    /// Adds an expected output.
    pub fn expect(mut self, name: &str, value: u64) -> Self {
        self.expected
            .push((name.to_string(), LogicValue::Value(value)));
        self
    }

    /// Adds a don't-care expectation (documents the port without
    /// constraining it).
    pub fn expect_any(mut self, name: &str) -> Self {
        self.expected.push((name.to_string(), LogicValue::X));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_zero_extend() {
        assert_eq!(
            LogicValue::Value(5).to_logic_vec(8),
            LogicVec::from_u64(5, 8)
        );
        assert!(LogicValue::X.to_logic_vec(4).has_xz());
    }

    #[test]
    fn dont_care_matches_anything() {
        assert!(LogicValue::X.matches(&LogicVec::all_x(4)));
        assert!(LogicValue::X.matches(&LogicVec::from_u64(9, 4)));
    }

    #[test]
    fn concrete_expectation_is_bit_exact() {
        assert!(LogicValue::Value(5).matches(&LogicVec::from_u64(5, 4)));
        assert!(!LogicValue::Value(5).matches(&LogicVec::from_u64(4, 4)));
        // X in the observed value never equals a concrete expectation.
        assert!(!LogicValue::Value(0).matches(&LogicVec::all_x(4)));
    }

    #[test]
    fn builder_collects_in_order() {
        let v = Vector::new()
            .input("en", 1)
            .input("reset", 0)
            .expect("val", 3)
            .expect_any("debug");
        assert_eq!(v.inputs.len(), 2);
        assert_eq!(v.expected[0], ("val".to_string(), LogicValue::Value(3)));
        assert_eq!(v.expected[1], ("debug".to_string(), LogicValue::X));
    }

    #[test]
    fn serde_roundtrip() {
        let v = Vector::new().input("a", 1).expect("y", 0);
        let json = serde_json::to_string(&v).unwrap();
        let back: Vector = serde_json::from_str(&json).unwrap();
        assert_eq!(back.inputs, v.inputs);
        assert_eq!(back.expected, v.expected);
    }
}
