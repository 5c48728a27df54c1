//! Expression trees over signals.
//!
//! An [`Expr`] is the read side of the graph: the right-hand side of an
//! assignment, the condition of an `if`, the body of a derived signal's
//! continuous driver. Expressions reference signals by ID and are
//! evaluated with four-state semantics by the simulator.

use crate::ids::SignalId;
use serde::{Deserialize, Serialize};
use weft_common::LogicVec;

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Bitwise NOT (`~`).
    Not,
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Bitwise AND.
    And,
    /// Bitwise OR.
    Or,
    /// Bitwise XOR.
    Xor,
    /// Wrapping addition.
    Add,
    /// Wrapping subtraction.
    Sub,
    /// Wrapping multiplication.
    Mul,
    /// Logical shift left; the right operand is the shift amount.
    Shl,
    /// Logical shift right; the right operand is the shift amount.
    Shr,
    /// Equality; one-bit result, X when either side has X/Z.
    Eq,
    /// Inequality; one-bit result, X when either side has X/Z.
    Ne,
    /// Unsigned less-than; one-bit result.
    Lt,
    /// Unsigned greater-than; one-bit result.
    Gt,
}

impl BinaryOp {
    /// `true` for operators whose result is a single bit.
    pub fn is_comparison(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Gt)
    }
}

/// An expression over signals and constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// The current value of a signal.
    Signal(SignalId),
    /// A constant.
    Literal(LogicVec),
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// The left operand.
        lhs: Box<Expr>,
        /// The right operand.
        rhs: Box<Expr>,
    },
    /// A two-way multiplexer: `cond ? then_val : else_val`.
    Mux {
        /// The one-bit select.
        cond: Box<Expr>,
        /// Value when the select is `One`.
        then_val: Box<Expr>,
        /// Value when the select is `Zero`.
        else_val: Box<Expr>,
    },
    /// The inclusive bit range `[lo, hi]` of the operand.
    Slice {
        /// The expression being sliced.
        operand: Box<Expr>,
        /// High bit index.
        hi: u32,
        /// Low bit index.
        lo: u32,
    },
    /// Concatenation; the first element becomes the most-significant bits.
    Concat(Vec<Expr>),
    /// The operand repeated `count` times.
    Repeat {
        /// The expression to repeat.
        operand: Box<Expr>,
        /// Number of repetitions.
        count: u32,
    },
}

impl Expr {
    /// Shorthand for a signal read.
    pub fn signal(id: SignalId) -> Self {
        Expr::Signal(id)
    }

    /// Shorthand for a literal.
    pub fn lit(value: LogicVec) -> Self {
        Expr::Literal(value)
    }

    /// Shorthand for an unsigned literal of a given width.
    pub fn lit_u64(value: u64, width: u32) -> Self {
        Expr::Literal(LogicVec::from_u64(value, width))
    }

    /// Bitwise NOT of this expression.
    pub fn not(self) -> Self {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self),
        }
    }

    /// Builds a binary operation.
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Every signal this expression reads, in first-appearance order,
    /// deduplicated.
    pub fn read_signals(&self) -> Vec<SignalId> {
        let mut out = Vec::new();
        self.collect_reads(&mut out);
        out
    }

    fn collect_reads(&self, out: &mut Vec<SignalId>) {
        match self {
            Expr::Signal(id) => {
                if !out.contains(id) {
                    out.push(*id);
                }
            }
            Expr::Literal(_) => {}
            Expr::Unary { operand, .. } => operand.collect_reads(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_reads(out);
                rhs.collect_reads(out);
            }
            Expr::Mux {
                cond,
                then_val,
                else_val,
            } => {
                cond.collect_reads(out);
                then_val.collect_reads(out);
                else_val.collect_reads(out);
            }
            Expr::Slice { operand, .. } => operand.collect_reads(out),
            Expr::Concat(parts) => {
                for p in parts {
                    p.collect_reads(out);
                }
            }
            Expr::Repeat { operand, .. } => operand.collect_reads(out),
        }
    }
}
