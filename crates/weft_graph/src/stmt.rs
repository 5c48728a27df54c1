//! Conditional IR: the statement trees inside always blocks.
//!
//! A behavioral block body is an ordered list of [`Stmt`] nodes. The same
//! tree is executed by the simulator (with blocking or non-blocking
//! semantics depending on the owning block) and rendered by the
//! synthesizer.

use crate::expr::Expr;
use crate::ids::SignalId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use weft_common::LogicVec;

/// One `if`/`else if` arm: a condition and the statements it guards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfArm {
    /// The guard condition.
    pub condition: Expr,
    /// Statements executed when the guard holds.
    pub body: Vec<Stmt>,
}

/// One arm of a case statement: a constant pattern and its body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseItem {
    /// The constant pattern to match against the selector.
    pub pattern: LogicVec,
    /// Statements executed when the pattern matches.
    pub body: Vec<Stmt>,
}

/// How case patterns are matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseKind {
    /// Bit-exact matching.
    Exact,
    /// Z bits in patterns are wildcards (`casez`).
    Casez,
}

/// Overlap/exhaustiveness expectation, rendered as the SystemVerilog
/// `unique`/`priority` qualifier and checked at emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionalType {
    /// No qualifier.
    None,
    /// At most one pattern may match any selector value.
    Unique,
    /// At least one pattern must match any selector value.
    Priority,
}

/// A node of the conditional IR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// Assign `value` to `target`.
    Assign {
        /// The assigned signal.
        target: SignalId,
        /// The right-hand side.
        value: Expr,
    },
    /// An `if`/`else if`.../`else` chain; arms are tested in order.
    If {
        /// The guarded arms, in declaration order.
        arms: Vec<IfArm>,
        /// Statements executed when no arm's guard holds.
        else_body: Vec<Stmt>,
    },
    /// A case statement; items are tested in declaration order.
    Case {
        /// The selector, evaluated once.
        selector: Expr,
        /// The arms.
        items: Vec<CaseItem>,
        /// Statements executed when no item matches.
        default: Vec<Stmt>,
        /// Matching mode.
        kind: CaseKind,
        /// Overlap/exhaustiveness qualifier.
        cond_type: ConditionalType,
    },
}

impl Stmt {
    /// Shorthand for an assignment.
    pub fn assign(target: SignalId, value: Expr) -> Self {
        Stmt::Assign { target, value }
    }

    /// Shorthand for `if (cond) { body }`.
    pub fn if_then(condition: Expr, body: Vec<Stmt>) -> Self {
        Stmt::If {
            arms: vec![IfArm { condition, body }],
            else_body: Vec::new(),
        }
    }

    /// Shorthand for `if (cond) { then_body } else { else_body }`.
    pub fn if_else(condition: Expr, then_body: Vec<Stmt>, else_body: Vec<Stmt>) -> Self {
        Stmt::If {
            arms: vec![IfArm {
                condition,
                body: then_body,
            }],
            else_body,
        }
    }

    /// Every signal assigned anywhere in `stmts`, in first-assignment
    /// order, deduplicated.
    pub fn targets(stmts: &[Stmt]) -> Vec<SignalId> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        collect_targets(stmts, &mut out, &mut seen);
        out
    }

    /// Every signal `stmts` can read *before* writing it: the external
    /// read set that determines a combinational block's sensitivity.
    ///
    /// A read of a signal that has definitely been written earlier on
    /// every path (blocking semantics) observes the block-local value and
    /// is not an external read; this is what makes `x <= a; x <= ~x`
    /// sensitive to `a` alone.
    pub fn external_reads(stmts: &[Stmt]) -> Vec<SignalId> {
        let mut reads = Vec::new();
        let mut seen = HashSet::new();
        let mut written = HashSet::new();
        collect_reads(stmts, &mut written, &mut reads, &mut seen);
        reads
    }
}

fn collect_targets(stmts: &[Stmt], out: &mut Vec<SignalId>, seen: &mut HashSet<SignalId>) {
    for stmt in stmts {
        match stmt {
            Stmt::Assign { target, .. } => {
                if seen.insert(*target) {
                    out.push(*target);
                }
            }
            Stmt::If { arms, else_body } => {
                for arm in arms {
                    collect_targets(&arm.body, out, seen);
                }
                collect_targets(else_body, out, seen);
            }
            Stmt::Case { items, default, .. } => {
                for item in items {
                    collect_targets(&item.body, out, seen);
                }
                collect_targets(default, out, seen);
            }
        }
    }
}

fn note_reads(
    expr: &Expr,
    written: &HashSet<SignalId>,
    reads: &mut Vec<SignalId>,
    seen: &mut HashSet<SignalId>,
) {
    for r in expr.read_signals() {
        if !written.contains(&r) && seen.insert(r) {
            reads.push(r);
        }
    }
}

fn collect_reads(
    stmts: &[Stmt],
    written: &mut HashSet<SignalId>,
    reads: &mut Vec<SignalId>,
    seen: &mut HashSet<SignalId>,
) {
    for stmt in stmts {
        match stmt {
            Stmt::Assign { target, value } => {
                note_reads(value, written, reads, seen);
                written.insert(*target);
            }
            Stmt::If { arms, else_body } => {
                for arm in arms {
                    note_reads(&arm.condition, written, reads, seen);
                }
                let mut branch_written: Vec<HashSet<SignalId>> = Vec::new();
                for arm in arms {
                    let mut w = written.clone();
                    collect_reads(&arm.body, &mut w, reads, seen);
                    branch_written.push(w);
                }
                let mut w = written.clone();
                collect_reads(else_body, &mut w, reads, seen);
                branch_written.push(w);
                // A signal counts as written past this point only if every
                // branch wrote it.
                intersect_into(written, &branch_written);
            }
            Stmt::Case {
                selector,
                items,
                default,
                ..
            } => {
                note_reads(selector, written, reads, seen);
                let mut branch_written: Vec<HashSet<SignalId>> = Vec::new();
                for item in items {
                    let mut w = written.clone();
                    collect_reads(&item.body, &mut w, reads, seen);
                    branch_written.push(w);
                }
                let mut w = written.clone();
                collect_reads(default, &mut w, reads, seen);
                branch_written.push(w);
                intersect_into(written, &branch_written);
            }
        }
    }
}

fn intersect_into(written: &mut HashSet<SignalId>, branches: &[HashSet<SignalId>]) {
    if let Some((first, rest)) = branches.split_first() {
        let mut merged: HashSet<SignalId> = first.clone();
        for b in rest {
            merged.retain(|s| b.contains(s));
        }
        *written = merged;
    }
}
