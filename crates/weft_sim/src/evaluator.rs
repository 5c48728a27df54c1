//! Four-state evaluation of expressions and conditional-IR bodies.
//!
//! [`eval_expr`] computes an expression over current signal values, with
//! an optional shadow of block-local writes for blocking semantics.
//! [`exec_block`] executes a statement tree, collecting writes into a
//! [`PendingWrites`] map: last write wins, and the kernel applies the
//! collected writes only after the whole body has run.

use std::collections::HashMap;

use weft_common::LogicVec;
use weft_graph::{BinaryOp, CaseKind, DesignContext, Expr, SignalId, Stmt, UnaryOp};

/// Write set of one block evaluation: last-write-wins values keyed by
/// target, iterable in first-write order for deterministic application.
#[derive(Debug, Default)]
pub struct PendingWrites {
    order: Vec<SignalId>,
    values: HashMap<SignalId, LogicVec>,
}

impl PendingWrites {
    /// An empty write set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a write; a later write to the same target replaces the
    /// value but keeps the original position.
    pub fn insert(&mut self, target: SignalId, value: LogicVec) {
        if !self.values.contains_key(&target) {
            self.order.push(target);
        }
        self.values.insert(target, value);
    }

    /// The pending value for `target`, if written.
    pub fn get(&self, target: SignalId) -> Option<&LogicVec> {
        self.values.get(&target)
    }

    /// Iterates `(target, value)` in first-write order.
    pub fn iter(&self) -> impl Iterator<Item = (SignalId, &LogicVec)> {
        self.order.iter().map(|s| (*s, &self.values[s]))
    }

    /// `true` if nothing was written.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Whether reads inside a block observe the block's own earlier writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignMode {
    /// Combinational semantics: reads of an already-written target see
    /// the new value.
    Blocking,
    /// Sequential semantics: every read samples the pre-edge value.
    NonBlocking,
}

/// Three-valued truth of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truth {
    /// At least one bit is `One`.
    True,
    /// All bits known, none `One`.
    False,
    /// No bit is `One` and some bit is X or Z.
    Unknown,
}

/// Evaluates the truth of a condition value.
pub fn truthiness(value: &LogicVec) -> Truth {
    if value.any_one() {
        Truth::True
    } else if value.has_xz() {
        Truth::Unknown
    } else {
        Truth::False
    }
}

/// Evaluates `expr` over the context's current signal values; reads
/// consult `shadow` first when present.
pub fn eval_expr(ctx: &DesignContext, expr: &Expr, shadow: Option<&PendingWrites>) -> LogicVec {
    match expr {
        Expr::Signal(id) => shadow
            .and_then(|s| s.get(*id))
            .unwrap_or(&ctx.signals[*id].value)
            .clone(),
        Expr::Literal(v) => v.clone(),
        Expr::Unary { op, operand } => {
            let v = eval_expr(ctx, operand, shadow);
            match op {
                UnaryOp::Not => !&v,
            }
        }
        Expr::Binary { op, lhs, rhs } => {
            let l = eval_expr(ctx, lhs, shadow);
            let r = eval_expr(ctx, rhs, shadow);
            eval_binary(*op, &l, &r)
        }
        Expr::Mux {
            cond,
            then_val,
            else_val,
        } => {
            let c = eval_expr(ctx, cond, shadow);
            let t = eval_expr(ctx, then_val, shadow);
            match truthiness(&c) {
                Truth::True => t,
                Truth::False => eval_expr(ctx, else_val, shadow),
                Truth::Unknown => LogicVec::all_x(t.width()),
            }
        }
        Expr::Slice { operand, hi, lo } => eval_expr(ctx, operand, shadow).slice(*hi, *lo),
        Expr::Concat(parts) => {
            let values: Vec<LogicVec> = parts
                .iter()
                .map(|p| eval_expr(ctx, p, shadow))
                .collect();
            LogicVec::concat(&values)
        }
        Expr::Repeat { operand, count } => eval_expr(ctx, operand, shadow).repeat(*count),
    }
}

fn eval_binary(op: BinaryOp, l: &LogicVec, r: &LogicVec) -> LogicVec {
    match op {
        BinaryOp::And => l & r,
        BinaryOp::Or => l | r,
        BinaryOp::Xor => l ^ r,
        BinaryOp::Add => l.add_wrapping(r),
        BinaryOp::Sub => l.sub_wrapping(r),
        BinaryOp::Mul => l.mul_wrapping(r),
        BinaryOp::Shl | BinaryOp::Shr => match r.to_u64() {
            Some(amount) => {
                let amount = amount.min(u64::from(l.width())) as u32;
                if op == BinaryOp::Shl {
                    l.shl(amount)
                } else {
                    l.shr(amount)
                }
            }
            None => LogicVec::all_x(l.width()),
        },
        BinaryOp::Eq | BinaryOp::Ne => {
            if l.has_xz() || r.has_xz() {
                LogicVec::all_x(1)
            } else {
                let eq = l == r;
                LogicVec::from_bool(if op == BinaryOp::Eq { eq } else { !eq })
            }
        }
        BinaryOp::Lt | BinaryOp::Gt => match (l.to_big_uint(), r.to_big_uint()) {
            (Some(a), Some(b)) => {
                LogicVec::from_bool(if op == BinaryOp::Lt { a < b } else { a > b })
            }
            _ => LogicVec::all_x(1),
        },
    }
}

/// Executes a conditional-IR body, accumulating writes into `pending`.
///
/// An unknown `if` condition or an X/Z-bearing case selector takes no
/// branch; instead every signal the statement could assign is
/// contaminated to all-X.
pub fn exec_block(
    ctx: &DesignContext,
    stmts: &[Stmt],
    mode: AssignMode,
    pending: &mut PendingWrites,
) {
    for stmt in stmts {
        match stmt {
            Stmt::Assign { target, value } => {
                let v = eval_stmt_expr(ctx, value, mode, pending);
                pending.insert(*target, v);
            }
            Stmt::If { arms, else_body } => {
                let mut resolved = false;
                for arm in arms {
                    match truthiness(&eval_stmt_expr(ctx, &arm.condition, mode, pending)) {
                        Truth::True => {
                            exec_block(ctx, &arm.body, mode, pending);
                            resolved = true;
                            break;
                        }
                        Truth::False => continue,
                        Truth::Unknown => {
                            contaminate(ctx, stmt, pending);
                            resolved = true;
                            break;
                        }
                    }
                }
                if !resolved {
                    exec_block(ctx, else_body, mode, pending);
                }
            }
            Stmt::Case {
                selector,
                items,
                default,
                kind,
                ..
            } => {
                let sel = eval_stmt_expr(ctx, selector, mode, pending);
                if sel.has_xz() {
                    contaminate(ctx, stmt, pending);
                    continue;
                }
                let mut matched = false;
                for item in items {
                    let hit = match kind {
                        CaseKind::Exact => sel == item.pattern,
                        CaseKind::Casez => sel.matches_casez(&item.pattern),
                    };
                    if hit {
                        exec_block(ctx, &item.body, mode, pending);
                        matched = true;
                        break;
                    }
                }
                if !matched {
                    exec_block(ctx, default, mode, pending);
                }
            }
        }
    }
}

fn eval_stmt_expr(
    ctx: &DesignContext,
    expr: &Expr,
    mode: AssignMode,
    pending: &PendingWrites,
) -> LogicVec {
    match mode {
        AssignMode::Blocking => eval_expr(ctx, expr, Some(pending)),
        AssignMode::NonBlocking => eval_expr(ctx, expr, None),
    }
}

fn contaminate(ctx: &DesignContext, stmt: &Stmt, pending: &mut PendingWrites) {
    for target in Stmt::targets(std::slice::from_ref(stmt)) {
        let width = ctx.signals[target].width;
        pending.insert(target, LogicVec::all_x(width));
    }
}
