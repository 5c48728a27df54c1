//! The design context: arenas, interner, and the signal-level DSL.
//!
//! A [`DesignContext`] owns every entity of one construction/simulation
//! session. There is no process-wide state: tests and tools isolate
//! sessions by creating fresh contexts.

use crate::arena::Arena;
use crate::error::GraphError;
use crate::expr::{BinaryOp, Expr, UnaryOp};
use crate::ids::{ModuleId, ProcessId, SignalId};
use crate::module::Module;
use crate::process::{Process, ProcessKind};
use crate::signal::{Driver, Signal};
use num_bigint::BigUint;
use weft_common::{Interner, LogicVec};

/// Owner of all signals, modules, and processes in one session.
#[derive(Debug)]
pub struct DesignContext {
    /// All signals, port and internal alike.
    pub signals: Arena<SignalId, Signal>,
    /// All modules.
    pub modules: Arena<ModuleId, Module>,
    /// All always blocks.
    pub processes: Arena<ProcessId, Process>,
    pub(crate) interner: Interner,
    derived_count: u32,
}

impl DesignContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self {
            signals: Arena::new(),
            modules: Arena::new(),
            processes: Arena::new(),
            interner: Interner::new(),
            derived_count: 0,
        }
    }

    /// The context's name interner.
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Resolves a signal's name.
    pub fn signal_name(&self, sig: SignalId) -> &str {
        self.interner.resolve(self.signals[sig].name)
    }

    /// Resolves a module's name.
    pub fn module_name(&self, module: ModuleId) -> &str {
        self.interner.resolve(self.modules[module].name)
    }

    /// Creates a free-standing named signal, valued all-X.
    pub fn signal(&mut self, name: &str, width: u32) -> SignalId {
        let ident = self.interner.intern(name);
        self.signals.alloc(Signal::new(ident, width))
    }

    /// Creates an unpreferred derived signal continuously driven by `expr`.
    ///
    /// The expression's width must match `width`; derived signals created
    /// through the expression builders compute it automatically.
    pub fn derived(&mut self, width: u32, expr: Expr) -> Result<SignalId, GraphError> {
        let found = self.expr_width(&expr)?;
        if found != width {
            return Err(GraphError::WidthMismatch {
                name: "derived signal".to_string(),
                expected: width,
                found,
            });
        }
        Ok(self.fresh_derived(width, expr))
    }

    /// Creates an unpreferred signal holding a constant.
    pub fn constant(&mut self, value: LogicVec) -> SignalId {
        let width = value.width();
        let id = self.fresh_derived(width, Expr::Literal(value.clone()));
        // Constants are defined before the first tick.
        self.signals[id].value = value.clone();
        self.signals[id].prev_value = value;
        id
    }

    fn fresh_derived(&mut self, width: u32, expr: Expr) -> SignalId {
        let name = format!("_w{}", self.derived_count);
        self.derived_count += 1;
        let ident = self.interner.intern(&name);
        let reads = expr.read_signals();
        let mut sig = Signal::new(ident, width);
        sig.unpreferred = true;
        sig.source = Some(Driver::Expr(expr));
        let id = self.signals.alloc(sig);
        for r in reads {
            self.signals[r].destinations.push(id);
        }
        id
    }

    /// Establishes `src` as the unique source of `dst`.
    ///
    /// This is the structural connection primitive: port wiring and
    /// passthroughs are all `connect`.
    pub fn connect(&mut self, dst: SignalId, src: SignalId) -> Result<(), GraphError> {
        if self.signals[dst].source.is_some() {
            return Err(GraphError::DriverConflict {
                signal: self.signal_name(dst).to_string(),
            });
        }
        let (dw, sw) = (self.signals[dst].width, self.signals[src].width);
        if dw != sw {
            return Err(GraphError::WidthMismatch {
                name: self.signal_name(dst).to_string(),
                expected: dw,
                found: sw,
            });
        }
        self.signals[dst].source = Some(Driver::Wire(src));
        self.signals[src].destinations.push(dst);
        Ok(())
    }

    /// Forces a signal's current value, as a simulation input.
    pub fn put(&mut self, sig: SignalId, value: LogicVec) -> Result<(), GraphError> {
        let width = self.signals[sig].width;
        if value.width() != width {
            return Err(GraphError::WidthMismatch {
                name: self.signal_name(sig).to_string(),
                expected: width,
                found: value.width(),
            });
        }
        let s = &mut self.signals[sig];
        s.prev_value = std::mem::replace(&mut s.value, value);
        Ok(())
    }

    /// The signal's current four-state value.
    pub fn value(&self, sig: SignalId) -> &LogicVec {
        &self.signals[sig].value
    }

    /// The signal's current value as `u64`.
    ///
    /// Fails with [`XZPropagation`](GraphError::XZPropagation) when the
    /// value contains X or Z bits.
    pub fn value_u64(&self, sig: SignalId) -> Result<u64, GraphError> {
        self.signals[sig]
            .value
            .to_u64()
            .ok_or_else(|| GraphError::XZPropagation {
                value: format!("{:?}", self.signals[sig].value),
            })
    }

    /// The signal's current value as a big unsigned integer.
    pub fn value_big_uint(&self, sig: SignalId) -> Result<BigUint, GraphError> {
        self.signals[sig]
            .value
            .to_big_uint()
            .ok_or_else(|| GraphError::XZPropagation {
                value: format!("{:?}", self.signals[sig].value),
            })
    }

    // --- expression builders -------------------------------------------
    //
    // Each returns a fresh unpreferred derived signal that participates in
    // tracing like any other internal signal.

    /// `~a`.
    pub fn not(&mut self, a: SignalId) -> SignalId {
        let width = self.signals[a].width;
        self.fresh_derived(
            width,
            Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(Expr::signal(a)),
            },
        )
    }

    /// `a & b`.
    pub fn and(&mut self, a: SignalId, b: SignalId) -> Result<SignalId, GraphError> {
        self.binary(BinaryOp::And, a, b)
    }

    /// `a | b`.
    pub fn or(&mut self, a: SignalId, b: SignalId) -> Result<SignalId, GraphError> {
        self.binary(BinaryOp::Or, a, b)
    }

    /// `a ^ b`.
    pub fn xor(&mut self, a: SignalId, b: SignalId) -> Result<SignalId, GraphError> {
        self.binary(BinaryOp::Xor, a, b)
    }

    /// `a + b`, wrapping at the operand width.
    pub fn add(&mut self, a: SignalId, b: SignalId) -> Result<SignalId, GraphError> {
        self.binary(BinaryOp::Add, a, b)
    }

    /// `a - b`, wrapping at the operand width.
    pub fn sub(&mut self, a: SignalId, b: SignalId) -> Result<SignalId, GraphError> {
        self.binary(BinaryOp::Sub, a, b)
    }

    /// `a * b`, wrapping at the operand width.
    pub fn mul(&mut self, a: SignalId, b: SignalId) -> Result<SignalId, GraphError> {
        self.binary(BinaryOp::Mul, a, b)
    }

    /// `a == b`; one-bit result.
    pub fn eq(&mut self, a: SignalId, b: SignalId) -> Result<SignalId, GraphError> {
        self.binary(BinaryOp::Eq, a, b)
    }

    /// `a != b`; one-bit result.
    pub fn ne(&mut self, a: SignalId, b: SignalId) -> Result<SignalId, GraphError> {
        self.binary(BinaryOp::Ne, a, b)
    }

    /// `a < b`, unsigned; one-bit result.
    pub fn lt(&mut self, a: SignalId, b: SignalId) -> Result<SignalId, GraphError> {
        self.binary(BinaryOp::Lt, a, b)
    }

    /// `a > b`, unsigned; one-bit result.
    pub fn gt(&mut self, a: SignalId, b: SignalId) -> Result<SignalId, GraphError> {
        self.binary(BinaryOp::Gt, a, b)
    }

    fn binary(&mut self, op: BinaryOp, a: SignalId, b: SignalId) -> Result<SignalId, GraphError> {
        let (aw, bw) = (self.signals[a].width, self.signals[b].width);
        if aw != bw {
            return Err(GraphError::WidthMismatch {
                name: self.signal_name(b).to_string(),
                expected: aw,
                found: bw,
            });
        }
        let width = if op.is_comparison() { 1 } else { aw };
        Ok(self.fresh_derived(width, Expr::binary(op, Expr::signal(a), Expr::signal(b))))
    }

    /// `a << amount`, zero-filling.
    pub fn shl(&mut self, a: SignalId, amount: u32) -> SignalId {
        let width = self.signals[a].width;
        self.fresh_derived(
            width,
            Expr::binary(BinaryOp::Shl, Expr::signal(a), Expr::lit_u64(amount.into(), 32)),
        )
    }

    /// `a >> amount`, zero-filling.
    pub fn shr(&mut self, a: SignalId, amount: u32) -> SignalId {
        let width = self.signals[a].width;
        self.fresh_derived(
            width,
            Expr::binary(BinaryOp::Shr, Expr::signal(a), Expr::lit_u64(amount.into(), 32)),
        )
    }

    /// `sel ? a : b`. The select must be one bit wide and the branches
    /// equal width.
    pub fn mux(&mut self, sel: SignalId, a: SignalId, b: SignalId) -> Result<SignalId, GraphError> {
        if self.signals[sel].width != 1 {
            return Err(GraphError::WidthMismatch {
                name: self.signal_name(sel).to_string(),
                expected: 1,
                found: self.signals[sel].width,
            });
        }
        let (aw, bw) = (self.signals[a].width, self.signals[b].width);
        if aw != bw {
            return Err(GraphError::WidthMismatch {
                name: self.signal_name(b).to_string(),
                expected: aw,
                found: bw,
            });
        }
        Ok(self.fresh_derived(
            aw,
            Expr::Mux {
                cond: Box::new(Expr::signal(sel)),
                then_val: Box::new(Expr::signal(a)),
                else_val: Box::new(Expr::signal(b)),
            },
        ))
    }

    /// The inclusive bit range `[lo, hi]` of `a` as a derived signal.
    pub fn slice(&mut self, a: SignalId, hi: u32, lo: u32) -> Result<SignalId, GraphError> {
        let width = self.signals[a].width;
        if hi < lo || hi >= width {
            return Err(GraphError::WidthMismatch {
                name: format!("{}[{hi}:{lo}]", self.signal_name(a)),
                expected: width,
                found: hi + 1,
            });
        }
        Ok(self.fresh_derived(
            hi - lo + 1,
            Expr::Slice {
                operand: Box::new(Expr::signal(a)),
                hi,
                lo,
            },
        ))
    }

    /// Concatenates `parts` into one derived signal; the first element
    /// becomes the most-significant bits.
    ///
    /// # Panics
    ///
    /// Panics if `parts` is empty.
    pub fn swizzle(&mut self, parts: &[SignalId]) -> SignalId {
        assert!(!parts.is_empty(), "cannot swizzle zero signals");
        let width = parts.iter().map(|&p| self.signals[p].width).sum();
        self.fresh_derived(
            width,
            Expr::Concat(parts.iter().map(|&p| Expr::signal(p)).collect()),
        )
    }

    /// `a` repeated `count` times as a derived signal.
    pub fn replicate(&mut self, a: SignalId, count: u32) -> SignalId {
        let width = self.signals[a].width * count;
        self.fresh_derived(
            width,
            Expr::Repeat {
                operand: Box::new(Expr::signal(a)),
                count,
            },
        )
    }

    /// Computes (and thereby validates) the width of an expression.
    pub fn expr_width(&self, expr: &Expr) -> Result<u32, GraphError> {
        match expr {
            Expr::Signal(id) => Ok(self.signals[*id].width),
            Expr::Literal(v) => Ok(v.width()),
            Expr::Unary { operand, .. } => self.expr_width(operand),
            Expr::Binary { op, lhs, rhs } => {
                let lw = self.expr_width(lhs)?;
                let rw = self.expr_width(rhs)?;
                match op {
                    BinaryOp::Shl | BinaryOp::Shr => Ok(lw),
                    _ => {
                        if lw != rw {
                            return Err(GraphError::WidthMismatch {
                                name: "binary operand".to_string(),
                                expected: lw,
                                found: rw,
                            });
                        }
                        if op.is_comparison() {
                            Ok(1)
                        } else {
                            Ok(lw)
                        }
                    }
                }
            }
            Expr::Mux {
                cond,
                then_val,
                else_val,
            } => {
                let cw = self.expr_width(cond)?;
                if cw != 1 {
                    return Err(GraphError::WidthMismatch {
                        name: "mux select".to_string(),
                        expected: 1,
                        found: cw,
                    });
                }
                let tw = self.expr_width(then_val)?;
                let ew = self.expr_width(else_val)?;
                if tw != ew {
                    return Err(GraphError::WidthMismatch {
                        name: "mux branch".to_string(),
                        expected: tw,
                        found: ew,
                    });
                }
                Ok(tw)
            }
            Expr::Slice { operand, hi, lo } => {
                let ow = self.expr_width(operand)?;
                if *hi < *lo || *hi >= ow {
                    return Err(GraphError::WidthMismatch {
                        name: format!("slice [{hi}:{lo}]"),
                        expected: ow,
                        found: hi + 1,
                    });
                }
                Ok(hi - lo + 1)
            }
            Expr::Concat(parts) => {
                let mut total = 0;
                for p in parts {
                    total += self.expr_width(p)?;
                }
                Ok(total)
            }
            Expr::Repeat { operand, count } => Ok(self.expr_width(operand)? * count),
        }
    }

    /// The signals feeding `sig` through its driver: the wire source, the
    /// expression's reads, or a process's reads plus its clock.
    pub fn upstream_neighbors(&self, sig: SignalId) -> Vec<SignalId> {
        match &self.signals[sig].source {
            None => Vec::new(),
            Some(Driver::Wire(src)) => vec![*src],
            Some(Driver::Expr(expr)) => expr.read_signals(),
            Some(Driver::Process(pid)) => {
                let proc = &self.processes[*pid];
                let mut up = proc.reads.clone();
                if let ProcessKind::Ff { clock } = proc.kind {
                    if !up.contains(&clock) {
                        up.push(clock);
                    }
                }
                up
            }
        }
    }
}

impl Default for DesignContext {
    fn default() -> Self {
        Self::new()
    }
}
