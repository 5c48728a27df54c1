//! Always blocks: behavioral processes bound to a module.

use crate::context::DesignContext;
use crate::error::GraphError;
use crate::ids::{ModuleId, ProcessId, SignalId};
use crate::signal::Driver;
use crate::stmt::Stmt;
use serde::{Deserialize, Serialize};

/// The sensitivity class of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessKind {
    /// Continuously sensitive to its external reads (`always_comb`).
    /// Assignments are blocking: later writes supersede earlier ones and
    /// reads of an already-written target observe the new value.
    Combinational,
    /// Evaluated on the rising edge of `clock` (`always_ff`).
    /// Assignments are non-blocking: right-hand sides sample pre-edge
    /// values and all targets update together at the end of the tick.
    Ff {
        /// The clock signal.
        clock: SignalId,
    },
}

/// A behavioral process: an ordered conditional-IR body plus sensitivity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    /// Combinational or clocked.
    pub kind: ProcessKind,
    /// The body, executed in order.
    pub body: Vec<Stmt>,
    /// The module this process belongs to.
    pub module: ModuleId,
    /// Signals read before being written (the sensitivity set for
    /// combinational processes). Does not include a clock.
    pub reads: Vec<SignalId>,
    /// Signals assigned anywhere in the body.
    pub targets: Vec<SignalId>,
}

impl DesignContext {
    /// Registers a combinational always block on `module`.
    ///
    /// Every assigned signal becomes process-driven ([`Driver::Process`]);
    /// a target that already has a driver is a
    /// [`DriverConflict`](GraphError::DriverConflict). Assignment widths
    /// are checked against their targets.
    pub fn add_combinational(
        &mut self,
        module: ModuleId,
        body: Vec<Stmt>,
    ) -> Result<ProcessId, GraphError> {
        self.add_process(module, ProcessKind::Combinational, body)
    }

    /// Registers a clocked always block on `module`, evaluated on the
    /// rising edge of `clock`.
    pub fn add_ff(
        &mut self,
        module: ModuleId,
        clock: SignalId,
        body: Vec<Stmt>,
    ) -> Result<ProcessId, GraphError> {
        let clock_width = self.signals[clock].width;
        if clock_width != 1 {
            return Err(GraphError::WidthMismatch {
                name: self.signal_name(clock).to_string(),
                expected: 1,
                found: clock_width,
            });
        }
        self.add_process(module, ProcessKind::Ff { clock }, body)
    }

    fn add_process(
        &mut self,
        module: ModuleId,
        kind: ProcessKind,
        body: Vec<Stmt>,
    ) -> Result<ProcessId, GraphError> {
        self.check_stmt_widths(&body)?;

        let targets = Stmt::targets(&body);
        let reads = Stmt::external_reads(&body);

        // Validate before mutating anything, so a failure leaves the graph
        // untouched.
        for &t in &targets {
            if self.signals[t].source.is_some() {
                return Err(GraphError::DriverConflict {
                    signal: self.signal_name(t).to_string(),
                });
            }
        }

        let pid = self.processes.alloc(Process {
            kind,
            body,
            module,
            reads: reads.clone(),
            targets: targets.clone(),
        });

        for &t in &targets {
            self.signals[t].source = Some(Driver::Process(pid));
        }
        // Driven/driving edges so the build trace flows through the block.
        let mut edge_sources = reads;
        if let ProcessKind::Ff { clock } = kind {
            if !edge_sources.contains(&clock) {
                edge_sources.push(clock);
            }
        }
        for r in edge_sources {
            for &t in &targets {
                if !self.signals[r].destinations.contains(&t) {
                    self.signals[r].destinations.push(t);
                }
            }
        }

        self.modules[module].processes.push(pid);
        Ok(pid)
    }

    fn check_stmt_widths(&self, stmts: &[Stmt]) -> Result<(), GraphError> {
        for stmt in stmts {
            match stmt {
                Stmt::Assign { target, value } => {
                    let expected = self.signals[*target].width;
                    let found = self.expr_width(value)?;
                    if expected != found {
                        return Err(GraphError::WidthMismatch {
                            name: self.signal_name(*target).to_string(),
                            expected,
                            found,
                        });
                    }
                }
                Stmt::If { arms, else_body } => {
                    for arm in arms {
                        self.expr_width(&arm.condition)?;
                        self.check_stmt_widths(&arm.body)?;
                    }
                    self.check_stmt_widths(else_body)?;
                }
                Stmt::Case {
                    selector,
                    items,
                    default,
                    ..
                } => {
                    let sel_width = self.expr_width(selector)?;
                    for item in items {
                        if item.pattern.width() != sel_width {
                            return Err(GraphError::WidthMismatch {
                                name: format!("case pattern {:?}", item.pattern),
                                expected: sel_width,
                                found: item.pattern.width(),
                            });
                        }
                        self.check_stmt_widths(&item.body)?;
                    }
                    self.check_stmt_widths(default)?;
                }
            }
        }
        Ok(())
    }
}
