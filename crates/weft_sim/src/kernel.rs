//! The event-driven simulation kernel.
//!
//! [`SimKernel`] owns a min-heap of timed signal drives. [`tick`]
//! advances virtual time to the earliest queued entry, applies every
//! entry at that timestamp in registration order, and then settles:
//! delta cycles re-evaluate continuously driven signals and
//! combinational blocks whose inputs glitched, rising clock edges fire
//! sequential blocks with non-blocking update semantics, and every value
//! change fans out to the glitch stream. Time never advances past a
//! timestamp until its propagation is complete.
//!
//! [`tick`]: SimKernel::tick

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};

use weft_common::LogicVec;
use weft_graph::{DesignContext, Driver, GraphError, ProcessId, ProcessKind, SignalId};

use crate::error::SimError;
use crate::evaluator::{eval_expr, exec_block, AssignMode, PendingWrites};
use crate::observer::{Glitch, GlitchObserver};
use crate::time::SimTime;

/// Tunables for a simulation run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Delta-cycle budget per timestamp; exceeding it raises
    /// [`SimError::DeltaCycleLimit`].
    pub max_delta_per_step: u32,
    /// Optional hard stop: events past this timestamp are left queued.
    pub time_limit: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_delta_per_step: 10_000,
            time_limit: None,
        }
    }
}

/// The outcome of a [`SimKernel::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// An event batch was processed and time advanced.
    Advanced,
    /// Nothing left to do (empty queue or time limit reached).
    Idle,
}

/// A scheduled signal drive.
#[derive(Debug, Clone)]
struct SimEvent {
    at_fs: u64,
    /// Registration counter; at a single timestamp, earlier registrations
    /// fire first.
    seq: u64,
    signal: SignalId,
    value: LogicVec,
    /// When set, the inverted value is re-enqueued this many femtoseconds
    /// later (clock square-wave generation).
    repeat: Option<u64>,
}

impl PartialEq for SimEvent {
    fn eq(&self, other: &Self) -> bool {
        self.at_fs == other.at_fs && self.seq == other.seq
    }
}

impl Eq for SimEvent {}

impl PartialOrd for SimEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at_fs
            .cmp(&other.at_fs)
            .then(self.seq.cmp(&other.seq))
    }
}

/// A signal or process woken by a set of changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum WakeItem {
    /// Re-evaluate a continuously driven signal (wire or expression).
    Eval(SignalId),
    /// Re-run a combinational block.
    Comb(ProcessId),
    /// Fire a sequential block (its clock rose).
    Ff(ProcessId),
}

/// What consumes a signal's value, precomputed per design.
#[derive(Debug, Clone, Copy)]
enum Consumer {
    Driven(SignalId),
    Comb(ProcessId),
}

/// The global scheduler and propagation engine.
///
/// A kernel is constructed against a finished design; construction
/// precomputes the sensitivity maps (signal → consumers, clock →
/// sequential blocks) the propagation loop runs on.
pub struct SimKernel {
    current_time: SimTime,
    queue: BinaryHeap<Reverse<SimEvent>>,
    seq: u64,
    config: SimConfig,
    consumers: HashMap<SignalId, Vec<Consumer>>,
    ff_clocks: HashMap<SignalId, Vec<ProcessId>>,
    observer: Option<Box<dyn GlitchObserver>>,
    glitches: Vec<Glitch>,
    initialized: bool,
}

impl SimKernel {
    /// Creates a kernel for `ctx`'s current graph.
    ///
    /// The design should be fully constructed first: signals or processes
    /// added after kernel creation are not in the sensitivity maps.
    pub fn new(ctx: &DesignContext, config: SimConfig) -> Self {
        let mut consumers: HashMap<SignalId, Vec<Consumer>> = HashMap::new();
        let mut ff_clocks: HashMap<SignalId, Vec<ProcessId>> = HashMap::new();

        for (id, sig) in ctx.signals.iter() {
            match &sig.source {
                Some(Driver::Wire(src)) => {
                    consumers.entry(*src).or_default().push(Consumer::Driven(id));
                }
                Some(Driver::Expr(expr)) => {
                    for r in expr.read_signals() {
                        consumers.entry(r).or_default().push(Consumer::Driven(id));
                    }
                }
                Some(Driver::Process(_)) | None => {}
            }
        }
        for (pid, proc) in ctx.processes.iter() {
            match proc.kind {
                ProcessKind::Combinational => {
                    for &r in &proc.reads {
                        consumers.entry(r).or_default().push(Consumer::Comb(pid));
                    }
                }
                ProcessKind::Ff { clock } => {
                    ff_clocks.entry(clock).or_default().push(pid);
                }
            }
        }

        Self {
            current_time: SimTime::zero(),
            queue: BinaryHeap::new(),
            seq: 0,
            config,
            consumers,
            ff_clocks,
            observer: None,
            glitches: Vec::new(),
            initialized: false,
        }
    }

    /// The current virtual time.
    pub fn current_time(&self) -> SimTime {
        self.current_time
    }

    /// Attaches a glitch observer; replaces any previous one.
    pub fn set_observer(&mut self, observer: Box<dyn GlitchObserver>) {
        self.observer = Some(observer);
    }

    /// Drains the glitch log accumulated since the last call.
    pub fn take_glitches(&mut self) -> Vec<Glitch> {
        std::mem::take(&mut self.glitches)
    }

    /// Schedules `value` onto `signal` at the current time; takes effect
    /// at the next [`settle`](SimKernel::settle) or
    /// [`tick`](SimKernel::tick).
    pub fn drive(
        &mut self,
        ctx: &DesignContext,
        signal: SignalId,
        value: LogicVec,
    ) -> Result<(), SimError> {
        self.drive_at(ctx, self.current_time.fs, signal, value)
    }

    /// Schedules `value` onto `signal` at an absolute timestamp. A
    /// timestamp in the past is clamped to the current time.
    pub fn drive_at(
        &mut self,
        ctx: &DesignContext,
        at_fs: u64,
        signal: SignalId,
        value: LogicVec,
    ) -> Result<(), SimError> {
        let width = ctx.signals[signal].width;
        if value.width() != width {
            return Err(SimError::Graph(GraphError::WidthMismatch {
                name: ctx.signal_name(signal).to_string(),
                expected: width,
                found: value.width(),
            }));
        }
        self.schedule(at_fs.max(self.current_time.fs), signal, value, None);
        Ok(())
    }

    pub(crate) fn schedule(
        &mut self,
        at_fs: u64,
        signal: SignalId,
        value: LogicVec,
        repeat: Option<u64>,
    ) {
        let event = SimEvent {
            at_fs,
            seq: self.seq,
            signal,
            value,
            repeat,
        };
        self.seq += 1;
        self.queue.push(Reverse(event));
    }

    /// Evaluates every continuously driven signal and every combinational
    /// block once, then settles; brings a freshly constructed design out
    /// of its all-X state. Idempotent; runs automatically before the
    /// first tick.
    pub fn initialize(&mut self, ctx: &mut DesignContext) -> Result<(), SimError> {
        if self.initialized {
            return Ok(());
        }
        self.initialized = true;
        let mut wake = Vec::new();
        for (id, sig) in ctx.signals.iter() {
            if matches!(sig.source, Some(Driver::Wire(_)) | Some(Driver::Expr(_))) {
                wake.push(WakeItem::Eval(id));
            }
        }
        for (pid, proc) in ctx.processes.iter() {
            if proc.kind == ProcessKind::Combinational {
                wake.push(WakeItem::Comb(pid));
            }
        }
        let updates = self.run_wake(ctx, &wake);
        let changed = self.apply_updates(ctx, updates);
        self.run_deltas(ctx, changed)
    }

    /// Advances to the next queued timestamp and processes every entry
    /// there, then settles propagation.
    pub fn tick(&mut self, ctx: &mut DesignContext) -> Result<StepResult, SimError> {
        self.initialize(ctx)?;
        let Some(fs) = self.next_event_fs() else {
            return Ok(StepResult::Idle);
        };
        if let Some(limit) = self.config.time_limit {
            if fs > limit {
                return Ok(StepResult::Idle);
            }
        }

        let mut events = Vec::new();
        while self.next_event_fs() == Some(fs) {
            if let Some(Reverse(e)) = self.queue.pop() {
                events.push(e);
            }
        }

        self.current_time = self.current_time.advance_to(fs);

        // Re-arm recurring entries before applying, so a clock keeps
        // running even if a callback drains the queue.
        for e in &events {
            if let Some(half) = e.repeat {
                let inverted = !&e.value;
                self.schedule(fs + half, e.signal, inverted, Some(half));
            }
        }

        let mut changed = Vec::new();
        for e in events {
            if ctx.signals[e.signal].value != e.value {
                let old = std::mem::replace(&mut ctx.signals[e.signal].value, e.value);
                ctx.signals[e.signal].prev_value = old.clone();
                self.emit_glitch(e.signal, &old, ctx);
                changed.push((e.signal, old));
            }
        }

        self.run_deltas(ctx, changed)?;
        Ok(StepResult::Advanced)
    }

    /// Processes every entry queued at the current timestamp (the drives
    /// applied since the last advance) and settles propagation.
    pub fn settle(&mut self, ctx: &mut DesignContext) -> Result<(), SimError> {
        self.initialize(ctx)?;
        while self.next_event_fs() == Some(self.current_time.fs) {
            self.tick(ctx)?;
        }
        Ok(())
    }

    /// Ticks until the queue holds nothing at or before `end_fs`, then
    /// leaves the current time at `end_fs`.
    pub fn run_until(&mut self, ctx: &mut DesignContext, end_fs: u64) -> Result<(), SimError> {
        self.initialize(ctx)?;
        while let Some(fs) = self.next_event_fs() {
            if fs > end_fs {
                break;
            }
            if self.tick(ctx)? == StepResult::Idle {
                break;
            }
        }
        if end_fs > self.current_time.fs {
            self.current_time = self.current_time.advance_to(end_fs);
        }
        Ok(())
    }

    /// Discards every pending entry and returns to time zero.
    ///
    /// Signal values are left as they are, and recurring clock toggles
    /// are dropped with everything else; re-arm clocks with
    /// [`restart_clock`](SimKernel::restart_clock) before reusing the
    /// kernel.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.current_time = SimTime::zero();
        self.seq = 0;
        self.glitches.clear();
    }

    fn next_event_fs(&self) -> Option<u64> {
        self.queue.peek().map(|Reverse(e)| e.at_fs)
    }

    /// The delta-cycle loop: wake consumers of the changed signals,
    /// compute their new values, apply, repeat until stable.
    fn run_deltas(
        &mut self,
        ctx: &mut DesignContext,
        mut changed: Vec<(SignalId, LogicVec)>,
    ) -> Result<(), SimError> {
        let mut delta = 0u32;
        while !changed.is_empty() {
            let wake = self.wake_consumers(ctx, &changed);
            if wake.is_empty() {
                break;
            }
            let updates = self.run_wake(ctx, &wake);
            changed = self.apply_updates(ctx, updates);
            if changed.is_empty() {
                break;
            }
            delta += 1;
            self.current_time.delta = delta;
            if delta > self.config.max_delta_per_step {
                return Err(SimError::DeltaCycleLimit {
                    fs: self.current_time.fs,
                    max_deltas: self.config.max_delta_per_step,
                });
            }
        }
        Ok(())
    }

    fn wake_consumers(
        &self,
        ctx: &DesignContext,
        changed: &[(SignalId, LogicVec)],
    ) -> Vec<WakeItem> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for (sig, old) in changed {
            if let Some(consumers) = self.consumers.get(sig) {
                for c in consumers {
                    let item = match c {
                        Consumer::Driven(s) => WakeItem::Eval(*s),
                        Consumer::Comb(p) => WakeItem::Comb(*p),
                    };
                    if seen.insert(item) {
                        out.push(item);
                    }
                }
            }
            if let Some(ffs) = self.ff_clocks.get(sig) {
                let is_rising = ctx.signals[*sig].width == 1
                    && ctx.signals[*sig].value.is_rising_edge_from(old);
                if is_rising {
                    for p in ffs {
                        let item = WakeItem::Ff(*p);
                        if seen.insert(item) {
                            out.push(item);
                        }
                    }
                }
            }
        }
        out
    }

    /// Computes new values for the woken items. Sequential blocks sample
    /// the context as it stands, pre-update, because nothing is applied
    /// until [`apply_updates`].
    fn run_wake(&self, ctx: &DesignContext, wake: &[WakeItem]) -> Vec<(SignalId, LogicVec)> {
        let mut updates: Vec<(SignalId, LogicVec)> = Vec::new();
        let mut index: HashMap<SignalId, usize> = HashMap::new();
        for item in wake {
            match item {
                WakeItem::Eval(sig) => {
                    let value = match &ctx.signals[*sig].source {
                        Some(Driver::Wire(src)) => ctx.signals[*src].value.clone(),
                        Some(Driver::Expr(expr)) => eval_expr(ctx, expr, None),
                        _ => continue,
                    };
                    push_update(&mut updates, &mut index, *sig, value);
                }
                WakeItem::Comb(pid) => {
                    let mut pending = PendingWrites::new();
                    exec_block(ctx, &ctx.processes[*pid].body, AssignMode::Blocking, &mut pending);
                    for (sig, value) in pending.iter() {
                        push_update(&mut updates, &mut index, sig, value.clone());
                    }
                }
                WakeItem::Ff(pid) => {
                    let mut pending = PendingWrites::new();
                    exec_block(
                        ctx,
                        &ctx.processes[*pid].body,
                        AssignMode::NonBlocking,
                        &mut pending,
                    );
                    for (sig, value) in pending.iter() {
                        push_update(&mut updates, &mut index, sig, value.clone());
                    }
                }
            }
        }
        updates
    }

    /// Applies computed values, recording a glitch for every actual
    /// change. Returns the changed set with pre-change values.
    fn apply_updates(
        &mut self,
        ctx: &mut DesignContext,
        updates: Vec<(SignalId, LogicVec)>,
    ) -> Vec<(SignalId, LogicVec)> {
        let mut changed = Vec::new();
        for (sig, value) in updates {
            if ctx.signals[sig].value != value {
                let old = std::mem::replace(&mut ctx.signals[sig].value, value);
                ctx.signals[sig].prev_value = old.clone();
                self.emit_glitch(sig, &old, ctx);
                changed.push((sig, old));
            }
        }
        changed
    }

    fn emit_glitch(&mut self, signal: SignalId, old: &LogicVec, ctx: &DesignContext) {
        let glitch = Glitch {
            time: self.current_time,
            signal,
            old: old.clone(),
            new: ctx.signals[signal].value.clone(),
        };
        if let Some(observer) = self.observer.as_mut() {
            observer.on_glitch(&glitch);
        }
        self.glitches.push(glitch);
    }
}

/// Last-write-wins insert preserving first-write order.
fn push_update(
    updates: &mut Vec<(SignalId, LogicVec)>,
    index: &mut HashMap<SignalId, usize>,
    sig: SignalId,
    value: LogicVec,
) {
    if let Some(&i) = index.get(&sig) {
        updates[i].1 = value;
    } else {
        index.insert(sig, updates.len());
        updates.push((sig, value));
    }
}
