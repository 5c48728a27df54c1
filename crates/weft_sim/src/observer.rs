//! The glitch stream: value-change events delivered by the kernel.

use crate::time::SimTime;
use weft_common::LogicVec;
use weft_graph::SignalId;

/// A signal value change observed at a point in virtual time.
#[derive(Debug, Clone, PartialEq)]
pub struct Glitch {
    /// When the change was applied.
    pub time: SimTime,
    /// The signal that changed.
    pub signal: SignalId,
    /// The value before the change.
    pub old: LogicVec,
    /// The value after the change.
    pub new: LogicVec,
}

/// Receiver for the kernel's glitch stream.
///
/// Attach with [`SimKernel::set_observer`](crate::kernel::SimKernel::set_observer)
/// to watch every value change as it is applied; the kernel also keeps a
/// drainable log for callers that prefer polling.
pub trait GlitchObserver {
    /// Called once per applied value change, in application order.
    fn on_glitch(&mut self, glitch: &Glitch);
}
