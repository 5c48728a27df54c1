//! Virtual simulation time.
//!
//! [`SimTime`] pairs a femtosecond timestamp with a delta-cycle index.
//! Scheduled events are ordered by timestamp; delta cycles order the
//! instantaneous propagation steps within one timestamp, so glitch
//! fan-out at time *t* always completes before time advances past *t*.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Femtoseconds per picosecond.
pub const FS_PER_PS: u64 = 1_000;
/// Femtoseconds per nanosecond.
pub const FS_PER_NS: u64 = 1_000_000;

/// A point in virtual time: femtoseconds plus a delta-cycle index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimTime {
    /// Virtual time in femtoseconds.
    pub fs: u64,
    /// Delta-cycle index within this timestamp.
    pub delta: u32,
}

impl SimTime {
    /// Time zero.
    pub fn zero() -> Self {
        Self { fs: 0, delta: 0 }
    }

    /// A timestamp in femtoseconds, delta zero.
    pub fn from_fs(fs: u64) -> Self {
        Self { fs, delta: 0 }
    }

    /// A timestamp in nanoseconds, delta zero.
    pub fn from_ns(ns: u64) -> Self {
        Self {
            fs: ns * FS_PER_NS,
            delta: 0,
        }
    }

    /// The next delta cycle at the same timestamp.
    pub fn next_delta(&self) -> Self {
        Self {
            fs: self.fs,
            delta: self.delta + 1,
        }
    }

    /// A later timestamp with the delta counter reset.
    ///
    /// # Panics
    ///
    /// Debug-asserts that time does not move backwards.
    pub fn advance_to(&self, fs: u64) -> Self {
        debug_assert!(fs >= self.fs, "time moved backwards: {} -> {fs}", self.fs);
        Self { fs, delta: 0 }
    }
}

impl Default for SimTime {
    fn default() -> Self {
        Self::zero()
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fs.cmp(&other.fs).then(self.delta.cmp(&other.delta))
    }
}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fs = self.fs;
        if fs >= FS_PER_NS && fs % FS_PER_NS == 0 {
            write!(f, "{} ns", fs / FS_PER_NS)?;
        } else if fs >= FS_PER_PS && fs % FS_PER_PS == 0 {
            write!(f, "{} ps", fs / FS_PER_PS)?;
        } else {
            write!(f, "{fs} fs")?;
        }
        if self.delta > 0 {
            write!(f, "+d{}", self.delta)?;
        }
        Ok(())
    }
}
