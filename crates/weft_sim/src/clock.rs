//! Clock generation.
//!
//! A clock generator is an ordinary module whose single output toggles on
//! a recurring schedule: low from time zero, rising every full period.
//! The module carries a custom SystemVerilog body, so emission produces a
//! behavioral toggle instead of a generated (and driverless) definition.

use weft_common::LogicVec;
use weft_graph::{DesignContext, ModuleId, SignalId};

use crate::error::SimError;
use crate::kernel::SimKernel;

/// Handle to a generated clock: its module, its output signal, and its
/// half period.
#[derive(Debug, Clone, Copy)]
pub struct ClockGenerator {
    /// The clock generator module (custom-emission black box).
    pub module: ModuleId,
    /// The clock output signal.
    pub clk: SignalId,
    /// Half period in femtoseconds.
    pub half_period_fs: u64,
}

impl ClockGenerator {
    /// The full clock period in femtoseconds.
    pub fn period_fs(&self) -> u64 {
        self.half_period_fs * 2
    }
}

impl SimKernel {
    /// Creates a clock generator module and registers its recurring
    /// half-period toggle: the output named `name` starts low at time
    /// zero and first rises at `half_period_fs`.
    pub fn add_clock(
        &mut self,
        ctx: &mut DesignContext,
        name: &str,
        half_period_fs: u64,
    ) -> Result<ClockGenerator, SimError> {
        let module_name = format!("{name}_gen");
        let module = ctx.add_module(&module_name)?;
        let clk = ctx.add_output(module, name, 1)?;
        ctx.set_custom_sv(
            module,
            format!(
                "module {module_name}(\n  output logic {name}\n);\n  initial begin\n    {name} = 1'b0;\n    forever #{half_period_fs} {name} = ~{name};\n  end\nendmodule"
            ),
        );
        let clock = ClockGenerator {
            module,
            clk,
            half_period_fs,
        };
        self.restart_clock(ctx, &clock)?;
        Ok(clock)
    }

    /// Re-arms a clock after [`reset`](SimKernel::reset): forces the
    /// output low and schedules the next rising toggle one half period
    /// from the current time.
    pub fn restart_clock(
        &mut self,
        ctx: &mut DesignContext,
        clock: &ClockGenerator,
    ) -> Result<(), SimError> {
        ctx.put(clock.clk, LogicVec::from_bool(false))?;
        self.schedule(
            self.current_time().fs + clock.half_period_fs,
            clock.clk,
            LogicVec::from_bool(true),
            Some(clock.half_period_fs),
        );
        Ok(())
    }
}
