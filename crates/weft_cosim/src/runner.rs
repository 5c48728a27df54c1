//! The in-memory vector runner.
//!
//! For each vector: apply the inputs, advance one clock period (one
//! rising edge), compare every declared expectation bit-exact. This is
//! the same protocol the generated testbench follows, so the in-memory
//! simulator and the reference simulator see identical stimulus.

use weft_graph::{DesignContext, Driver, ModuleId};
use weft_sim::{ClockGenerator, SimKernel};

use crate::error::CosimError;
use crate::vector::Vector;

/// Runs `vectors` against the in-memory simulator.
///
/// Inputs are driven onto each port's external source signal; expected
/// outputs are read from the top module's output ports after the period
/// elapses. Don't-care expectations match anything.
pub fn run_vectors(
    ctx: &mut DesignContext,
    kernel: &mut SimKernel,
    top: ModuleId,
    clock: &ClockGenerator,
    vectors: &[Vector],
) -> Result<(), CosimError> {
    let period = clock.period_fs();
    let mut cycle_end = kernel.current_time().fs;
    for (index, vector) in vectors.iter().enumerate() {
        for (name, value) in &vector.inputs {
            let port = ctx
                .input_port(top, name)
                .ok_or_else(|| CosimError::UnknownPort { port: name.clone() })?;
            // Drive the signal the instantiator provided, not the port
            // itself; the port follows through its wire.
            let target = match &ctx.signals[port].source {
                Some(Driver::Wire(src)) => *src,
                _ => port,
            };
            let width = ctx.signals[target].width;
            kernel.drive(ctx, target, value.to_logic_vec(width))?;
        }
        cycle_end += period;
        kernel.run_until(ctx, cycle_end)?;
        for (name, expected) in &vector.expected {
            let port = ctx
                .output_port(top, name)
                .ok_or_else(|| CosimError::UnknownPort { port: name.clone() })?;
            let actual = ctx.value(port);
            if !expected.matches(actual) {
                return Err(CosimError::VectorMismatch {
                    index,
                    signal: name.clone(),
                    expected: expected.to_string(),
                    actual: format!("{actual:?}"),
                });
            }
        }
    }
    Ok(())
}
