//! Binding to the external reference simulator (Icarus Verilog).
//!
//! The generated design and testbench are written into a temporary
//! directory, compiled with `iverilog -g2012`, and executed with `vvp`;
//! the run passes when the testbench prints its success marker. A
//! missing toolchain is reported as
//! [`ReferenceUnavailable`](CosimError::ReferenceUnavailable) so callers
//! can skip rather than fail.

use std::io;
use std::process::Command;

use weft_graph::{DesignContext, ModuleId};
use weft_sim::{ClockGenerator, SimKernel};
use weft_synth::emit_design;

use crate::error::CosimError;
use crate::runner::run_vectors;
use crate::testbench::render_testbench;
use crate::vector::Vector;

/// The marker the generated testbench prints on success.
const SUCCESS_MARKER: &str = "ALL VECTORS PASSED";

/// Compiles and runs generated HDL plus a testbench under Icarus
/// Verilog.
pub fn run_reference(design_sv: &str, testbench_sv: &str) -> Result<(), CosimError> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("design.sv"), design_sv)?;
    std::fs::write(dir.path().join("testbench.sv"), testbench_sv)?;

    let compile = spawn(
        Command::new("iverilog")
            .args(["-g2012", "-o", "sim.vvp", "design.sv", "testbench.sv"])
            .current_dir(dir.path()),
        "iverilog",
    )?;
    if !compile.status.success() {
        return Err(CosimError::ReferenceFailed {
            output: String::from_utf8_lossy(&compile.stderr).into_owned(),
        });
    }

    let run = spawn(
        Command::new("vvp").arg("sim.vvp").current_dir(dir.path()),
        "vvp",
    )?;
    let stdout = String::from_utf8_lossy(&run.stdout);
    if !run.status.success() || !stdout.contains(SUCCESS_MARKER) {
        return Err(CosimError::ReferenceFailed {
            output: format!("{stdout}{}", String::from_utf8_lossy(&run.stderr)),
        });
    }
    Ok(())
}

fn spawn(command: &mut Command, tool: &str) -> Result<std::process::Output, CosimError> {
    match command.output() {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(CosimError::ReferenceUnavailable {
            tool: tool.to_string(),
            reason: e.to_string(),
        }),
        other => Ok(other?),
    }
}

/// The full co-simulation contract: run `vectors` on the in-memory
/// simulator, emit the design, generate the matching testbench, and
/// re-run everything under the reference simulator. Both must agree on
/// every vector.
pub fn cross_check(
    ctx: &mut DesignContext,
    kernel: &mut SimKernel,
    top: ModuleId,
    clock: &ClockGenerator,
    vectors: &[Vector],
) -> Result<(), CosimError> {
    run_vectors(ctx, kernel, top, clock, vectors)?;
    let design = emit_design(ctx, top)?;
    let testbench = render_testbench(ctx, top, clock.period_fs(), vectors)?;
    run_reference(&design, &testbench)
}
