//! SystemVerilog testbench generation.
//!
//! The testbench applies the same per-period protocol as the in-memory
//! runner: assign inputs, wait one clock period, compare outputs with
//! `!==` and `$fatal` on mismatch. A design's clock is internal (the
//! clock generator module emits its own toggle), so the testbench only
//! touches data ports.

use std::fmt::Write;

use weft_graph::{DesignContext, ModuleId};

use crate::error::CosimError;
use crate::vector::{LogicValue, Vector};

/// Renders a self-checking testbench for the built module `top`.
///
/// `period_fs` must match the design's clock period; the generated
/// stimulus advances `#period_fs` per vector under a `1fs` timescale.
/// On success the testbench prints `ALL VECTORS PASSED` and finishes.
pub fn render_testbench(
    ctx: &DesignContext,
    top: ModuleId,
    period_fs: u64,
    vectors: &[Vector],
) -> Result<String, CosimError> {
    let m = &ctx.modules[top];
    let top_name = weft_graph::sanitize_identifier(ctx.module_name(top));

    let mut out = String::new();
    out.push_str("`timescale 1fs / 1fs\n\n");
    out.push_str("module testbench;\n");

    for &(name, sig) in m.inputs.iter().chain(m.outputs.iter()) {
        let width = ctx.signals[sig].width;
        let spec = if width > 1 {
            format!("[{}:0] ", width - 1)
        } else {
            String::new()
        };
        let _ = writeln!(out, "  logic {spec}{};", ctx.interner().resolve(name));
    }

    let conns: Vec<String> = m
        .inputs
        .iter()
        .chain(m.outputs.iter())
        .map(|&(name, _)| {
            let n = ctx.interner().resolve(name);
            format!("    .{n}({n})")
        })
        .collect();
    let _ = writeln!(out, "\n  {top_name} dut (\n{}\n  );", conns.join(",\n"));

    out.push_str("\n  initial begin\n");
    for (index, vector) in vectors.iter().enumerate() {
        let _ = writeln!(out, "    // vector {index}");
        for (name, value) in &vector.inputs {
            let port = ctx
                .input_port(top, name)
                .ok_or_else(|| CosimError::UnknownPort { port: name.clone() })?;
            let width = ctx.signals[port].width;
            match value {
                LogicValue::Value(v) => {
                    let _ = writeln!(out, "    {name} = {width}'d{v};");
                }
                LogicValue::X => {
                    let _ = writeln!(out, "    {name} = 'x;");
                }
            }
        }
        let _ = writeln!(out, "    #{period_fs};");
        for (name, expected) in &vector.expected {
            let port = ctx
                .output_port(top, name)
                .ok_or_else(|| CosimError::UnknownPort { port: name.clone() })?;
            let width = ctx.signals[port].width;
            if let LogicValue::Value(v) = expected {
                let _ = writeln!(
                    out,
                    "    if ({name} !== {width}'d{v}) $fatal(1, \"vector {index}: {name} expected {v}, got %0d\", {name});"
                );
            }
        }
    }
    out.push_str("    $display(\"ALL VECTORS PASSED\");\n");
    out.push_str("    $finish;\n");
    out.push_str("  end\nendmodule\n");
    Ok(out)
}
