//! The counter contract end to end: in-memory vectors, generated
//! testbench, and (behind `iverilog-tests`) reference agreement.

use weft_cosim::{run_vectors, Vector};
use weft_graph::{DesignContext, Expr, IfArm, ModuleId, Stmt};
use weft_sim::{ClockGenerator, SimConfig, SimKernel};

/// The 8-bit synchronous counter: reset dominates, enable increments,
/// otherwise hold.
fn counter_design() -> (DesignContext, ModuleId, ClockGenerator) {
    let mut ctx = DesignContext::new();
    let counter = ctx.add_module("counter").unwrap();
    let ext_en = ctx.signal("ext_en", 1);
    let ext_reset = ctx.signal("ext_reset", 1);
    let en = ctx.add_input(counter, "en", ext_en, 1).unwrap();
    let reset = ctx.add_input(counter, "reset", ext_reset, 1).unwrap();
    let val = ctx.add_output(counter, "val", 8).unwrap();

    let mut boot = SimKernel::new(&ctx, SimConfig::default());
    let clock = boot.add_clock(&mut ctx, "clk", 5).unwrap();
    ctx.add_ff(
        counter,
        clock.clk,
        vec![Stmt::If {
            arms: vec![
                IfArm {
                    condition: Expr::signal(reset),
                    body: vec![Stmt::assign(val, Expr::lit_u64(0, 8))],
                },
                IfArm {
                    condition: Expr::signal(en),
                    body: vec![Stmt::assign(
                        val,
                        Expr::binary(
                            weft_graph::BinaryOp::Add,
                            Expr::signal(val),
                            Expr::lit_u64(1, 8),
                        ),
                    )],
                },
            ],
            else_body: vec![],
        }],
    )
    .unwrap();
    ctx.build(counter).unwrap();
    (ctx, counter, clock)
}

fn counter_vectors() -> Vec<Vector> {
    vec![
        Vector::new().input("en", 0).input("reset", 1).expect("val", 0),
        Vector::new().input("en", 1).input("reset", 0).expect("val", 1),
        Vector::new().expect("val", 2),
        Vector::new().expect("val", 3),
        Vector::new().expect("val", 4),
        Vector::new().input("en", 0).expect("val", 4),
        Vector::new().expect("val", 4),
    ]
}

#[test]
fn counter_vectors_pass_in_memory() {
    let (mut ctx, counter, clock) = counter_design();
    let mut kernel = SimKernel::new(&ctx, SimConfig::default());
    kernel.restart_clock(&mut ctx, &clock).unwrap();
    run_vectors(&mut ctx, &mut kernel, counter, &clock, &counter_vectors()).unwrap();
}

#[test]
fn fresh_contexts_are_isolated_between_cases() {
    // Two complete sessions back to back; the second must not observe
    // the first's scheduler or values.
    for _ in 0..2 {
        let (mut ctx, counter, clock) = counter_design();
        let mut kernel = SimKernel::new(&ctx, SimConfig::default());
        kernel.restart_clock(&mut ctx, &clock).unwrap();
        run_vectors(&mut ctx, &mut kernel, counter, &clock, &counter_vectors()).unwrap();
    }
}

#[test]
fn emitted_counter_contains_interface_ports() {
    let (ctx, counter, _clock) = counter_design();
    let text = weft_synth::emit_design(&ctx, counter).unwrap();
    assert!(text.contains("module counter ("));
    assert!(text.contains("input logic en"));
    assert!(text.contains("input logic reset"));
    assert!(text.contains("output logic [7:0] val"));
    assert!(text.contains("always_ff"));
}

#[cfg(feature = "iverilog-tests")]
#[test]
fn counter_agrees_with_reference_simulator() {
    let (mut ctx, counter, clock) = counter_design();
    let mut kernel = SimKernel::new(&ctx, SimConfig::default());
    kernel.restart_clock(&mut ctx, &clock).unwrap();
    weft_cosim::cross_check(&mut ctx, &mut kernel, counter, &clock, &counter_vectors()).unwrap();
}
