//! Emission tests: generated text shape, type collapsing, determinism,
//! and emission-time validation.

use weft_common::LogicVec;
use weft_graph::stmt::{CaseItem, CaseKind, ConditionalType};
use weft_graph::{DesignContext, Expr, ModuleId, SignalId, Stmt};
use weft_sim::{SimConfig, SimKernel};
use weft_synth::{emit_design, SynthError};

/// An adder stage: `s = a + b`, instantiated twice from `top`.
fn adder_stage(ctx: &mut DesignContext, a: SignalId, b: SignalId) -> (ModuleId, SignalId) {
    let m = ctx.add_module("adder").unwrap();
    let pa = ctx.add_input(m, "a", a, 4).unwrap();
    let pb = ctx.add_input(m, "b", b, 4).unwrap();
    let sum = ctx.add_output(m, "s", 4).unwrap();
    let add = ctx.add(pa, pb).unwrap();
    ctx.connect(sum, add).unwrap();
    (m, sum)
}

fn two_adder_design() -> (DesignContext, ModuleId) {
    let mut ctx = DesignContext::new();
    let top = ctx.add_module("top").unwrap();
    let x = ctx.signal("x", 4);
    let y = ctx.signal("y", 4);
    let z = ctx.signal("z", 4);
    let top_x = ctx.add_input(top, "x", x, 4).unwrap();
    let top_y = ctx.add_input(top, "y", y, 4).unwrap();
    let top_z = ctx.add_input(top, "z", z, 4).unwrap();
    let out = ctx.add_output(top, "total", 4).unwrap();

    let (_, s1) = adder_stage(&mut ctx, top_x, top_y);
    let (_, s2) = adder_stage(&mut ctx, s1, top_z);
    let total = ctx.signal("total_wire", 4);
    ctx.connect(total, s2).unwrap();
    ctx.connect(out, total).unwrap();
    ctx.build(top).unwrap();
    (ctx, top)
}

#[test]
fn emission_requires_build() {
    let mut ctx = DesignContext::new();
    let m = ctx.add_module("m").unwrap();
    let err = emit_design(&ctx, m).unwrap_err();
    assert!(matches!(err, SynthError::Graph(_)));
}

#[test]
fn identical_instances_share_one_definition() {
    let (ctx, top) = two_adder_design();
    let text = emit_design(&ctx, top).unwrap();
    assert_eq!(text.matches("module adder (").count(), 1);
    // Both instances reference the shared definition with uniquified
    // names.
    assert!(text.contains("adder adder ("));
    assert!(text.contains("adder adder_1 ("));
}

#[test]
fn definitions_precede_uses() {
    let (ctx, top) = two_adder_design();
    let text = emit_design(&ctx, top).unwrap();
    let adder_def = text.find("module adder (").unwrap();
    let top_def = text.find("module top (").unwrap();
    assert!(adder_def < top_def);
}

#[test]
fn generated_text_is_deterministic() {
    let (ctx1, top1) = two_adder_design();
    let (ctx2, top2) = two_adder_design();
    assert_eq!(
        emit_design(&ctx1, top1).unwrap(),
        emit_design(&ctx2, top2).unwrap()
    );
}

#[test]
fn port_declarations_carry_widths() {
    let (ctx, top) = two_adder_design();
    let text = emit_design(&ctx, top).unwrap();
    assert!(text.contains("input logic [3:0] x"));
    assert!(text.contains("output logic [3:0] total"));
    assert!(text.contains("assign total = total_wire;"));
}

#[test]
fn derived_expression_is_inlined_at_single_use() {
    let mut ctx = DesignContext::new();
    let m = ctx.add_module("m").unwrap();
    let a = ctx.signal("a", 1);
    let pa = ctx.add_input(m, "a", a, 1).unwrap();
    let y = ctx.add_output(m, "y", 1).unwrap();
    let n = ctx.not(pa);
    ctx.connect(y, n).unwrap();
    ctx.build(m).unwrap();
    let text = emit_design(&ctx, m).unwrap();
    // The unpreferred derived net disappears; its expression lands in the
    // assign.
    assert!(text.contains("assign y = (~a);"));
    assert!(!text.contains("_w0"));
}

#[test]
fn always_comb_and_case_render() {
    let mut ctx = DesignContext::new();
    let m = ctx.add_module("decoder").unwrap();
    let ext = ctx.signal("ext", 2);
    let sel = ctx.add_input(m, "sel", ext, 2).unwrap();
    let hit = ctx.add_output(m, "hit", 1).unwrap();
    ctx.add_combinational(
        m,
        vec![Stmt::Case {
            selector: Expr::signal(sel),
            items: vec![CaseItem {
                pattern: LogicVec::from_binary_str("01").unwrap(),
                body: vec![Stmt::assign(hit, Expr::lit_u64(1, 1))],
            }],
            default: vec![Stmt::assign(hit, Expr::lit_u64(0, 1))],
            kind: CaseKind::Casez,
            cond_type: ConditionalType::Unique,
        }],
    )
    .unwrap();
    ctx.build(m).unwrap();
    let text = emit_design(&ctx, m).unwrap();
    assert!(text.contains("always_comb begin"));
    assert!(text.contains("unique casez (sel)"));
    assert!(text.contains("2'b01: begin"));
    assert!(text.contains("hit = 1'b1;"));
    assert!(text.contains("default: begin"));
}

#[test]
fn always_ff_renders_nonblocking_with_clock_edge() {
    let mut ctx = DesignContext::new();
    let m = ctx.add_module("reg_stage").unwrap();
    let ext = ctx.signal("ext", 1);
    let d = ctx.add_input(m, "d", ext, 1).unwrap();
    let q = ctx.add_output(m, "q", 1).unwrap();

    let mut kernel = SimKernel::new(&ctx, SimConfig::default());
    let clock = kernel.add_clock(&mut ctx, "clk", 5).unwrap();
    ctx.add_ff(m, clock.clk, vec![Stmt::assign(q, Expr::signal(d))])
        .unwrap();
    ctx.build(m).unwrap();

    let text = emit_design(&ctx, m).unwrap();
    assert!(text.contains("always_ff @(posedge clk_gen_clk) begin"));
    assert!(text.contains("q <= d;"));
    // The clock generator emitted its custom template, not a generated
    // body.
    assert!(text.contains("module clk_gen"));
    assert!(text.contains("forever #5 clk = ~clk;"));
}

#[test]
fn two_ff_drivers_of_one_signal_rejected() {
    let mut ctx = DesignContext::new();
    let m = ctx.add_module("m").unwrap();
    let clk = ctx.signal("clk", 1);
    let clk2 = ctx.signal("clk2", 1);
    let q = ctx.signal("q", 1);
    let q2 = ctx.signal("q2", 1);
    ctx.add_ff(m, clk, vec![Stmt::assign(q, Expr::lit_u64(0, 1))])
        .unwrap();
    // The graph rejects a second driver of q outright; registering
    // against a fresh target and patching the process table simulates
    // the cross-block case the emitter must catch.
    let pid = ctx
        .add_ff(m, clk2, vec![Stmt::assign(q2, Expr::lit_u64(1, 1))])
        .unwrap();
    ctx.processes[pid].targets = vec![q];
    ctx.processes[pid].body = vec![Stmt::assign(q, Expr::lit_u64(1, 1))];
    ctx.build(m).unwrap();

    let err = emit_design(&ctx, m).unwrap_err();
    match err {
        SynthError::MultipleDrivers { path, signal } => {
            assert_eq!(path, "m");
            assert_eq!(signal, "q");
        }
        other => panic!("expected MultipleDrivers, got {other}"),
    }
}

#[test]
fn unique_case_overlap_rejected() {
    let mut ctx = DesignContext::new();
    let m = ctx.add_module("m").unwrap();
    let sel = ctx.signal("sel", 2);
    let out = ctx.signal("out", 1);
    ctx.add_combinational(
        m,
        vec![Stmt::Case {
            selector: Expr::signal(sel),
            items: vec![
                CaseItem {
                    pattern: LogicVec::from_binary_str("z1").unwrap(),
                    body: vec![Stmt::assign(out, Expr::lit_u64(1, 1))],
                },
                CaseItem {
                    pattern: LogicVec::from_binary_str("11").unwrap(),
                    body: vec![Stmt::assign(out, Expr::lit_u64(0, 1))],
                },
            ],
            default: vec![],
            kind: CaseKind::Casez,
            cond_type: ConditionalType::Unique,
        }],
    )
    .unwrap();
    ctx.build(m).unwrap();
    assert!(matches!(
        emit_design(&ctx, m).unwrap_err(),
        SynthError::CaseOverlap { .. }
    ));
}

#[test]
fn priority_case_without_default_must_cover() {
    let mut ctx = DesignContext::new();
    let m = ctx.add_module("m").unwrap();
    let sel = ctx.signal("sel", 2);
    let out = ctx.signal("out", 1);
    ctx.add_combinational(
        m,
        vec![Stmt::Case {
            selector: Expr::signal(sel),
            items: vec![CaseItem {
                pattern: LogicVec::from_binary_str("00").unwrap(),
                body: vec![Stmt::assign(out, Expr::lit_u64(1, 1))],
            }],
            default: vec![],
            kind: CaseKind::Exact,
            cond_type: ConditionalType::Priority,
        }],
    )
    .unwrap();
    ctx.build(m).unwrap();
    assert!(matches!(
        emit_design(&ctx, m).unwrap_err(),
        SynthError::CaseNotExhaustive { .. }
    ));
}

#[test]
fn priority_case_with_full_casez_coverage_accepted() {
    let mut ctx = DesignContext::new();
    let m = ctx.add_module("m").unwrap();
    let sel = ctx.signal("sel", 2);
    let out = ctx.signal("out", 1);
    ctx.add_combinational(
        m,
        vec![Stmt::Case {
            selector: Expr::signal(sel),
            items: vec![
                CaseItem {
                    pattern: LogicVec::from_binary_str("z1").unwrap(),
                    body: vec![Stmt::assign(out, Expr::lit_u64(1, 1))],
                },
                CaseItem {
                    pattern: LogicVec::from_binary_str("z0").unwrap(),
                    body: vec![Stmt::assign(out, Expr::lit_u64(0, 1))],
                },
            ],
            default: vec![],
            kind: CaseKind::Casez,
            cond_type: ConditionalType::Priority,
        }],
    )
    .unwrap();
    ctx.build(m).unwrap();
    assert!(emit_design(&ctx, m).is_ok());
}
