//! End-to-end behavioral scenarios: build a design through the graph DSL,
//! then check what the simulator observes.

use weft_common::LogicVec;
use weft_graph::stmt::{CaseItem, CaseKind, ConditionalType};
use weft_graph::{DesignContext, Expr, Interface, Stmt};
use weft_sim::{SimConfig, SimKernel};

/// Three-level hierarchy combined with OR.
///
/// `top` contains `inner1` (a constant-zero output `m`) and a passthrough
/// of `inner2`'s constant-one output `z` through `inner1`'s `y`; the top
/// output is `x = y | m`, which must settle to 1 with no inputs at all.
#[test]
fn three_level_hierarchy_or_combine() {
    let mut ctx = DesignContext::new();

    let top = ctx.add_module("top_module").unwrap();
    let inner1 = ctx.add_module("inner_module1").unwrap();
    let inner2 = ctx.add_module("inner_module2").unwrap();

    // inner2: output z = 1
    let one = ctx.constant(LogicVec::from_bool(true));
    let z = ctx.add_output(inner2, "z", 1).unwrap();
    ctx.connect(z, one).unwrap();

    // inner1: output m = 0; output y = inner2.z through a passthrough
    // wire interior to inner1.
    let zero = ctx.constant(LogicVec::from_bool(false));
    let m_out = ctx.add_output(inner1, "m", 1).unwrap();
    ctx.connect(m_out, zero).unwrap();
    let pass = ctx.signal("pass", 1);
    ctx.connect(pass, z).unwrap();
    let y_out = ctx.add_output(inner1, "y", 1).unwrap();
    ctx.connect(y_out, pass).unwrap();

    // top: x = y | m
    let x = ctx.add_output(top, "x", 1).unwrap();
    let or = ctx.or(y_out, m_out).unwrap();
    ctx.connect(x, or).unwrap();

    ctx.build(top).unwrap();

    // Three levels: inner1 under top; inner2 under inner1, discovered
    // through the passthrough inside inner1.
    assert_eq!(ctx.modules[top].submodules, vec![inner1]);
    assert_eq!(ctx.modules[inner1].submodules, vec![inner2]);
    assert!(ctx.modules[inner1].internals.contains(&pass));

    let mut kernel = SimKernel::new(&ctx, SimConfig::default());
    kernel.initialize(&mut ctx).unwrap();
    assert_eq!(ctx.value_u64(x).unwrap(), 1);
}

/// 8-bit synchronous counter wired through a direction-tagged interface.
#[test]
fn interface_counter_counts_and_holds() {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Dir {
        In,
        Out,
    }

    let mut ctx = DesignContext::new();
    let mut kernel = SimKernel::new(&ctx, SimConfig::default());

    // External view of the interface, driven by the test.
    let mut bus = Interface::new("counter_if");
    bus.add_port(&mut ctx, "en", 1, &[Dir::In]).unwrap();
    bus.add_port(&mut ctx, "reset", 1, &[Dir::In]).unwrap();
    bus.add_port(&mut ctx, "val", 8, &[Dir::Out]).unwrap();

    let counter = ctx.add_module("counter").unwrap();
    let mut local = bus.clone();
    local
        .connect_io(&mut ctx, counter, &bus, &[Dir::In], &[Dir::Out])
        .unwrap();

    let clock = kernel.add_clock(&mut ctx, "clk", 5).unwrap();
    let en = local.port("en").unwrap();
    let reset = local.port("reset").unwrap();
    let val = local.port("val").unwrap();

    // if (reset) val <= 0; else if (en) val <= val + 1;
    ctx.add_ff(
        counter,
        clock.clk,
        vec![Stmt::If {
            arms: vec![
                weft_graph::IfArm {
                    condition: Expr::signal(reset),
                    body: vec![Stmt::assign(val, Expr::lit_u64(0, 8))],
                },
                weft_graph::IfArm {
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
    // The clock generator is discovered through the FF's clock edge.
    assert!(ctx.modules[counter]
        .submodules
        .contains(&clock.module));

    // The kernel was created before the design existed; rebuild it now
    // and re-arm the clock.
    let mut kernel = SimKernel::new(&ctx, SimConfig::default());
    kernel.restart_clock(&mut ctx, &clock).unwrap();

    let period = clock.period_fs();
    let ext_en = bus.port("en").unwrap();
    let ext_reset = bus.port("reset").unwrap();

    let mut cycle_end = 0;
    let mut apply = |kernel: &mut SimKernel,
                     ctx: &mut DesignContext,
                     en_v: u64,
                     reset_v: u64|
     -> u64 {
        kernel
            .drive(ctx, ext_en, LogicVec::from_u64(en_v, 1))
            .unwrap();
        kernel
            .drive(ctx, ext_reset, LogicVec::from_u64(reset_v, 1))
            .unwrap();
        cycle_end += period;
        kernel.run_until(ctx, cycle_end).unwrap();
        ctx.value_u64(val).unwrap()
    };

    // reset high -> 0
    assert_eq!(apply(&mut kernel, &mut ctx, 0, 1), 0);
    // enabled for three cycles -> 1, 2, 3
    assert_eq!(apply(&mut kernel, &mut ctx, 1, 0), 1);
    assert_eq!(apply(&mut kernel, &mut ctx, 1, 0), 2);
    assert_eq!(apply(&mut kernel, &mut ctx, 1, 0), 3);
    // one more enabled cycle, then hold with enable low
    assert_eq!(apply(&mut kernel, &mut ctx, 1, 0), 4);
    assert_eq!(apply(&mut kernel, &mut ctx, 0, 0), 4);
    assert_eq!(apply(&mut kernel, &mut ctx, 0, 0), 4);
}

/// Self-referential combinational block: `x <= a; x <= ~x` settles to
/// `~a` (blocking reads observe the in-block write).
#[test]
fn self_referential_combinational_last_write_wins() {
    let mut ctx = DesignContext::new();
    let m = ctx.add_module("m").unwrap();
    let a = ctx.signal("a", 1);
    let x = ctx.signal("x", 1);
    ctx.add_combinational(
        m,
        vec![
            Stmt::assign(x, Expr::signal(a)),
            Stmt::assign(x, Expr::signal(x).not()),
        ],
    )
    .unwrap();

    let mut kernel = SimKernel::new(&ctx, SimConfig::default());
    kernel.drive(&ctx, a, LogicVec::from_bool(true)).unwrap();
    kernel.settle(&mut ctx).unwrap();
    assert_eq!(ctx.value_u64(x).unwrap(), 0);

    kernel.drive(&ctx, a, LogicVec::from_bool(false)).unwrap();
    kernel.settle(&mut ctx).unwrap();
    assert_eq!(ctx.value_u64(x).unwrap(), 1);

    // Re-evaluation with unchanged inputs leaves the output unchanged.
    kernel.drive(&ctx, a, LogicVec::from_bool(false)).unwrap();
    kernel.settle(&mut ctx).unwrap();
    assert_eq!(ctx.value_u64(x).unwrap(), 1);
}

/// Priority if/elseif/else over two inputs.
#[test]
fn priority_if_chain_truth_table() {
    let mut ctx = DesignContext::new();
    let m = ctx.add_module("m").unwrap();
    let a = ctx.signal("a", 1);
    let b = ctx.signal("b", 1);
    let c = ctx.signal("c", 1);
    let d = ctx.signal("d", 1);

    // if (a ^ b) { c = 1; d = 0 } else { c = 0; d = 1 }
    ctx.add_combinational(
        m,
        vec![Stmt::if_else(
            Expr::binary(weft_graph::BinaryOp::Xor, Expr::signal(a), Expr::signal(b)),
            vec![
                Stmt::assign(c, Expr::lit_u64(1, 1)),
                Stmt::assign(d, Expr::lit_u64(0, 1)),
            ],
            vec![
                Stmt::assign(c, Expr::lit_u64(0, 1)),
                Stmt::assign(d, Expr::lit_u64(1, 1)),
            ],
        )],
    )
    .unwrap();

    let mut kernel = SimKernel::new(&ctx, SimConfig::default());
    let cases = [
        ((0u64, 0u64), (0u64, 1u64)),
        ((0, 1), (1, 0)),
        ((1, 0), (1, 0)),
        ((1, 1), (0, 1)),
    ];
    for ((av, bv), (cv, dv)) in cases {
        kernel.drive(&ctx, a, LogicVec::from_u64(av, 1)).unwrap();
        kernel.drive(&ctx, b, LogicVec::from_u64(bv, 1)).unwrap();
        kernel.settle(&mut ctx).unwrap();
        assert_eq!(ctx.value_u64(c).unwrap(), cv, "c for a={av} b={bv}");
        assert_eq!(ctx.value_u64(d).unwrap(), dv, "d for a={av} b={bv}");
    }
}

/// Unique case over the {b,a} selector plus a casez wildcard arm.
#[test]
fn unique_case_and_casez_matching() {
    let mut ctx = DesignContext::new();
    let m = ctx.add_module("m").unwrap();
    let a = ctx.signal("a", 1);
    let b = ctx.signal("b", 1);
    let sel = ctx.swizzle(&[b, a]);
    let c = ctx.signal("c", 1);
    let d = ctx.signal("d", 1);
    let wild = ctx.signal("wild", 1);

    ctx.add_combinational(
        m,
        vec![
            Stmt::Case {
                selector: Expr::signal(sel),
                items: vec![
                    CaseItem {
                        pattern: LogicVec::from_binary_str("01").unwrap(),
                        body: vec![
                            Stmt::assign(c, Expr::lit_u64(1, 1)),
                            Stmt::assign(d, Expr::lit_u64(0, 1)),
                        ],
                    },
                    CaseItem {
                        pattern: LogicVec::from_binary_str("10").unwrap(),
                        body: vec![
                            Stmt::assign(c, Expr::lit_u64(1, 1)),
                            Stmt::assign(d, Expr::lit_u64(0, 1)),
                        ],
                    },
                ],
                default: vec![
                    Stmt::assign(c, Expr::lit_u64(0, 1)),
                    Stmt::assign(d, Expr::lit_u64(1, 1)),
                ],
                kind: CaseKind::Exact,
                cond_type: ConditionalType::Unique,
            },
            // casez: pattern z1 matches whenever a == 1, regardless of b.
            Stmt::Case {
                selector: Expr::signal(sel),
                items: vec![CaseItem {
                    pattern: LogicVec::from_binary_str("z1").unwrap(),
                    body: vec![Stmt::assign(wild, Expr::lit_u64(1, 1))],
                }],
                default: vec![Stmt::assign(wild, Expr::lit_u64(0, 1))],
                kind: CaseKind::Casez,
                cond_type: ConditionalType::None,
            },
        ],
    )
    .unwrap();

    let mut kernel = SimKernel::new(&ctx, SimConfig::default());
    let cases = [
        ((0u64, 0u64), (0u64, 1u64), 0u64),
        ((1, 0), (1, 0), 1), // {b,a} = 01
        ((0, 1), (1, 0), 0), // {b,a} = 10
        ((1, 1), (0, 1), 1), // {b,a} = 11 -> default; casez still matches a=1
    ];
    for ((av, bv), (cv, dv), wv) in cases {
        kernel.drive(&ctx, a, LogicVec::from_u64(av, 1)).unwrap();
        kernel.drive(&ctx, b, LogicVec::from_u64(bv, 1)).unwrap();
        kernel.settle(&mut ctx).unwrap();
        assert_eq!(ctx.value_u64(c).unwrap(), cv, "c for a={av} b={bv}");
        assert_eq!(ctx.value_u64(d).unwrap(), dv, "d for a={av} b={bv}");
        assert_eq!(ctx.value_u64(wild).unwrap(), wv, "wild for a={av} b={bv}");
    }
}

/// Sequential block with branch-exclusive assignment: non-blocking reads
/// sample pre-edge values, and only the taken branch's writes land.
#[test]
fn ff_branches_are_exclusive_and_sample_pre_edge() {
    let mut ctx = DesignContext::new();
    let m = ctx.add_module("m").unwrap();
    let a = ctx.signal("a", 1);
    let b = ctx.signal("b", 1);
    let d = ctx.signal("d", 1);
    let q = ctx.signal("q", 1);
    let x = ctx.signal("x", 1);
    let y = ctx.signal("y", 1);

    let mut boot = SimKernel::new(&ctx, SimConfig::default());
    let clock = boot.add_clock(&mut ctx, "clk", 5).unwrap();

    // if (a) { q <= d; x <= ~x } else { x <= a; if (b) { y <= 1 } }
    ctx.add_ff(
        m,
        clock.clk,
        vec![Stmt::if_else(
            Expr::signal(a),
            vec![
                Stmt::assign(q, Expr::signal(d)),
                Stmt::assign(x, Expr::signal(x).not()),
            ],
            vec![
                Stmt::assign(x, Expr::signal(a)),
                Stmt::if_then(Expr::signal(b), vec![Stmt::assign(y, Expr::lit_u64(1, 1))]),
            ],
        )],
    )
    .unwrap();

    let mut kernel = SimKernel::new(&ctx, SimConfig::default());
    kernel.restart_clock(&mut ctx, &clock).unwrap();
    ctx.put(x, LogicVec::from_bool(false)).unwrap();
    ctx.put(y, LogicVec::from_bool(false)).unwrap();

    // Cycle 1: a=1, d=1 -> q <- 1, x toggles 0 -> 1; y untouched.
    kernel.drive(&ctx, a, LogicVec::from_bool(true)).unwrap();
    kernel.drive(&ctx, b, LogicVec::from_bool(false)).unwrap();
    kernel.drive(&ctx, d, LogicVec::from_bool(true)).unwrap();
    kernel.run_until(&mut ctx, clock.period_fs()).unwrap();
    assert_eq!(ctx.value_u64(q).unwrap(), 1);
    assert_eq!(ctx.value_u64(x).unwrap(), 1);
    assert_eq!(ctx.value_u64(y).unwrap(), 0);

    // Cycle 2: same inputs -> x toggles again, pre-edge sample of x = 1.
    kernel.run_until(&mut ctx, 2 * clock.period_fs()).unwrap();
    assert_eq!(ctx.value_u64(x).unwrap(), 0);

    // Cycle 3: a=0, b=1 -> else branch: x <- a = 0, y <- 1; q holds.
    kernel.drive(&ctx, a, LogicVec::from_bool(false)).unwrap();
    kernel.drive(&ctx, b, LogicVec::from_bool(true)).unwrap();
    kernel.run_until(&mut ctx, 3 * clock.period_fs()).unwrap();
    assert_eq!(ctx.value_u64(x).unwrap(), 0);
    assert_eq!(ctx.value_u64(y).unwrap(), 1);
    assert_eq!(ctx.value_u64(q).unwrap(), 1);
}

/// Glitch delivery: a derived chain fires one glitch per actual change,
/// none for redundant re-drives.
#[test]
fn glitch_stream_fires_on_change_only() {
    let mut ctx = DesignContext::new();
    let a = ctx.signal("a", 2);
    let b = ctx.signal("b", 2);
    let sum = ctx.add(a, b).unwrap();

    let mut kernel = SimKernel::new(&ctx, SimConfig::default());
    kernel.drive(&ctx, a, LogicVec::from_u64(1, 2)).unwrap();
    kernel.drive(&ctx, b, LogicVec::from_u64(2, 2)).unwrap();
    kernel.settle(&mut ctx).unwrap();
    assert_eq!(ctx.value_u64(sum).unwrap(), 3);
    let glitches = kernel.take_glitches();
    assert_eq!(glitches.iter().filter(|g| g.signal == sum).count(), 1);

    // a changes but the sum stays 3: one glitch for a, none for sum.
    kernel.drive(&ctx, a, LogicVec::from_u64(1, 2)).unwrap();
    kernel.settle(&mut ctx).unwrap();
    assert!(kernel.take_glitches().is_empty());
}
