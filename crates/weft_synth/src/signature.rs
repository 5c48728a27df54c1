//! Module type signatures.
//!
//! Two module instances are the same *type* when their canonical
//! descriptions hash equal: same name, same port list, same internal
//! structure with signal references rewritten to scope-local indices.
//! The emitter collapses equal signatures into one definition.

use std::collections::HashMap;
use std::fmt::Write;

use weft_graph::{DesignContext, Driver, Expr, ModuleId, SignalId, Stmt};
use xxhash_rust::xxh3::xxh3_64;

/// The xxh3 hash of a module's canonical description.
pub fn type_signature(ctx: &DesignContext, module: ModuleId) -> u64 {
    xxh3_64(canonical_text(ctx, module).as_bytes())
}

/// Scope-local indices for every signal referenceable from a module:
/// its ports, its internals, and its sub-modules' ports, in declaration
/// order.
pub(crate) fn local_signal_indices(
    ctx: &DesignContext,
    module: ModuleId,
) -> HashMap<SignalId, u32> {
    let mut map = HashMap::new();
    let mut next = 0u32;
    let m = &ctx.modules[module];
    for &(_, sig) in m.inputs.iter().chain(m.outputs.iter()) {
        map.insert(sig, next);
        next += 1;
    }
    for &sig in &m.internals {
        map.insert(sig, next);
        next += 1;
    }
    for &sub in &m.submodules {
        let s = &ctx.modules[sub];
        for &(_, sig) in s.inputs.iter().chain(s.outputs.iter()) {
            map.insert(sig, next);
            next += 1;
        }
    }
    map
}

/// The canonical description hashed by [`type_signature`]. Public within
/// the crate for tests; the exact text is an implementation detail.
pub(crate) fn canonical_text(ctx: &DesignContext, module: ModuleId) -> String {
    let map = local_signal_indices(ctx, module);
    let m = &ctx.modules[module];
    let mut out = String::new();
    let _ = writeln!(out, "module {}", ctx.module_name(module));

    for &(name, sig) in &m.inputs {
        let _ = writeln!(
            out,
            "in {} {}",
            ctx.interner().resolve(name),
            ctx.signals[sig].width
        );
    }
    for &(name, sig) in &m.outputs {
        let _ = writeln!(
            out,
            "out {} {}",
            ctx.interner().resolve(name),
            ctx.signals[sig].width
        );
    }

    if let Some(custom) = &m.custom_sv {
        let _ = writeln!(out, "custom {custom}");
        return out;
    }

    for &sig in &m.internals {
        let s = &ctx.signals[sig];
        // Auto-generated (unpreferred) names carry no structure; hashing
        // them would keep identical instances from collapsing.
        let name = if s.unpreferred { "_" } else { ctx.signal_name(sig) };
        let _ = writeln!(out, "net {name} {} {}", s.width, u8::from(s.unpreferred));
    }

    // Drivers of everything in scope except input ports (those are wired
    // by the enclosing module and are not part of this type).
    let mut driven: Vec<SignalId> = m.outputs.iter().map(|&(_, s)| s).collect();
    driven.extend(m.internals.iter().copied());
    for &sub in &m.submodules {
        driven.extend(ctx.modules[sub].inputs.iter().map(|&(_, s)| s));
    }
    for sig in driven {
        let _ = write!(out, "drive {} = ", local(&map, sig));
        match &ctx.signals[sig].source {
            None => out.push_str("none"),
            Some(Driver::Wire(src)) => {
                let _ = write!(out, "wire {}", local(&map, *src));
            }
            Some(Driver::Expr(expr)) => {
                out.push_str("expr ");
                expr_canonical(ctx, expr, &map, &mut out);
            }
            Some(Driver::Process(pid)) => {
                let pos = m.processes.iter().position(|p| p == pid);
                let _ = write!(out, "proc {}", pos.map_or(-1i64, |p| p as i64));
            }
        }
        out.push('\n');
    }

    for &pid in &m.processes {
        let proc = &ctx.processes[pid];
        match proc.kind {
            weft_graph::ProcessKind::Combinational => out.push_str("comb\n"),
            weft_graph::ProcessKind::Ff { clock } => {
                let _ = writeln!(out, "ff {}", local(&map, clock));
            }
        }
        stmts_canonical(ctx, &proc.body, &map, &mut out);
    }

    for &sub in &m.submodules {
        let _ = writeln!(out, "sub {:016x}", type_signature(ctx, sub));
    }
    out
}

fn local(map: &HashMap<SignalId, u32>, sig: SignalId) -> String {
    match map.get(&sig) {
        Some(i) => format!("s{i}"),
        None => "ext".to_string(),
    }
}

fn expr_canonical(
    ctx: &DesignContext,
    expr: &Expr,
    map: &HashMap<SignalId, u32>,
    out: &mut String,
) {
    match expr {
        Expr::Signal(id) => out.push_str(&local(map, *id)),
        Expr::Literal(v) => {
            let _ = write!(out, "{v:?}");
        }
        Expr::Unary { op, operand } => {
            let _ = write!(out, "({op:?} ");
            expr_canonical(ctx, operand, map, out);
            out.push(')');
        }
        Expr::Binary { op, lhs, rhs } => {
            let _ = write!(out, "({op:?} ");
            expr_canonical(ctx, lhs, map, out);
            out.push(' ');
            expr_canonical(ctx, rhs, map, out);
            out.push(')');
        }
        Expr::Mux {
            cond,
            then_val,
            else_val,
        } => {
            out.push_str("(mux ");
            expr_canonical(ctx, cond, map, out);
            out.push(' ');
            expr_canonical(ctx, then_val, map, out);
            out.push(' ');
            expr_canonical(ctx, else_val, map, out);
            out.push(')');
        }
        Expr::Slice { operand, hi, lo } => {
            out.push_str("(slice ");
            expr_canonical(ctx, operand, map, out);
            let _ = write!(out, " {hi} {lo})");
        }
        Expr::Concat(parts) => {
            out.push_str("(concat");
            for p in parts {
                out.push(' ');
                expr_canonical(ctx, p, map, out);
            }
            out.push(')');
        }
        Expr::Repeat { operand, count } => {
            let _ = write!(out, "(repeat {count} ");
            expr_canonical(ctx, operand, map, out);
            out.push(')');
        }
    }
}

fn stmts_canonical(
    ctx: &DesignContext,
    stmts: &[Stmt],
    map: &HashMap<SignalId, u32>,
    out: &mut String,
) {
    for stmt in stmts {
        match stmt {
            Stmt::Assign { target, value } => {
                let _ = write!(out, "assign {} ", local(map, *target));
                expr_canonical(ctx, value, map, out);
                out.push('\n');
            }
            Stmt::If { arms, else_body } => {
                for arm in arms {
                    out.push_str("ifarm ");
                    expr_canonical(ctx, &arm.condition, map, out);
                    out.push('\n');
                    stmts_canonical(ctx, &arm.body, map, out);
                }
                out.push_str("else\n");
                stmts_canonical(ctx, else_body, map, out);
                out.push_str("endif\n");
            }
            Stmt::Case {
                selector,
                items,
                default,
                kind,
                cond_type,
            } => {
                let _ = write!(out, "case {kind:?} {cond_type:?} ");
                expr_canonical(ctx, selector, map, out);
                out.push('\n');
                for item in items {
                    let _ = writeln!(out, "item {:?}", item.pattern);
                    stmts_canonical(ctx, &item.body, map, out);
                }
                out.push_str("default\n");
                stmts_canonical(ctx, default, map, out);
                out.push_str("endcase\n");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a small passthrough module; called twice it must produce
    /// identical signatures even though the arena IDs differ.
    fn passthrough(ctx: &mut DesignContext, seed: SignalId) -> ModuleId {
        let m = ctx.add_module("pass").unwrap();
        let a = ctx.add_input(m, "a", seed, 1).unwrap();
        let y = ctx.add_output(m, "y", 1).unwrap();
        ctx.connect(y, a).unwrap();
        m
    }

    #[test]
    fn identical_structure_same_signature() {
        let mut ctx = DesignContext::new();
        let s1 = ctx.signal("s1", 1);
        let s2 = ctx.signal("s2", 1);
        let m1 = passthrough(&mut ctx, s1);
        let m2 = passthrough(&mut ctx, s2);
        assert_eq!(type_signature(&ctx, m1), type_signature(&ctx, m2));
    }

    #[test]
    fn different_width_different_signature() {
        let mut ctx = DesignContext::new();
        let s1 = ctx.signal("s1", 1);
        let m1 = passthrough(&mut ctx, s1);
        let m2 = ctx.add_module("pass").unwrap();
        let s2 = ctx.signal("s2", 2);
        let a = ctx.add_input(m2, "a", s2, 2).unwrap();
        let y = ctx.add_output(m2, "y", 2).unwrap();
        ctx.connect(y, a).unwrap();
        assert_ne!(type_signature(&ctx, m1), type_signature(&ctx, m2));
    }

    #[test]
    fn different_name_different_signature() {
        let mut ctx = DesignContext::new();
        let s1 = ctx.signal("s1", 1);
        let m1 = passthrough(&mut ctx, s1);

        let m2 = ctx.add_module("pass2").unwrap();
        let s2 = ctx.signal("s2", 1);
        let a = ctx.add_input(m2, "a", s2, 1).unwrap();
        let y = ctx.add_output(m2, "y", 1).unwrap();
        ctx.connect(y, a).unwrap();

        assert_ne!(type_signature(&ctx, m1), type_signature(&ctx, m2));
    }

    #[test]
    fn custom_body_feeds_signature() {
        let mut ctx = DesignContext::new();
        let m1 = ctx.add_module("gen").unwrap();
        ctx.add_output(m1, "clk", 1).unwrap();
        ctx.set_custom_sv(m1, "module gen(output logic clk);\nendmodule".into());

        let m2 = ctx.add_module("gen").unwrap();
        ctx.add_output(m2, "clk", 1).unwrap();
        ctx.set_custom_sv(m2, "module gen(output logic clk);\n// other\nendmodule".into());

        assert_ne!(type_signature(&ctx, m1), type_signature(&ctx, m2));
    }

    #[test]
    fn repeated_construction_is_deterministic() {
        let build = || {
            let mut ctx = DesignContext::new();
            let seed = ctx.signal("seed", 1);
            let m = passthrough(&mut ctx, seed);
            type_signature(&ctx, m)
        };
        assert_eq!(build(), build());
    }
}
