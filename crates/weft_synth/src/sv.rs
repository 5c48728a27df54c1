//! SystemVerilog emission.
//!
//! [`emit_design`] walks a built module tree and produces one definition
//! per unique module type signature, dependencies first, separated by a
//! fixed delimiter. Modules carrying a custom body emit their template
//! verbatim; everything else gets generated port declarations, net
//! declarations, instantiations, continuous assigns, and always blocks.

use std::collections::{HashMap, HashSet};
use std::fmt::Write;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use weft_common::LogicVec;
use weft_graph::{
    sanitize_identifier, CaseKind, ConditionalType, DesignContext, Driver, Expr, ModuleId,
    ProcessKind, SignalId, Stmt,
};

use crate::error::SynthError;
use crate::signature::type_signature;

/// Delimiter between module definitions in the output stream.
pub const MODULE_DELIMITER: &str =
    "//------------------------------------------------------------------------------";

/// Selector widths past this are exempt from priority-case coverage
/// enumeration.
const MAX_COVERAGE_WIDTH: u32 = 16;

/// Emits SystemVerilog for a built design rooted at `root`.
///
/// Structurally identical module instances collapse to one definition;
/// definitions are ordered so that every module appears before its first
/// use. Fails with [`NotBuilt`](weft_graph::GraphError::NotBuilt) when
/// `root` has not been built, and with the emission-time validation
/// errors of [`SynthError`] otherwise.
pub fn emit_design(ctx: &DesignContext, root: ModuleId) -> Result<String, SynthError> {
    if !ctx.modules[root].has_built {
        return Err(SynthError::Graph(weft_graph::GraphError::NotBuilt {
            module: ctx.module_name(root).to_string(),
        }));
    }

    let mut all = Vec::new();
    collect_modules(ctx, root, &mut all);

    // One definition per unique signature; the first instance found is
    // the representative. Distinct signatures sharing a type name get a
    // suffixed definition name.
    let mut def_names: HashMap<u64, String> = HashMap::new();
    let mut reps: Vec<(u64, ModuleId)> = Vec::new();
    let mut used_names: HashSet<String> = HashSet::new();
    for &m in &all {
        let sig = type_signature(ctx, m);
        if def_names.contains_key(&sig) {
            continue;
        }
        let base = sanitize_identifier(ctx.module_name(m));
        let name = if ctx.modules[m].custom_sv.is_some() {
            // Custom templates declare their own header; the name is not
            // ours to rewrite.
            used_names.insert(base.clone());
            base
        } else {
            let mut candidate = base.clone();
            let mut n = 0u32;
            while !used_names.insert(candidate.clone()) {
                n += 1;
                candidate = format!("{base}_{n}");
            }
            candidate
        };
        def_names.insert(sig, name);
        reps.push((sig, m));
    }

    for &(_, rep) in &reps {
        validate_module(ctx, rep)?;
    }

    // Definition order: dependencies first.
    let mut dep_graph: DiGraphMap<u64, ()> = DiGraphMap::new();
    for &(sig, rep) in &reps {
        dep_graph.add_node(sig);
        for &sub in &ctx.modules[rep].submodules {
            dep_graph.add_edge(sig, type_signature(ctx, sub), ());
        }
    }
    let order: Vec<u64> = match toposort(&dep_graph, None) {
        Ok(sorted) => sorted.into_iter().rev().collect(),
        // The containment tree cannot cycle; fall back to leaf-last
        // discovery order if it somehow does.
        Err(_) => reps.iter().rev().map(|&(sig, _)| sig).collect(),
    };
    let rep_of: HashMap<u64, ModuleId> = reps.iter().copied().collect();

    let mut out = String::new();
    let _ = writeln!(out, "{MODULE_DELIMITER}");
    let _ = writeln!(out, "// SystemVerilog generated by weft");
    let _ = writeln!(out, "// Design: {}", ctx.module_name(root));
    let _ = writeln!(out, "{MODULE_DELIMITER}");
    for sig in order {
        let Some(&rep) = rep_of.get(&sig) else { continue };
        out.push('\n');
        out.push_str(&emit_module(ctx, rep, &def_names));
        let _ = writeln!(out, "\n{MODULE_DELIMITER}");
    }
    Ok(out)
}

fn collect_modules(ctx: &DesignContext, module: ModuleId, out: &mut Vec<ModuleId>) {
    out.push(module);
    for &sub in &ctx.modules[module].submodules {
        collect_modules(ctx, sub, out);
    }
}

/// Per-module emission state: how sub-module output ports map to nets in
/// this scope, which internals stay declared, and which exist purely as
/// instance connections.
struct EmitState {
    /// Sub-module output port -> net text in this scope.
    conn: HashMap<SignalId, String>,
    /// Nets synthesized for sub outputs read only through expressions.
    extra_nets: Vec<(String, u32)>,
    /// Scope signals kept as the canonical sink of a sub output; the
    /// instance drives them, so they get no assign and no elision.
    conn_sinks: HashSet<SignalId>,
    /// Secondary sinks of a sub output: `assign sink = chosen;`.
    aliases: Vec<(SignalId, String)>,
}

fn emit_module(ctx: &DesignContext, module: ModuleId, def_names: &HashMap<u64, String>) -> String {
    let m = &ctx.modules[module];
    if let Some(custom) = &m.custom_sv {
        return custom.clone();
    }

    let state = connection_state(ctx, module);
    let def_name = def_names
        .get(&type_signature(ctx, module))
        .cloned()
        .unwrap_or_else(|| sanitize_identifier(ctx.module_name(module)));

    let mut out = String::new();

    // Header and ports.
    if m.inputs.is_empty() && m.outputs.is_empty() {
        let _ = writeln!(out, "module {def_name};");
    } else {
        let _ = writeln!(out, "module {def_name} (");
        let mut decls = Vec::new();
        for &(name, sig) in &m.inputs {
            decls.push(format!(
                "  input logic {}{}",
                width_spec(ctx.signals[sig].width),
                ctx.interner().resolve(name)
            ));
        }
        for &(name, sig) in &m.outputs {
            decls.push(format!(
                "  output logic {}{}",
                width_spec(ctx.signals[sig].width),
                ctx.interner().resolve(name)
            ));
        }
        out.push_str(&decls.join(",\n"));
        out.push_str("\n);\n");
    }

    // Net declarations.
    let declared: Vec<SignalId> = m
        .internals
        .iter()
        .copied()
        .filter(|&s| !is_elided(ctx, &state, s))
        .collect();
    for &sig in &declared {
        let _ = writeln!(
            out,
            "  logic {}{};",
            width_spec(ctx.signals[sig].width),
            sanitize_identifier(ctx.signal_name(sig))
        );
    }
    for (name, width) in &state.extra_nets {
        let _ = writeln!(out, "  logic {}{};", width_spec(*width), name);
    }

    // Sub-module instantiations.
    for &sub in &m.submodules {
        let sub_def = def_names
            .get(&type_signature(ctx, sub))
            .cloned()
            .unwrap_or_else(|| sanitize_identifier(ctx.module_name(sub)));
        let inst = ctx
            .modules[sub]
            .instance_name
            .map(|i| ctx.interner().resolve(i).to_string())
            .unwrap_or_else(|| sub_def.clone());
        let mut conns = Vec::new();
        for &(pname, psig) in &ctx.modules[sub].inputs {
            let text = match &ctx.signals[psig].source {
                Some(Driver::Wire(src)) => render_signal(ctx, module, *src, &state),
                _ => String::new(),
            };
            conns.push(format!("    .{}({text})", ctx.interner().resolve(pname)));
        }
        for &(pname, psig) in &ctx.modules[sub].outputs {
            let text = state.conn.get(&psig).cloned().unwrap_or_default();
            conns.push(format!("    .{}({text})", ctx.interner().resolve(pname)));
        }
        let _ = writeln!(out, "  {sub_def} {inst} (\n{}\n  );", conns.join(",\n"));
    }

    // Continuous assigns: secondary sinks of sub outputs, then the
    // drivers of declared nets and output ports.
    for (sink, chosen) in &state.aliases {
        let _ = writeln!(out, "  assign {} = {chosen};", scope_name(ctx, *sink));
    }
    let assigned: Vec<SignalId> = m
        .outputs
        .iter()
        .map(|&(_, s)| s)
        .chain(declared.iter().copied())
        .collect();
    for sig in assigned {
        if state.conn_sinks.contains(&sig) {
            continue;
        }
        match &ctx.signals[sig].source {
            Some(Driver::Wire(src)) => {
                let _ = writeln!(
                    out,
                    "  assign {} = {};",
                    scope_name(ctx, sig),
                    render_signal(ctx, module, *src, &state)
                );
            }
            Some(Driver::Expr(expr)) => {
                let _ = writeln!(
                    out,
                    "  assign {} = {};",
                    scope_name(ctx, sig),
                    expr_text(ctx, module, expr, &state)
                );
            }
            Some(Driver::Process(_)) | None => {}
        }
    }

    // Always blocks.
    for &pid in &m.processes {
        let proc = &ctx.processes[pid];
        out.push('\n');
        match proc.kind {
            ProcessKind::Combinational => {
                out.push_str("  always_comb begin\n");
                for stmt in &proc.body {
                    stmt_lines(ctx, module, stmt, &state, "    ", false, &mut out);
                }
                out.push_str("  end\n");
            }
            ProcessKind::Ff { clock } => {
                let clk = render_signal(ctx, module, clock, &state);
                let _ = writeln!(out, "  always_ff @(posedge {clk}) begin");
                for stmt in &proc.body {
                    stmt_lines(ctx, module, stmt, &state, "    ", true, &mut out);
                }
                out.push_str("  end\n");
            }
        }
    }

    out.push_str("endmodule");
    out
}

/// Chooses, for every sub-module output port, the net that stands for it
/// in this scope. A wire-connected sink with a preferred name wins; ties
/// break toward the first (driver-closest) sink; a port read only through
/// expressions gets a synthesized `inst_port` net.
fn connection_state(ctx: &DesignContext, module: ModuleId) -> EmitState {
    let m = &ctx.modules[module];
    let mut state = EmitState {
        conn: HashMap::new(),
        extra_nets: Vec::new(),
        conn_sinks: HashSet::new(),
        aliases: Vec::new(),
    };
    let scope: Vec<SignalId> = m
        .outputs
        .iter()
        .map(|&(_, s)| s)
        .chain(m.internals.iter().copied())
        .collect();

    for &sub in &m.submodules {
        let inst = ctx.modules[sub]
            .instance_name
            .map(|i| ctx.interner().resolve(i).to_string())
            .unwrap_or_else(|| sanitize_identifier(ctx.module_name(sub)));
        for &(pname, psig) in &ctx.modules[sub].outputs {
            let sinks: Vec<SignalId> = scope
                .iter()
                .copied()
                .filter(|&s| ctx.signals[s].source == Some(Driver::Wire(psig)))
                .collect();
            let chosen = sinks
                .iter()
                .copied()
                .find(|&s| !ctx.signals[s].unpreferred)
                .or_else(|| sinks.first().copied());
            if let Some(chosen) = chosen {
                let chosen_name = scope_name(ctx, chosen);
                state.conn_sinks.insert(chosen);
                for &other in sinks.iter().filter(|&&s| s != chosen) {
                    state.conn_sinks.insert(other);
                    state.aliases.push((other, chosen_name.clone()));
                }
                state.conn.insert(psig, chosen_name);
            } else if !ctx.signals[psig].destinations.is_empty() {
                let net = format!("{inst}_{}", ctx.interner().resolve(pname));
                state
                    .extra_nets
                    .push((net.clone(), ctx.signals[psig].width));
                state.conn.insert(psig, net);
            } else {
                state.conn.insert(psig, String::new());
            }
        }
    }
    state
}

/// `true` when an unpreferred net disappears from the output: a direct
/// alias of its driver, or a single-reader expression inlined at its use
/// site. Nets standing in for instance connections are never elided.
fn is_elided(ctx: &DesignContext, state: &EmitState, sig: SignalId) -> bool {
    let s = &ctx.signals[sig];
    if !s.unpreferred || s.is_port() || state.conn_sinks.contains(&sig) {
        return false;
    }
    match &s.source {
        Some(Driver::Wire(_)) => true,
        Some(Driver::Expr(_)) => s.destinations.len() == 1,
        _ => false,
    }
}

fn scope_name(ctx: &DesignContext, sig: SignalId) -> String {
    sanitize_identifier(ctx.signal_name(sig))
}

fn render_signal(ctx: &DesignContext, module: ModuleId, sig: SignalId, state: &EmitState) -> String {
    let mut visiting = HashSet::new();
    render_signal_inner(ctx, module, sig, state, &mut visiting)
}

fn render_signal_inner(
    ctx: &DesignContext,
    module: ModuleId,
    sig: SignalId,
    state: &EmitState,
    visiting: &mut HashSet<SignalId>,
) -> String {
    let s = &ctx.signals[sig];
    if s.parent == Some(module) && s.is_port() {
        return ctx.signal_name(sig).to_string();
    }
    if s.parent.is_some() && s.parent != Some(module) {
        // A sub-module port seen from this scope.
        if s.is_output {
            if let Some(net) = state.conn.get(&sig) {
                return net.clone();
            }
        }
        if s.is_input {
            if let Some(Driver::Wire(src)) = &s.source {
                return render_signal_inner(ctx, module, *src, state, visiting);
            }
        }
        return scope_name(ctx, sig);
    }
    if is_elided(ctx, state, sig) && visiting.insert(sig) {
        // Inlined text is already atomic or parenthesized by the
        // expression renderer.
        let text = match &s.source {
            Some(Driver::Wire(src)) => render_signal_inner(ctx, module, *src, state, visiting),
            Some(Driver::Expr(expr)) => expr_text_inner(ctx, module, expr, state, visiting),
            _ => scope_name(ctx, sig),
        };
        visiting.remove(&sig);
        return text;
    }
    scope_name(ctx, sig)
}

fn expr_text(ctx: &DesignContext, module: ModuleId, expr: &Expr, state: &EmitState) -> String {
    let mut visiting = HashSet::new();
    expr_text_inner(ctx, module, expr, state, &mut visiting)
}

fn expr_text_inner(
    ctx: &DesignContext,
    module: ModuleId,
    expr: &Expr,
    state: &EmitState,
    visiting: &mut HashSet<SignalId>,
) -> String {
    use weft_graph::BinaryOp::*;
    match expr {
        Expr::Signal(id) => render_signal_inner(ctx, module, *id, state, visiting),
        Expr::Literal(v) => sv_literal(v),
        Expr::Unary { operand, .. } => {
            format!("(~{})", expr_text_inner(ctx, module, operand, state, visiting))
        }
        Expr::Binary { op, lhs, rhs } => {
            let token = match op {
                And => "&",
                Or => "|",
                Xor => "^",
                Add => "+",
                Sub => "-",
                Mul => "*",
                Shl => "<<",
                Shr => ">>",
                Eq => "==",
                Ne => "!=",
                Lt => "<",
                Gt => ">",
            };
            format!(
                "({} {token} {})",
                expr_text_inner(ctx, module, lhs, state, visiting),
                expr_text_inner(ctx, module, rhs, state, visiting)
            )
        }
        Expr::Mux {
            cond,
            then_val,
            else_val,
        } => format!(
            "({} ? {} : {})",
            expr_text_inner(ctx, module, cond, state, visiting),
            expr_text_inner(ctx, module, then_val, state, visiting),
            expr_text_inner(ctx, module, else_val, state, visiting)
        ),
        Expr::Slice { operand, hi, lo } => format!(
            "{}[{hi}:{lo}]",
            expr_text_inner(ctx, module, operand, state, visiting)
        ),
        Expr::Concat(parts) => {
            let inner: Vec<String> = parts
                .iter()
                .map(|p| expr_text_inner(ctx, module, p, state, visiting))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
        Expr::Repeat { operand, count } => format!(
            "{{{count}{{{}}}}}",
            expr_text_inner(ctx, module, operand, state, visiting)
        ),
    }
}

fn sv_literal(value: &LogicVec) -> String {
    format!("{}'b{value}", value.width())
}

fn width_spec(width: u32) -> String {
    if width > 1 {
        format!("[{}:0] ", width - 1)
    } else {
        String::new()
    }
}

fn stmt_lines(
    ctx: &DesignContext,
    module: ModuleId,
    stmt: &Stmt,
    state: &EmitState,
    indent: &str,
    nonblocking: bool,
    out: &mut String,
) {
    let op = if nonblocking { "<=" } else { "=" };
    match stmt {
        Stmt::Assign { target, value } => {
            let _ = writeln!(
                out,
                "{indent}{} {op} {};",
                render_signal(ctx, module, *target, state),
                expr_text(ctx, module, value, state)
            );
        }
        Stmt::If { arms, else_body } => {
            for (i, arm) in arms.iter().enumerate() {
                let keyword = if i == 0 { "if" } else { "end else if" };
                let _ = writeln!(
                    out,
                    "{indent}{keyword} ({}) begin",
                    expr_text(ctx, module, &arm.condition, state)
                );
                for s in &arm.body {
                    stmt_lines(ctx, module, s, state, &format!("{indent}  "), nonblocking, out);
                }
            }
            if !else_body.is_empty() {
                let _ = writeln!(out, "{indent}end else begin");
                for s in else_body {
                    stmt_lines(ctx, module, s, state, &format!("{indent}  "), nonblocking, out);
                }
            }
            let _ = writeln!(out, "{indent}end");
        }
        Stmt::Case {
            selector,
            items,
            default,
            kind,
            cond_type,
        } => {
            let qualifier = match cond_type {
                ConditionalType::None => "",
                ConditionalType::Unique => "unique ",
                ConditionalType::Priority => "priority ",
            };
            let keyword = match kind {
                CaseKind::Exact => "case",
                CaseKind::Casez => "casez",
            };
            let _ = writeln!(
                out,
                "{indent}{qualifier}{keyword} ({})",
                expr_text(ctx, module, selector, state)
            );
            for item in items {
                let _ = writeln!(out, "{indent}  {}: begin", sv_literal(&item.pattern));
                for s in &item.body {
                    stmt_lines(ctx, module, s, state, &format!("{indent}    "), nonblocking, out);
                }
                let _ = writeln!(out, "{indent}  end");
            }
            if !default.is_empty() {
                let _ = writeln!(out, "{indent}  default: begin");
                for s in default {
                    stmt_lines(ctx, module, s, state, &format!("{indent}    "), nonblocking, out);
                }
                let _ = writeln!(out, "{indent}  end");
            }
            let _ = writeln!(out, "{indent}endcase");
        }
    }
}

// --- emission-time validation ------------------------------------------

fn validate_module(ctx: &DesignContext, module: ModuleId) -> Result<(), SynthError> {
    let path = hierarchical_path(ctx, module)?;
    let m = &ctx.modules[module];

    // A signal may be the target of at most one sequential block.
    let mut ff_seen: HashSet<SignalId> = HashSet::new();
    for &pid in &m.processes {
        let proc = &ctx.processes[pid];
        if matches!(proc.kind, ProcessKind::Ff { .. }) {
            for &t in &proc.targets {
                if !ff_seen.insert(t) {
                    return Err(SynthError::MultipleDrivers {
                        path,
                        signal: ctx.signal_name(t).to_string(),
                    });
                }
            }
        }
    }

    for &pid in &m.processes {
        check_stmts(ctx, &ctx.processes[pid].body, &path)?;
    }
    Ok(())
}

fn check_stmts(ctx: &DesignContext, stmts: &[Stmt], path: &str) -> Result<(), SynthError> {
    for stmt in stmts {
        match stmt {
            Stmt::Assign { .. } => {}
            Stmt::If { arms, else_body } => {
                for arm in arms {
                    check_stmts(ctx, &arm.body, path)?;
                }
                check_stmts(ctx, else_body, path)?;
            }
            Stmt::Case {
                selector,
                items,
                default,
                kind,
                cond_type,
            } => {
                match cond_type {
                    ConditionalType::Unique => {
                        for (i, a) in items.iter().enumerate() {
                            for b in items.iter().skip(i + 1) {
                                if patterns_overlap(*kind, &a.pattern, &b.pattern) {
                                    return Err(SynthError::CaseOverlap {
                                        path: path.to_string(),
                                    });
                                }
                            }
                        }
                    }
                    ConditionalType::Priority => {
                        if default.is_empty() && !covers_all(ctx, selector, items, *kind)? {
                            return Err(SynthError::CaseNotExhaustive {
                                path: path.to_string(),
                            });
                        }
                    }
                    ConditionalType::None => {}
                }
                for item in items {
                    check_stmts(ctx, &item.body, path)?;
                }
                check_stmts(ctx, default, path)?;
            }
        }
    }
    Ok(())
}

fn patterns_overlap(kind: CaseKind, a: &LogicVec, b: &LogicVec) -> bool {
    match kind {
        CaseKind::Exact => a == b,
        CaseKind::Casez => (0..a.width()).all(|i| {
            let (pa, pb) = (a.get(i), b.get(i));
            pa == weft_common::Logic::Z || pb == weft_common::Logic::Z || pa == pb
        }),
    }
}

/// Conservatively decides whether the constant patterns cover every
/// selector value; wide selectors are exempt.
fn covers_all(
    ctx: &DesignContext,
    selector: &Expr,
    items: &[weft_graph::CaseItem],
    kind: CaseKind,
) -> Result<bool, SynthError> {
    let width = ctx.expr_width(selector).map_err(SynthError::Graph)?;
    if width > MAX_COVERAGE_WIDTH {
        return Ok(true);
    }
    let mut covered: HashSet<u64> = HashSet::new();
    for item in items {
        expand_pattern(&item.pattern, kind, &mut covered);
    }
    Ok(covered.len() as u64 >= 1u64 << width)
}

fn expand_pattern(pattern: &LogicVec, kind: CaseKind, covered: &mut HashSet<u64>) {
    use weft_common::Logic;
    let mut wildcards = Vec::new();
    let mut base = 0u64;
    for i in 0..pattern.width() {
        match pattern.get(i) {
            Logic::One => base |= 1 << i,
            Logic::Zero => {}
            Logic::Z if kind == CaseKind::Casez => wildcards.push(i),
            // An unknown bit in an exact pattern never matches a known
            // selector value.
            _ => return,
        }
    }
    if wildcards.len() > 20 {
        return;
    }
    for combo in 0u64..(1u64 << wildcards.len()) {
        let mut value = base;
        for (j, &bit) in wildcards.iter().enumerate() {
            if (combo >> j) & 1 != 0 {
                value |= 1 << bit;
            }
        }
        covered.insert(value);
    }
}

fn hierarchical_path(ctx: &DesignContext, module: ModuleId) -> Result<String, SynthError> {
    let mut parts = Vec::new();
    let mut cursor = Some(module);
    while let Some(m) = cursor {
        parts.push(ctx.instance_name(m)?.to_string());
        cursor = ctx.modules[m].parent;
    }
    parts.reverse();
    Ok(parts.join("."))
}
