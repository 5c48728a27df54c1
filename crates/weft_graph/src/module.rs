//! Modules, port registration, and hierarchy discovery.
//!
//! A module is never told about its sub-modules. After user code finishes
//! wiring, [`DesignContext::build`] traces the signal graph from the root
//! module's ports: any port of another module encountered during the walk
//! adopts that module as a sub-module, and every unowned signal reachable
//! without crossing a module boundary is claimed as internal. The result
//! is a strict containment tree derived purely from connectivity.

use crate::context::DesignContext;
use crate::error::GraphError;
use crate::ids::{ModuleId, ProcessId, SignalId};
use crate::signal::Signal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use weft_common::Ident;

/// A named scope owning ports, internal signals, processes, and
/// sub-modules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    /// The module's type name.
    pub name: Ident,
    /// The unique instance name within the parent; assigned by `build`.
    pub instance_name: Option<Ident>,
    /// Input ports in declaration order.
    pub inputs: Vec<(Ident, SignalId)>,
    /// Output ports in declaration order.
    pub outputs: Vec<(Ident, SignalId)>,
    /// Non-port signals claimed by the build trace.
    pub internals: Vec<SignalId>,
    /// Sub-modules discovered by the build trace, in adoption order.
    pub submodules: Vec<ModuleId>,
    /// The parent module; assigned exactly once, during an ancestor's
    /// `build`.
    pub parent: Option<ModuleId>,
    /// Always blocks registered on this module, in registration order.
    pub processes: Vec<ProcessId>,
    /// Custom SystemVerilog emitted in place of a generated body. Modules
    /// carrying this are treated as black boxes by the trace (their
    /// outputs need no graph driver).
    pub custom_sv: Option<String>,
    /// Set once `build` has completed on this module.
    pub has_built: bool,
}

/// `true` if `name` matches `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Rewrites `name` into a legal HDL identifier, replacing every illegal
/// character with `_` and prefixing `_` when the result would start with
/// a digit or be empty.
pub fn sanitize_identifier(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() || out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

impl DesignContext {
    /// Creates an empty module.
    pub fn add_module(&mut self, name: &str) -> Result<ModuleId, GraphError> {
        if !is_valid_identifier(name) {
            return Err(GraphError::InvalidIdentifier {
                name: name.to_string(),
            });
        }
        let ident = self.interner.intern(name);
        Ok(self.modules.alloc(Module {
            name: ident,
            instance_name: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            internals: Vec::new(),
            submodules: Vec::new(),
            parent: None,
            processes: Vec::new(),
            custom_sv: None,
            has_built: false,
        }))
    }

    /// Installs a custom SystemVerilog body on `module`; the synthesizer
    /// emits this text instead of a generated definition.
    pub fn set_custom_sv(&mut self, module: ModuleId, template: String) {
        self.modules[module].custom_sv = Some(template);
    }

    /// Registers an input port on `module`, wired from `external`.
    ///
    /// Creates the port signal owned by the module; its destinations are
    /// consumed inside the module.
    pub fn add_input(
        &mut self,
        module: ModuleId,
        name: &str,
        external: SignalId,
        width: u32,
    ) -> Result<SignalId, GraphError> {
        self.check_port_name(module, name)?;
        let found = self.signals[external].width;
        if found != width {
            return Err(GraphError::WidthMismatch {
                name: name.to_string(),
                expected: width,
                found,
            });
        }
        let ident = self.interner.intern(name);
        let mut sig = Signal::new(ident, width);
        sig.parent = Some(module);
        sig.is_input = true;
        let port = self.signals.alloc(sig);
        self.connect(port, external)?;
        self.modules[module].inputs.push((ident, port));
        Ok(port)
    }

    /// Registers an output port on `module`.
    ///
    /// The port signal is created undriven; the module body must drive it
    /// before `build`.
    pub fn add_output(
        &mut self,
        module: ModuleId,
        name: &str,
        width: u32,
    ) -> Result<SignalId, GraphError> {
        self.check_port_name(module, name)?;
        let ident = self.interner.intern(name);
        let mut sig = Signal::new(ident, width);
        sig.parent = Some(module);
        sig.is_output = true;
        let port = self.signals.alloc(sig);
        self.modules[module].outputs.push((ident, port));
        Ok(port)
    }

    fn check_port_name(&self, module: ModuleId, name: &str) -> Result<(), GraphError> {
        if !is_valid_identifier(name) {
            return Err(GraphError::InvalidIdentifier {
                name: name.to_string(),
            });
        }
        let m = &self.modules[module];
        let clash = m
            .inputs
            .iter()
            .chain(m.outputs.iter())
            .any(|&(id, _)| self.interner.resolve(id) == name);
        if clash {
            return Err(GraphError::DuplicatePort {
                scope: self.module_name(module).to_string(),
                port: name.to_string(),
            });
        }
        Ok(())
    }

    /// Looks up an input port signal by name.
    pub fn input_port(&self, module: ModuleId, name: &str) -> Option<SignalId> {
        self.modules[module]
            .inputs
            .iter()
            .find(|&&(id, _)| self.interner.resolve(id) == name)
            .map(|&(_, sig)| sig)
    }

    /// Looks up an output port signal by name.
    pub fn output_port(&self, module: ModuleId, name: &str) -> Option<SignalId> {
        self.modules[module]
            .outputs
            .iter()
            .find(|&&(id, _)| self.interner.resolve(id) == name)
            .map(|&(_, sig)| sig)
    }

    /// Traces the signal graph from `root`'s ports, discovering
    /// sub-modules, claiming internal signals, recursively building the
    /// discovered sub-modules, and assigning unique instance names.
    ///
    /// `build` may run once per module; a second call fails with
    /// [`AlreadyBuilt`](GraphError::AlreadyBuilt).
    pub fn build(&mut self, root: ModuleId) -> Result<(), GraphError> {
        if self.modules[root].has_built {
            return Err(GraphError::AlreadyBuilt {
                module: self.module_name(root).to_string(),
            });
        }
        self.trace_module(root)?;
        let subs = self.modules[root].submodules.clone();
        for sub in subs {
            self.build(sub)?;
        }
        self.assign_instance_names(root);
        if self.modules[root].instance_name.is_none() {
            let base = sanitize_identifier(self.module_name(root));
            let ident = self.interner.intern(&base);
            self.modules[root].instance_name = Some(ident);
        }
        self.modules[root].has_built = true;
        Ok(())
    }

    /// The bidirectional flood-fill at the heart of `build`.
    ///
    /// Walks upstream from output ports and downstream from input ports;
    /// claimed internal signals are explored in both directions. The walk
    /// never enters an adopted sub-module: it hops around it through the
    /// sub-module's opposite-side ports, leaving the interior for the
    /// sub-module's own build. Termination: each signal enters the
    /// visited set once, and parent-module fields are set at most once.
    fn trace_module(&mut self, this: ModuleId) -> Result<(), GraphError> {
        let mut visited: HashSet<SignalId> = HashSet::new();
        let mut work: Vec<SignalId> = Vec::new();
        for &(_, p) in &self.modules[this].outputs {
            work.push(p);
        }
        for &(_, p) in &self.modules[this].inputs {
            work.push(p);
        }

        while let Some(sig) = work.pop() {
            if !visited.insert(sig) {
                continue;
            }
            match self.signals[sig].parent {
                Some(m) if m == this => {
                    let (is_in, is_out) = {
                        let s = &self.signals[sig];
                        (s.is_input, s.is_output)
                    };
                    if is_in {
                        // Boundary: the source lies outside; only the
                        // consumers are ours.
                        work.extend(self.signals[sig].destinations.iter().copied());
                    } else if is_out {
                        // Boundary: the destinations lie outside; only the
                        // driver chain is ours.
                        if self.signals[sig].source.is_none()
                            && self.modules[this].custom_sv.is_none()
                        {
                            return Err(GraphError::PortViolation {
                                module: self.module_name(this).to_string(),
                                reason: format!(
                                    "output port `{}` has no driver",
                                    self.signal_name(sig)
                                ),
                            });
                        }
                        work.extend(self.upstream_neighbors(sig));
                    } else {
                        work.extend(self.upstream_neighbors(sig));
                        work.extend(self.signals[sig].destinations.iter().copied());
                    }
                }
                Some(other) => {
                    if !self.signals[sig].is_port() {
                        return Err(GraphError::PortViolation {
                            module: self.module_name(this).to_string(),
                            reason: format!(
                                "reached signal `{}`, which is interior to module `{}`",
                                self.signal_name(sig),
                                self.module_name(other)
                            ),
                        });
                    }
                    match self.modules[other].parent {
                        Some(p) if p == this => {
                            // Already adopted; the hop was queued then.
                        }
                        None => {
                            self.modules[other].parent = Some(this);
                            self.modules[this].submodules.push(other);
                            let in_ports: Vec<SignalId> =
                                self.modules[other].inputs.iter().map(|&(_, p)| p).collect();
                            let out_ports: Vec<SignalId> =
                                self.modules[other].outputs.iter().map(|&(_, p)| p).collect();
                            for p in in_ports {
                                work.extend(self.upstream_neighbors(p));
                            }
                            for p in out_ports {
                                work.extend(self.signals[p].destinations.iter().copied());
                            }
                        }
                        Some(_) => {
                            return Err(GraphError::PortViolation {
                                module: self.module_name(this).to_string(),
                                reason: format!(
                                    "port `{}` belongs to module `{}`, which is owned elsewhere",
                                    self.signal_name(sig),
                                    self.module_name(other)
                                ),
                            });
                        }
                    }
                }
                None => {
                    self.signals[sig].parent = Some(this);
                    self.modules[this].internals.push(sig);
                    work.extend(self.upstream_neighbors(sig));
                    work.extend(self.signals[sig].destinations.iter().copied());
                }
            }
        }
        Ok(())
    }

    /// Derives HDL-legal instance names for `parent`'s children,
    /// disambiguating collisions with a monotonic suffix counter.
    fn assign_instance_names(&mut self, parent: ModuleId) {
        let mut used: HashSet<String> = HashSet::new();
        let subs = self.modules[parent].submodules.clone();
        for sub in subs {
            let base = sanitize_identifier(self.module_name(sub));
            let mut candidate = base.clone();
            let mut n = 0u32;
            while !used.insert(candidate.clone()) {
                n += 1;
                candidate = format!("{base}_{n}");
            }
            let ident = self.interner.intern(&candidate);
            self.modules[sub].instance_name = Some(ident);
        }
    }

    /// The unique instance name of `module`; valid only after the
    /// enclosing `build`.
    pub fn instance_name(&self, module: ModuleId) -> Result<&str, GraphError> {
        match self.modules[module].instance_name {
            Some(id) => Ok(self.interner.resolve(id)),
            None => Err(GraphError::NotBuilt {
                module: self.module_name(module).to_string(),
            }),
        }
    }

    /// Renders the post-build containment tree as indented text.
    pub fn hierarchy(&self, root: ModuleId) -> Result<String, GraphError> {
        if !self.modules[root].has_built {
            return Err(GraphError::NotBuilt {
                module: self.module_name(root).to_string(),
            });
        }
        let mut out = String::new();
        self.render_tree(root, 0, &mut out)?;
        Ok(out)
    }

    fn render_tree(
        &self,
        module: ModuleId,
        depth: usize,
        out: &mut String,
    ) -> Result<(), GraphError> {
        out.push_str(&"  ".repeat(depth));
        out.push_str(self.instance_name(module)?);
        out.push_str(" : ");
        out.push_str(self.module_name(module));
        out.push('\n');
        for &sub in &self.modules[module].submodules {
            self.render_tree(sub, depth + 1, out)?;
        }
        Ok(())
    }
}
