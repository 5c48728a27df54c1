//! Reusable port bundles with per-port direction tags.
//!
//! An [`Interface`] describes a set of named ports once and wires them
//! many times. Each port carries a set of direction tags drawn from a
//! user-defined enumeration; [`Interface::connect_io`] interprets those
//! tags from one module's perspective to create the module's ports and
//! rebind the interface view to them.

use crate::context::DesignContext;
use crate::error::GraphError;
use crate::ids::{ModuleId, SignalId};
use crate::module::is_valid_identifier;
use std::fmt;

/// Marker bound for direction-tag enumerations.
///
/// Implemented automatically for any `Copy + PartialEq + Debug` type; a
/// small `enum` per interface is the expected shape.
pub trait DirectionTag: Copy + PartialEq + fmt::Debug {}

impl<T: Copy + PartialEq + fmt::Debug> DirectionTag for T {}

/// One port definition inside an interface.
#[derive(Debug, Clone)]
pub struct InterfacePort<T: DirectionTag> {
    /// The port name.
    pub name: String,
    /// The port width in bits.
    pub width: u32,
    /// The direction tags attached to this port.
    pub tags: Vec<T>,
}

/// A named bundle of port definitions plus a *view*: the concrete signal
/// currently standing for each port.
///
/// A freshly created interface views free-standing signals; after
/// `connect_io`, the view is rebound to the connected module's new ports
/// so module-internal code reads and writes through `interface.port(..)`.
#[derive(Debug, Clone)]
pub struct Interface<T: DirectionTag> {
    name: String,
    ports: Vec<InterfacePort<T>>,
    view: Vec<SignalId>,
}

impl<T: DirectionTag> Interface<T> {
    /// Creates an empty interface.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ports: Vec::new(),
            view: Vec::new(),
        }
    }

    /// The interface's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a port definition, backed by a fresh free signal.
    pub fn add_port(
        &mut self,
        ctx: &mut DesignContext,
        name: &str,
        width: u32,
        tags: &[T],
    ) -> Result<SignalId, GraphError> {
        if !is_valid_identifier(name) {
            return Err(GraphError::InvalidIdentifier {
                name: name.to_string(),
            });
        }
        if self.ports.iter().any(|p| p.name == name) {
            return Err(GraphError::DuplicatePort {
                scope: self.name.clone(),
                port: name.to_string(),
            });
        }
        let sig = ctx.signal(name, width);
        self.ports.push(InterfacePort {
            name: name.to_string(),
            width,
            tags: tags.to_vec(),
        });
        self.view.push(sig);
        Ok(sig)
    }

    /// The signal currently standing for `name` in this interface's view.
    pub fn port(&self, name: &str) -> Option<SignalId> {
        self.ports
            .iter()
            .position(|p| p.name == name)
            .map(|i| self.view[i])
    }

    /// The port definitions in declaration order.
    pub fn ports(&self) -> &[InterfacePort<T>] {
        &self.ports
    }

    /// Wires this interface to `parent` from the parent's perspective.
    ///
    /// For every port whose tags intersect `input_tags`, `parent` gains an
    /// input port of the same name and width sourced from `other`'s view
    /// of that port; for every port whose tags intersect `output_tags`,
    /// `parent` gains an output port wired to drive `other`'s view. Ports
    /// matching neither set are silently omitted; a port matching both is
    /// an [`AmbiguousDirection`](GraphError::AmbiguousDirection) error.
    /// This interface's view is rebound to the newly created ports.
    pub fn connect_io(
        &mut self,
        ctx: &mut DesignContext,
        parent: ModuleId,
        other: &Interface<T>,
        input_tags: &[T],
        output_tags: &[T],
    ) -> Result<(), GraphError> {
        for idx in 0..self.ports.len() {
            let (name, width) = {
                let def = &self.ports[idx];
                (def.name.clone(), def.width)
            };
            let is_input = self.ports[idx].tags.iter().any(|t| input_tags.contains(t));
            let is_output = self.ports[idx].tags.iter().any(|t| output_tags.contains(t));
            match (is_input, is_output) {
                (true, true) => {
                    return Err(GraphError::AmbiguousDirection { port: name });
                }
                (false, false) => continue,
                (true, false) => {
                    let external = other.port(&name).ok_or_else(|| GraphError::PortViolation {
                        module: ctx.module_name(parent).to_string(),
                        reason: format!(
                            "interface `{}` has no port `{name}` to wire from",
                            other.name
                        ),
                    })?;
                    let port = ctx.add_input(parent, &name, external, width)?;
                    self.view[idx] = port;
                }
                (false, true) => {
                    let external = other.port(&name).ok_or_else(|| GraphError::PortViolation {
                        module: ctx.module_name(parent).to_string(),
                        reason: format!(
                            "interface `{}` has no port `{name}` to drive",
                            other.name
                        ),
                    })?;
                    let port = ctx.add_output(parent, &name, width)?;
                    ctx.connect(external, port)?;
                    self.view[idx] = port;
                }
            }
        }
        Ok(())
    }
}
