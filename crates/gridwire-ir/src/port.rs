//! Ports: the attachment points of a component type.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geometry::Vector;
use crate::ids::{ComponentId, PortId};

/// Direction of a port. Fixed once the port is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// Receives a signal.
    Input,
    /// Drives a signal.
    Output,
}

impl PortDirection {
    /// Lower-case name, used in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            PortDirection::Input => "input",
            PortDirection::Output => "output",
        }
    }

    /// Check if this is an input port.
    #[inline]
    pub fn is_input(self) -> bool {
        self == PortDirection::Input
    }
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A port declared by a composite record.
///
/// `offset` is relative to the composite's own footprint; `internal` names
/// the component inside the record the port is wired to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDecl {
    /// Port id on the composite type.
    pub id: PortId,
    /// Input or output.
    pub direction: PortDirection,
    /// Offset of the port on the composite's footprint.
    pub offset: Vector,
    /// Internal component the port resolves to.
    pub internal: ComponentId,
    /// Port on the internal component (0 for switches and lights).
    #[serde(default)]
    pub internal_port: PortId,
    /// Optional display name.
    #[serde(default)]
    pub name: Option<String>,
}

impl PortDecl {
    /// Declare an input port.
    pub fn input(id: PortId, offset: Vector, internal: ComponentId) -> Self {
        Self {
            id,
            direction: PortDirection::Input,
            offset,
            internal,
            internal_port: PortId(0),
            name: None,
        }
    }

    /// Declare an output port.
    pub fn output(id: PortId, offset: Vector, internal: ComponentId) -> Self {
        Self {
            id,
            direction: PortDirection::Output,
            offset,
            internal,
            internal_port: PortId(0),
            name: None,
        }
    }

    /// Attach a display name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
