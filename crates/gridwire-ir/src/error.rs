//! Error types for the IR crate.

use crate::ids::{ComponentId, PortId, TypeId};
use thiserror::Error;

/// Errors that can occur while building records or editing the catalog.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Component id 0 is reserved.
    #[error("Component id 0 is reserved and cannot name a component")]
    InvalidComponentId,

    /// A component with this id is already in the record.
    #[error("Component {0} already exists in record")]
    DuplicateComponent(ComponentId),

    /// Component not found.
    #[error("Component {0} not found")]
    ComponentNotFound(ComponentId),

    /// No schema registered for this type.
    #[error("No schema for component type {0}")]
    UnknownType(TypeId),

    /// Port id declared twice on the same record.
    #[error("Port {port} declared twice{}", format_type_context(*.ty))]
    DuplicatePort {
        /// The repeated port.
        port: PortId,
        /// Owning type, when the port is already catalogued.
        ty: Option<TypeId>,
    },

    /// Attempt to flip the direction of a declared port.
    #[error("Port {port} of type {ty} is already declared as {existing}")]
    PortDirectionConflict {
        /// Owning type.
        ty: TypeId,
        /// The port.
        port: PortId,
        /// Direction it was declared with.
        existing: &'static str,
    },

    /// Port not declared on the type.
    #[error("Port {port} is not declared on type {ty}")]
    PortNotFound {
        /// Owning type.
        ty: TypeId,
        /// The port.
        port: PortId,
    },

    /// Unknown type name in a record document.
    #[error("Unknown component type '{0}'")]
    UnknownTypeName(String),

    /// Composite types cannot be turned back into primitives.
    #[error("Component type {0} is composite and cannot be marked primitive")]
    CompositePolicy(TypeId),

    /// Invalid graph structure.
    #[error("Invalid link graph: {0}")]
    InvalidGraph(String),
}

fn format_type_context(ty: Option<TypeId>) -> String {
    match ty {
        Some(ty) => format!(" on type {ty}"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
