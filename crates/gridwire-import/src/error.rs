//! Error types for the import pipeline.

use gridwire_ir::{ComponentId, IrError, TypeId};
use thiserror::Error;

/// Errors that reject a record or a registration.
///
/// None of these is fatal to the process: the record is marked invalid and
/// nothing is committed to the live circuit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ImportError {
    /// Error from the IR crate.
    #[error("IR error: {0}")]
    Ir(#[from] IrError),

    /// Links remained without a reciprocal after repair.
    #[error("{remaining} link(s) remain without a reciprocal after repair")]
    UnrepairedAsymmetry {
        /// Number of unmatched link entries.
        remaining: usize,
    },

    /// The SCC condensation could not be ordered. Indicates a bug.
    #[error("Internal error: SCC condensation is not acyclic")]
    CondensationCycle,

    /// A dependency name has no record behind it.
    #[error("Dependency '{name}' has no resolvable record")]
    MissingDependency {
        /// The unresolved name.
        name: String,
    },

    /// A component type has no schema in the catalog.
    #[error("No schema for component type {ty}")]
    MissingSchema {
        /// The type.
        ty: TypeId,
    },

    /// A dependency appears inside its own dependency chain.
    #[error("Dependency '{name}' is re-entered while validating {chain}")]
    ReentrantDependency {
        /// The repeated name.
        name: String,
        /// Chain of names leading back to it.
        chain: String,
    },

    /// Dependency chain deeper than the configured bound.
    #[error("Dependency chain exceeds maximum depth of {max_depth}")]
    DependencyDepthExceeded {
        /// Configured bound.
        max_depth: usize,
    },

    /// A nested dependency failed validation.
    #[error("Dependency '{name}' failed: {source}")]
    DependencyFailed {
        /// Path of the failed dependency.
        name: String,
        /// Why it failed.
        #[source]
        source: Box<ImportError>,
    },

    /// Several dependencies failed.
    #[error("{} dependencies failed: {}", .0.len(), format_all(.0))]
    Dependencies(Vec<ImportError>),

    /// The record was rejected earlier and is never revisited.
    #[error("Record was already rejected")]
    AlreadyRejected,

    /// Registration of a record that has not passed validation.
    #[error("Record has not been validated")]
    NotValidated,

    /// A component still refers to an unregistered dependency.
    #[error("Component {0} has an unresolved type")]
    UnresolvedType(ComponentId),

    /// A component has no position at registration time.
    #[error("Component {0} has no position")]
    UndefinedPosition(ComponentId),

    /// Auto-layout ran off the edge of the grid.
    #[error("No free grid cell left for component {0}")]
    NoFreeCell(ComponentId),

    /// A registered composite type lost its defining circuit.
    #[error("Component type {ty} has no defining circuit")]
    MissingCircuit {
        /// The type.
        ty: TypeId,
    },

    /// The live circuit refused an insertion.
    #[error("Live circuit refused: {0}")]
    Materialize(String),

    /// A stage failed for a reason of its own.
    #[error("Stage '{name}' failed: {reason}")]
    StageFailed {
        /// Stage name.
        name: String,
        /// Reason.
        reason: String,
    },
}

fn format_all(errors: &[ImportError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for pipeline operations.
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_errors_render_nested_cause() {
        let err = ImportError::Dependencies(vec![
            ImportError::DependencyFailed {
                name: "adder".into(),
                source: Box::new(ImportError::UnrepairedAsymmetry { remaining: 2 }),
            },
            ImportError::MissingDependency {
                name: "mux".into(),
            },
        ]);
        let text = err.to_string();
        assert!(text.starts_with("2 dependencies failed"));
        assert!(text.contains("adder"));
        assert!(text.contains("'mux'"));
    }
}
