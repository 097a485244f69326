//! Built-in validation stages, in pipeline order.

mod layout;
mod normalize;
mod repair;
mod resolve;

pub use layout::{AutoLayout, LayoutReport};
pub use normalize::{GeometryNormalizer, NormalizeReport};
pub use repair::{ConnectionRepair, RepairReport};
pub use resolve::{DependencyResolver, ResolveReport};

use gridwire_ir::{Component, IrError, SchemaCatalog, StructuralRecord, Vector};

use crate::error::{ImportError, ImportResult};

/// Oriented footprint of a component, with a missing schema reported as a
/// referential error.
pub(crate) fn footprint(
    record: &StructuralRecord,
    component: &Component,
    catalog: &SchemaCatalog,
) -> ImportResult<Vector> {
    record
        .footprint(component, catalog)
        .map_err(|err| match err {
            IrError::UnknownType(ty) => ImportError::MissingSchema { ty },
            other => ImportError::Ir(other),
        })
}
