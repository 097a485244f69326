//! Gridwire circuit intermediate representation.
//!
//! This crate holds the data model shared by every stage of the import
//! pipeline: integer ids, grid geometry, ports and links, the
//! [`StructuralRecord`] producers hand over, the [`SchemaCatalog`] of
//! component types, and the [`LinkGraph`] used by auto-layout.
//!
//! # Example: building a record
//!
//! ```rust
//! use gridwire_ir::{LinkEnd, Orientation, Placement, PortId, Position, Primitive, StructuralRecord};
//!
//! let mut record = StructuralRecord::new("blinker");
//! let switch = record.push_component(Primitive::Switch.type_id(), Placement::Undefined, Orientation::Zero);
//! let light = record.push_component(
//!     Primitive::Light.type_id(),
//!     Placement::Exact(Position::new(5, 5)),
//!     Orientation::Zero,
//! );
//! record.connect(LinkEnd::new(switch, PortId(0)), LinkEnd::new(light, PortId(0)));
//!
//! assert_eq!(record.num_components(), 2);
//! assert_eq!(record.links().len(), 2);
//! ```

pub mod document;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod ids;
pub mod link;
pub mod port;
pub mod record;
pub mod schema;

pub use document::{ComponentDocument, DependencyDocument, LinkDocument, RecordDocument, TypeSpec};
pub use error::{IrError, IrResult};
pub use geometry::{Bounds, Orientation, Placement, Position, Vector};
pub use graph::{Condensation, LinkGraph};
pub use ids::{CircuitId, ComponentId, PortId, TypeId};
pub use link::{Link, LinkEnd};
pub use port::{PortDecl, PortDirection};
pub use record::{Component, Dependency, StructuralRecord, TypeRef, Validity};
pub use schema::{
    BUILTIN_PATH, ComponentTypeSchema, CompositePortMap, PortTarget, Primitive, SchemaCatalog,
    SchemaPort,
};
