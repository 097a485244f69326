//! Gridwire circuit import pipeline.
//!
//! This crate turns a [`StructuralRecord`](gridwire_ir::StructuralRecord)
//! handed over by a producer (a file parser or a circuit generator) into a
//! validated, collision-free circuit and registers it either as a live
//! circuit or as a new composite component type.
//!
//! # Architecture
//!
//! ```text
//! Structural Record
//!       |
//!       v
//! +-----------+
//! | Validator | <-- StageContext (catalog, live host, sink, config)
//! +-----------+
//!       |
//!       +-- ConnectionRepair     reciprocal links, dangling/duplicate cleanup
//!       +-- GeometryNormalizer   integer snap, collision demotion
//!       +-- DependencyResolver   nested records, children first
//!       +-- AutoLayout           weak components, SCC layers, packing
//!       |
//!       v
//! +-----------+
//! | Registrar | --> live circuit (+ composite type, port map, events)
//! +-----------+
//! ```
//!
//! A record's validity is all-or-nothing: the first failing stage rejects it
//! and a rejected record is never revisited.
//!
//! # Example
//!
//! ```rust
//! use gridwire_import::{ImportConfig, Importer, Workspace};
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
//! let mut workspace = Workspace::new();
//! let importer = Importer::new(ImportConfig::default());
//! let registration = importer.import(record, false, &mut workspace).unwrap();
//!
//! let circuit = workspace.host().circuit(registration.circuit).unwrap();
//! assert!(circuit.component_at(Position::new(0, 0)).is_some());
//! assert!(circuit.component_at(Position::new(5, 5)).is_some());
//! ```
//!
//! # Custom stages
//!
//! Implement [`Stage`] and add it through [`ValidatorBuilder::with_stage`]:
//!
//! ```rust
//! use gridwire_import::{ImportResult, Stage, StageContext, StageKind};
//! use gridwire_ir::StructuralRecord;
//!
//! struct CountLinks;
//!
//! impl Stage for CountLinks {
//!     fn name(&self) -> &str { "count_links" }
//!     fn kind(&self) -> StageKind { StageKind::Local }
//!
//!     fn run(&self, record: &mut StructuralRecord, ctx: &mut StageContext<'_>) -> ImportResult<()> {
//!         ctx.insert(record.links().len());
//!         Ok(())
//!     }
//! }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod importer;
pub mod live;
pub mod notify;
pub mod registrar;
pub mod stage;
pub mod validator;

// Built-in stages
pub mod stages;

pub use config::{ConfigError, ImportConfig, LayoutConfig, RegistrarConfig, ResolverConfig};
pub use context::StageContext;
pub use error::{ImportError, ImportResult};
pub use importer::{Importer, Workspace};
pub use live::{CircuitHost, LiveCircuit, LiveCircuits, LiveComponent};
pub use notify::{Event, NotificationSink, RecordingSink, TracingSink};
pub use registrar::{Registrar, Registration};
pub use stage::{Stage, StageKind};
pub use stages::{
    AutoLayout, ConnectionRepair, DependencyResolver, GeometryNormalizer, LayoutReport,
    NormalizeReport, RepairReport, ResolveReport,
};
pub use validator::{Validator, ValidatorBuilder};
