//! Importer façade: validation and registration over a workspace.

use tracing::{info, warn};

use gridwire_ir::{CircuitId, SchemaCatalog, StructuralRecord};

use crate::config::ImportConfig;
use crate::context::StageContext;
use crate::error::ImportResult;
use crate::live::{CircuitHost, LiveCircuits};
use crate::notify::{NotificationSink, RecordingSink, TracingSink};
use crate::registrar::{Registrar, Registration};
use crate::stages::ResolveReport;
use crate::validator::Validator;

/// The process-wide state an import works on: the schema catalog, the live
/// circuits and the notification sink.
///
/// Callers serialize access; a workspace is borrowed mutably for a whole
/// import.
#[derive(Debug)]
pub struct Workspace<H: CircuitHost = LiveCircuits, S: NotificationSink = TracingSink> {
    catalog: SchemaCatalog,
    host: H,
    sink: S,
}

impl Workspace {
    /// A workspace with the built-in primitives, an in-memory host and a
    /// logging sink.
    pub fn new() -> Self {
        Self::with_parts(LiveCircuits::new(), TracingSink)
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: CircuitHost, S: NotificationSink> Workspace<H, S> {
    /// A workspace over a custom host and sink.
    pub fn with_parts(host: H, sink: S) -> Self {
        Self {
            catalog: SchemaCatalog::with_builtins(),
            host,
            sink,
        }
    }

    /// Swap the notification sink.
    pub fn with_sink<T: NotificationSink>(self, sink: T) -> Workspace<H, T> {
        Workspace {
            catalog: self.catalog,
            host: self.host,
            sink,
        }
    }

    /// Swap the circuit host.
    pub fn with_host<T: CircuitHost>(self, host: T) -> Workspace<T, S> {
        Workspace {
            catalog: self.catalog,
            host,
            sink: self.sink,
        }
    }

    /// The schema catalog.
    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    /// The live circuits.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the live circuits.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// The notification sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Drop every registered composite and reseed the built-in primitives.
    ///
    /// Live circuits belong to the host; clearing them is up to the caller.
    pub fn teardown(&mut self) {
        self.catalog = SchemaCatalog::with_builtins();
        info!("Workspace catalog reset to {} built-in types", self.catalog.len());
    }

    /// Borrow everything for one pipeline run.
    pub fn context<'a>(&'a mut self, config: &'a ImportConfig) -> StageContext<'a> {
        StageContext::new(&mut self.catalog, &mut self.host, &mut self.sink, config)
    }
}

/// Validates records and registers them in a [`Workspace`].
pub struct Importer {
    config: ImportConfig,
    validator: Validator,
    registrar: Registrar,
}

impl Importer {
    /// An importer running the full pipeline.
    pub fn new(config: ImportConfig) -> Self {
        Self::with_validator(config, Validator::default())
    }

    /// An importer running a custom stage sequence.
    pub fn with_validator(config: ImportConfig, validator: Validator) -> Self {
        Self {
            config,
            validator,
            registrar: Registrar::new(),
        }
    }

    /// The configuration.
    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// The validator.
    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Validate a record in place without registering it.
    ///
    /// Dependencies of a valid record stay registered.
    pub fn validate<H: CircuitHost, S: NotificationSink>(
        &self,
        record: &mut StructuralRecord,
        workspace: &mut Workspace<H, S>,
    ) -> ImportResult<()> {
        let mut ctx = workspace.context(&self.config);
        self.validator.run(record, &mut ctx)?;
        ResolveReport::release(&mut ctx);
        Ok(())
    }

    /// Validate a record and register it, as a composite type if asked.
    ///
    /// All or nothing: if the record itself cannot be registered, the
    /// dependencies registered while validating it are rolled back and no
    /// notification is published.
    pub fn import<H: CircuitHost, S: NotificationSink>(
        &self,
        mut record: StructuralRecord,
        composite: bool,
        workspace: &mut Workspace<H, S>,
    ) -> ImportResult<Registration> {
        let mut ctx = workspace.context(&self.config);
        self.validator.run(&mut record, &mut ctx)?;

        let mut held = RecordingSink::new();
        let registered = self
            .registrar
            .register(record, composite, &mut ctx.with_sink(&mut held));
        match registered {
            Ok(registration) => {
                ResolveReport::release(&mut ctx);
                for event in held.take() {
                    ctx.sink.publish(event);
                }
                Ok(registration)
            }
            Err(err) => {
                ResolveReport::roll_back(&mut ctx);
                Err(err)
            }
        }
    }

    /// Import a record as a plain circuit.
    ///
    /// Returns [`CircuitId::NONE`] when the record is rejected.
    pub fn import_circuit<H: CircuitHost, S: NotificationSink>(
        &self,
        record: StructuralRecord,
        workspace: &mut Workspace<H, S>,
    ) -> CircuitId {
        let name = record.name().to_string();
        match self.import(record, false, workspace) {
            Ok(registration) => registration.circuit,
            Err(err) => {
                warn!("Import of '{}' failed: {}", name, err);
                CircuitId::NONE
            }
        }
    }
}

impl Default for Importer {
    fn default() -> Self {
        Self::new(ImportConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridwire_ir::{Orientation, Placement, Primitive};

    #[test]
    fn test_import_circuit_returns_none_on_failure() {
        let mut workspace = Workspace::new();
        let mut record = StructuralRecord::new("broken");
        record.push_component(Primitive::Light.type_id(), Placement::Undefined, Orientation::Zero);
        record.add_dependency(gridwire_ir::Dependency::new("ghost", 1, 1));

        let importer = Importer::default();
        assert_eq!(importer.import_circuit(record, &mut workspace), CircuitId::NONE);
        assert!(workspace.host().is_empty());
    }

    #[test]
    fn test_teardown_reseeds_builtins() {
        let mut workspace = Workspace::new().with_sink(RecordingSink::new());
        let mut record = StructuralRecord::new("block").with_identity("block");
        record.push_component(Primitive::Switch.type_id(), Placement::Undefined, Orientation::Zero);

        let importer = Importer::default();
        let registration = importer.import(record, true, &mut workspace).unwrap();
        assert!(registration.component_type.is_some());
        assert_eq!(workspace.catalog().len(), Primitive::ALL.len() + 1);

        workspace.teardown();
        assert_eq!(workspace.catalog().len(), Primitive::ALL.len());
        assert!(workspace.catalog().type_for_identity("block").is_none());
    }
}
