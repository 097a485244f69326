//! Registrar: turns a validated record into a live circuit and, for
//! composites, a catalogued component type.

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use gridwire_ir::{
    CircuitId, ComponentId, CompositePortMap, IrError, LinkEnd, PortDirection, PortTarget,
    Position, StructuralRecord, TypeId, TypeRef, Validity,
};

use crate::context::StageContext;
use crate::error::{ImportError, ImportResult};
use crate::notify::Event;

/// Outcome of a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// The live circuit.
    pub circuit: CircuitId,
    /// The new (or reused) component type, for composites.
    pub component_type: Option<TypeId>,
    /// Port map of the composite type.
    pub port_map: Option<CompositePortMap>,
    /// Whether an earlier registration with the same identity was returned.
    pub reused: bool,
}

/// Materializes validated records.
///
/// Registration is idempotent per logical identity and never leaves a
/// partial circuit behind: every check that can fail runs before the first
/// collaborator call, and a refusal from the live circuit destroys what was
/// built so far.
#[derive(Debug, Default, Clone, Copy)]
pub struct Registrar;

impl Registrar {
    /// Create a registrar.
    pub fn new() -> Self {
        Self
    }

    /// Register a validated record, consuming it.
    #[instrument(skip(self, record, ctx), fields(record = %record.name()))]
    pub fn register(
        &self,
        record: StructuralRecord,
        composite: bool,
        ctx: &mut StageContext<'_>,
    ) -> ImportResult<Registration> {
        match record.validity() {
            Validity::Valid => {}
            Validity::Invalid => return Err(ImportError::AlreadyRejected),
            Validity::Pending => return Err(ImportError::NotValidated),
        }

        let identity = record
            .identity()
            .map_or_else(|| Uuid::new_v4().to_string(), str::to_string);

        if let Some(existing) = Self::existing(&identity, composite, ctx)? {
            warn!(
                "'{}' is already registered as {}; returning the existing registration",
                identity, existing.circuit
            );
            return Ok(existing);
        }

        Self::precheck(&record, ctx)?;

        let circuit = ctx.host.create_circuit(record.name(), &identity);
        let live_ids = match Self::materialize(&record, circuit, ctx) {
            Ok(ids) => ids,
            Err(err) => {
                warn!("Rolling back circuit {}: {}", circuit, err);
                ctx.host.destroy_circuit(circuit);
                return Err(err);
            }
        };

        let mut registration = Registration {
            circuit,
            component_type: None,
            port_map: None,
            reused: false,
        };

        if composite {
            let (ty, port_map) = match Self::catalogue(&record, &identity, circuit, &live_ids, ctx) {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Rolling back circuit {}: {}", circuit, err);
                    ctx.host.destroy_circuit(circuit);
                    return Err(err);
                }
            };
            registration.component_type = Some(ty);
            registration.port_map = Some(port_map);
        }

        ctx.sink.publish(Event::CircuitRegistered(circuit));
        if let Some(ty) = registration.component_type {
            ctx.sink.publish(Event::SchemaUpdated(ty));
        }

        info!(
            "Registered '{}' as {} ({} components){}",
            record.name(),
            circuit,
            live_ids.len(),
            registration
                .component_type
                .map(|ty| format!(", component type {ty}"))
                .unwrap_or_default()
        );
        Ok(registration)
    }

    /// An earlier registration under the same identity. A bound type whose
    /// circuit is no longer live is an error, never a registration of
    /// circuit 0.
    fn existing(
        identity: &str,
        composite: bool,
        ctx: &StageContext<'_>,
    ) -> ImportResult<Option<Registration>> {
        if composite {
            let Some(ty) = ctx.catalog.type_for_identity(identity) else {
                return Ok(None);
            };
            let circuit = ctx
                .catalog
                .circuit_for_type(ty)
                .filter(|c| ctx.host.find_circuit(identity) == Some(*c))
                .ok_or(ImportError::MissingCircuit { ty })?;
            Ok(Some(Registration {
                circuit,
                component_type: Some(ty),
                port_map: ctx.catalog.port_map(ty).cloned(),
                reused: true,
            }))
        } else {
            Ok(ctx.host.find_circuit(identity).map(|circuit| Registration {
                circuit,
                component_type: None,
                port_map: None,
                reused: true,
            }))
        }
    }

    /// Undo a registration made by [`Registrar::register`]: destroy its
    /// circuit and drop its component type. Reused registrations are left
    /// alone.
    pub fn unregister(&self, registration: &Registration, ctx: &mut StageContext<'_>) {
        if registration.reused {
            return;
        }
        ctx.host.destroy_circuit(registration.circuit);
        if let Some(ty) = registration.component_type {
            ctx.catalog.remove_type(ty);
        }
        warn!("Rolled back registration of {}", registration.circuit);
    }

    /// Everything that could refuse the record, checked before any side effect.
    fn precheck(record: &StructuralRecord, ctx: &StageContext<'_>) -> ImportResult<()> {
        for component in record.components() {
            let TypeRef::Known(ty) = component.ty else {
                return Err(ImportError::UnresolvedType(component.id));
            };
            if !ctx.catalog.contains(ty) {
                return Err(ImportError::MissingSchema { ty });
            }
            if component.placement.exact().is_none() {
                return Err(ImportError::UndefinedPosition(component.id));
            }
        }

        let mut port_ids = FxHashSet::default();
        for port in record.ports() {
            if !record.contains(port.internal) {
                return Err(IrError::ComponentNotFound(port.internal).into());
            }
            if !port_ids.insert(port.id) {
                return Err(IrError::DuplicatePort {
                    port: port.id,
                    ty: None,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Insert components, then create one link per connection (the end
    /// leaving an output port).
    fn materialize(
        record: &StructuralRecord,
        circuit: CircuitId,
        ctx: &mut StageContext<'_>,
    ) -> ImportResult<BTreeMap<ComponentId, ComponentId>> {
        let mut live_ids = BTreeMap::new();
        for component in record.components() {
            let (Some(position), Some(ty)) = (component.placement.exact(), component.ty.known())
            else {
                return Err(ImportError::UndefinedPosition(component.id));
            };
            let live = ctx
                .host
                .insert_component_at(circuit, position, component.orientation, ty)
                .ok_or_else(|| {
                    ImportError::Materialize(format!(
                        "component {} at {} was not inserted",
                        component.id, position
                    ))
                })?;
            live_ids.insert(component.id, live);
        }

        for link in record.links() {
            if record.port_direction(link.output, ctx.catalog) != Some(PortDirection::Output) {
                continue;
            }
            let (Some(&from), Some(&to)) = (
                live_ids.get(&link.output.component),
                live_ids.get(&link.input.component),
            ) else {
                continue;
            };
            let output = LinkEnd::new(from, link.output.port);
            let input = LinkEnd::new(to, link.input.port);
            if !ctx.host.create_link(circuit, output, input) {
                return Err(ImportError::Materialize(format!("link {link} was not created")));
            }
        }
        debug!("Materialized {} components into {}", live_ids.len(), circuit);
        Ok(live_ids)
    }

    /// Allocate the composite type, copy the port table and build the port map.
    fn catalogue(
        record: &StructuralRecord,
        identity: &str,
        circuit: CircuitId,
        live_ids: &BTreeMap<ComponentId, ComponentId>,
        ctx: &mut StageContext<'_>,
    ) -> ImportResult<(TypeId, CompositePortMap)> {
        let ty = ctx.catalog.allocate_type();
        match Self::describe(record, ty, live_ids, ctx) {
            Ok(port_map) => {
                ctx.catalog.bind_identity(identity, ty);
                ctx.catalog.bind_circuit(ty, circuit);
                ctx.host.set_circuit_type(circuit, ty);
                debug!("Catalogued {} with {} ports", ty, port_map.len());
                Ok((ty, port_map))
            }
            Err(err) => {
                ctx.catalog.remove_type(ty);
                Err(err)
            }
        }
    }

    /// Fill in the schema of a freshly allocated type.
    fn describe(
        record: &StructuralRecord,
        ty: TypeId,
        live_ids: &BTreeMap<ComponentId, ComponentId>,
        ctx: &mut StageContext<'_>,
    ) -> ImportResult<CompositePortMap> {
        let catalog = &mut *ctx.catalog;
        catalog.set_name(ty, record.name())?;
        catalog.set_footprint(ty, record.fitted_size())?;
        catalog.set_primitive(ty, false)?;
        catalog.set_catalog_path(ty, ctx.config.registrar.catalog_path.as_str())?;

        let mut port_map = CompositePortMap::new();
        let (mut inputs, mut outputs) = (0u32, 0u32);
        for port in record.ports() {
            catalog.add_port(ty, port.id, port.direction, port.offset)?;
            let name = match (&port.name, port.direction) {
                (Some(name), _) => name.clone(),
                (None, PortDirection::Input) => format!("INPUT: {inputs}"),
                (None, PortDirection::Output) => format!("OUTPUT: {outputs}"),
            };
            match port.direction {
                PortDirection::Input => inputs += 1,
                PortDirection::Output => outputs += 1,
            }
            catalog.set_port_name(ty, port.id, name)?;

            let position = record
                .component(port.internal)
                .and_then(|c| c.placement.exact())
                .unwrap_or(Position::new(0, 0));
            let component = live_ids
                .get(&port.internal)
                .copied()
                .ok_or(IrError::ComponentNotFound(port.internal))?;
            port_map.insert(
                port.id,
                PortTarget {
                    position,
                    component,
                    port: port.internal_port,
                },
            );
        }

        catalog.set_port_map(ty, port_map.clone());
        Ok(port_map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportConfig;
    use crate::live::{CircuitHost, LiveCircuits};
    use crate::notify::RecordingSink;
    use crate::validator::Validator;
    use gridwire_ir::{Orientation, Placement, PortDecl, PortId, Primitive, SchemaCatalog, Vector};

    fn composite() -> StructuralRecord {
        let mut record = StructuralRecord::new("buffer").with_identity("buffer-v1");
        let input = record.push_component(
            Primitive::Switch.type_id(),
            Placement::Exact(Position::new(0, 0)),
            Orientation::Zero,
        );
        let output = record.push_component(
            Primitive::Light.type_id(),
            Placement::Exact(Position::new(2, 0)),
            Orientation::Zero,
        );
        record.connect(LinkEnd::new(input, PortId(0)), LinkEnd::new(output, PortId(0)));
        record
            .add_port(PortDecl::input(PortId(0), Vector::new(0, 0), input))
            .unwrap();
        record
            .add_port(PortDecl::output(PortId(1), Vector::new(1, 0), output).named("Q"))
            .unwrap();
        record
    }

    #[test]
    fn test_unvalidated_record_is_refused() {
        let config = ImportConfig::default();
        let mut catalog = SchemaCatalog::with_builtins();
        let mut host = LiveCircuits::new();
        let mut sink = RecordingSink::new();
        let mut ctx = StageContext::new(&mut catalog, &mut host, &mut sink, &config);

        let err = Registrar::new().register(composite(), true, &mut ctx).unwrap_err();
        assert!(matches!(err, ImportError::NotValidated));
        assert!(host.is_empty());
    }

    #[test]
    fn test_composite_registration() {
        let config = ImportConfig::default();
        let mut catalog = SchemaCatalog::with_builtins();
        let mut host = LiveCircuits::new();
        let mut sink = RecordingSink::new();
        let mut ctx = StageContext::new(&mut catalog, &mut host, &mut sink, &config);

        let mut record = composite();
        Validator::default().run(&mut record, &mut ctx).unwrap();
        let registration = Registrar::new().register(record, true, &mut ctx).unwrap();
        let ty = registration.component_type.unwrap();

        let schema = ctx.catalog.schema(ty).unwrap();
        assert!(!schema.is_primitive());
        assert_eq!(schema.path(), "Custom");
        assert_eq!(schema.size(), Vector::new(2, 1));
        assert_eq!(schema.port(PortId(0)).unwrap().name.as_deref(), Some("INPUT: 0"));
        assert_eq!(schema.port(PortId(1)).unwrap().name.as_deref(), Some("Q"));

        let map = registration.port_map.unwrap();
        assert_eq!(map.target(PortId(1)).unwrap().position, Position::new(2, 0));
        assert_eq!(map.port_at(Position::new(0, 0)), Some(PortId(0)));

        assert_eq!(ctx.host.components(registration.circuit).len(), 2);
        assert_eq!(
            sink.events(),
            &[
                Event::CircuitRegistered(registration.circuit),
                Event::SchemaUpdated(ty)
            ]
        );
        assert_eq!(
            host.circuit(registration.circuit).unwrap().component_type(),
            Some(ty)
        );
    }

    #[test]
    fn test_bound_identity_without_live_circuit_is_an_error() {
        let config = ImportConfig::default();
        let mut catalog = SchemaCatalog::with_builtins();
        let mut host = LiveCircuits::new();
        let mut sink = RecordingSink::new();
        let mut ctx = StageContext::new(&mut catalog, &mut host, &mut sink, &config);

        let mut record = composite();
        Validator::default().run(&mut record, &mut ctx).unwrap();
        let first = Registrar::new().register(record, true, &mut ctx).unwrap();
        ctx.host.destroy_circuit(first.circuit);

        let mut again = composite();
        Validator::default().run(&mut again, &mut ctx).unwrap();
        let err = Registrar::new().register(again, true, &mut ctx).unwrap_err();
        assert!(matches!(err, ImportError::MissingCircuit { ty } if Some(ty) == first.component_type));
    }

    #[test]
    fn test_unregister_undoes_registration() {
        let config = ImportConfig::default();
        let mut catalog = SchemaCatalog::with_builtins();
        let mut host = LiveCircuits::new();
        let mut sink = RecordingSink::new();
        let mut ctx = StageContext::new(&mut catalog, &mut host, &mut sink, &config);

        let mut record = composite();
        Validator::default().run(&mut record, &mut ctx).unwrap();
        let registrar = Registrar::new();
        let registration = registrar.register(record, true, &mut ctx).unwrap();
        registrar.unregister(&registration, &mut ctx);

        assert_eq!(ctx.catalog.type_for_identity("buffer-v1"), None);
        assert_eq!(ctx.catalog.len(), Primitive::ALL.len());
        assert!(host.is_empty());
    }

    struct RefusingHost {
        inner: LiveCircuits,
    }

    impl CircuitHost for RefusingHost {
        fn find_circuit(&self, identity: &str) -> Option<CircuitId> {
            self.inner.find_circuit(identity)
        }
        fn create_circuit(&mut self, name: &str, identity: &str) -> CircuitId {
            self.inner.create_circuit(name, identity)
        }
        fn destroy_circuit(&mut self, circuit: CircuitId) -> bool {
            self.inner.destroy_circuit(circuit)
        }
        fn insert_component_at(
            &mut self,
            circuit: CircuitId,
            position: Position,
            orientation: Orientation,
            ty: TypeId,
        ) -> Option<ComponentId> {
            self.inner.insert_component_at(circuit, position, orientation, ty)
        }
        fn create_link(&mut self, _circuit: CircuitId, _output: LinkEnd, _input: LinkEnd) -> bool {
            false
        }
        fn type_of(&self, circuit: CircuitId, component: ComponentId) -> Option<TypeId> {
            self.inner.type_of(circuit, component)
        }
        fn position_of(&self, circuit: CircuitId, component: ComponentId) -> Option<Position> {
            self.inner.position_of(circuit, component)
        }
        fn components(&self, circuit: CircuitId) -> Vec<ComponentId> {
            self.inner.components(circuit)
        }
        fn set_circuit_type(&mut self, circuit: CircuitId, ty: TypeId) {
            self.inner.set_circuit_type(circuit, ty);
        }
    }

    #[test]
    fn test_refused_link_rolls_back() {
        let config = ImportConfig::default();
        let mut catalog = SchemaCatalog::with_builtins();
        let mut host = RefusingHost {
            inner: LiveCircuits::new(),
        };
        let mut sink = RecordingSink::new();
        let mut ctx = StageContext::new(&mut catalog, &mut host, &mut sink, &config);

        let mut record = composite();
        Validator::default().run(&mut record, &mut ctx).unwrap();
        let err = Registrar::new().register(record, true, &mut ctx).unwrap_err();
        assert!(matches!(err, ImportError::Materialize(_)));
        assert_eq!(ctx.catalog.type_for_identity("buffer-v1"), None);
        assert!(sink.events().is_empty());
        assert!(host.inner.is_empty());
    }
}
