//! Component-type schemas and the process-wide schema catalog.
//!
//! The catalog is an explicit, append-only store: types are allocated once
//! and live until [`SchemaCatalog::clear`]. Composite registrations are
//! keyed by the record's logical identity so registering the same identity
//! twice yields the same type.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::geometry::{Orientation, Position, Vector};
use crate::ids::{CircuitId, ComponentId, PortId, TypeId};
use crate::port::PortDirection;

/// Catalog path of the built-in primitives.
pub const BUILTIN_PATH: &str = "Basic";

/// Built-in primitive component types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    And,
    Or,
    Xor,
    Nand,
    Nor,
    Xnor,
    Junction,
    TristateBuffer,
    Button,
    TickButton,
    Switch,
    Constant,
    Light,
}

impl Primitive {
    /// Every primitive, in catalog order.
    pub const ALL: [Primitive; 13] = [
        Primitive::And,
        Primitive::Or,
        Primitive::Xor,
        Primitive::Nand,
        Primitive::Nor,
        Primitive::Xnor,
        Primitive::Junction,
        Primitive::TristateBuffer,
        Primitive::Button,
        Primitive::TickButton,
        Primitive::Switch,
        Primitive::Constant,
        Primitive::Light,
    ];

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Primitive::And => "And",
            Primitive::Or => "Or",
            Primitive::Xor => "Xor",
            Primitive::Nand => "Nand",
            Primitive::Nor => "Nor",
            Primitive::Xnor => "Xnor",
            Primitive::Junction => "Junction",
            Primitive::TristateBuffer => "Tristate Buffer",
            Primitive::Button => "Button",
            Primitive::TickButton => "Tick Button",
            Primitive::Switch => "Switch",
            Primitive::Constant => "Constant",
            Primitive::Light => "Light",
        }
    }

    /// Type id the primitive is catalogued under by
    /// [`SchemaCatalog::with_builtins`].
    pub fn type_id(self) -> TypeId {
        let index = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        TypeId(index as u32 + 1)
    }

    /// Inverse of [`Primitive::type_id`].
    pub fn from_type_id(ty: TypeId) -> Option<Self> {
        let index = usize::try_from(ty.0).ok()?.checked_sub(1)?;
        Self::ALL.get(index).copied()
    }

    /// Check if the primitive feeds a signal into a circuit from outside.
    pub fn is_input_source(self) -> bool {
        matches!(
            self,
            Primitive::Switch | Primitive::Button | Primitive::TickButton
        )
    }

    /// Check if the primitive shows a signal to the outside.
    pub fn is_output_sink(self) -> bool {
        self == Primitive::Light
    }

    fn schema(self) -> ComponentTypeSchema {
        let mut schema = ComponentTypeSchema::new(self.type_id());
        schema.name = self.name().to_string();
        schema.path = BUILTIN_PATH.to_string();
        let origin = Vector::new(0, 0);
        let ports: &[(u32, PortDirection, Vector)] = match self {
            Primitive::TristateBuffer => {
                schema.size = Vector::new(1, 2);
                &[
                    (0, PortDirection::Input, Vector::new(0, 1)),
                    (1, PortDirection::Input, origin),
                    (2, PortDirection::Output, Vector::new(0, 1)),
                ]
            }
            Primitive::Button | Primitive::TickButton | Primitive::Switch | Primitive::Constant => {
                &[(0, PortDirection::Output, origin)]
            }
            Primitive::Light => &[(0, PortDirection::Input, origin)],
            _ => &[
                (0, PortDirection::Input, origin),
                (1, PortDirection::Output, origin),
            ],
        };
        for &(id, direction, offset) in ports {
            schema.ports.insert(
                PortId(id),
                SchemaPort {
                    id: PortId(id),
                    direction,
                    offset,
                    name: None,
                },
            );
        }
        schema
    }
}

/// A port as catalogued on a component type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaPort {
    /// Port id.
    pub id: PortId,
    /// Immutable once declared.
    pub direction: PortDirection,
    /// Offset in the unrotated footprint.
    pub offset: Vector,
    /// Display name.
    pub name: Option<String>,
}

/// Footprint, port table and catalog metadata of one component type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentTypeSchema {
    id: TypeId,
    name: String,
    path: String,
    size: Vector,
    primitive: bool,
    ports: BTreeMap<PortId, SchemaPort>,
}

impl ComponentTypeSchema {
    fn new(id: TypeId) -> Self {
        Self {
            id,
            name: String::new(),
            path: String::new(),
            size: Vector::UNIT,
            primitive: true,
            ports: BTreeMap::new(),
        }
    }

    /// Type id.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Catalog path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Unrotated footprint.
    pub fn size(&self) -> Vector {
        self.size
    }

    /// Whether the type is a primitive (as opposed to a composite).
    pub fn is_primitive(&self) -> bool {
        self.primitive
    }

    /// Get a port.
    pub fn port(&self, id: PortId) -> Option<&SchemaPort> {
        self.ports.get(&id)
    }

    /// Ports in id order.
    pub fn ports(&self) -> impl Iterator<Item = &SchemaPort> + '_ {
        self.ports.values()
    }

    /// Number of ports.
    pub fn num_ports(&self) -> usize {
        self.ports.len()
    }

    /// Direction of a port.
    pub fn port_direction(&self, id: PortId) -> Option<PortDirection> {
        self.ports.get(&id).map(|p| p.direction)
    }

    /// Offset of a port once the footprint is rotated.
    pub fn port_offset(&self, id: PortId, orientation: Orientation) -> Option<Vector> {
        self.ports
            .get(&id)
            .map(|p| orientation.rotate_offset(p.offset, self.size))
    }
}

/// Where a composite port lands inside the composite's own circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortTarget {
    /// Grid position of the internal component.
    pub position: Position,
    /// Live id of the internal component.
    pub component: ComponentId,
    /// Port on the internal component.
    pub port: PortId,
}

/// Bidirectional port id ↔ internal position mapping of a composite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositePortMap {
    by_port: BTreeMap<PortId, PortTarget>,
    by_position: BTreeMap<Position, PortId>,
}

impl CompositePortMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a port to an internal target, replacing any previous entry for
    /// either side.
    pub fn insert(&mut self, port: PortId, target: PortTarget) {
        if let Some(old) = self.by_port.insert(port, target) {
            self.by_position.remove(&old.position);
        }
        if let Some(old_port) = self.by_position.insert(target.position, port) {
            if old_port != port {
                self.by_port.remove(&old_port);
            }
        }
    }

    /// Internal target of a port.
    pub fn target(&self, port: PortId) -> Option<&PortTarget> {
        self.by_port.get(&port)
    }

    /// Port wired to the component at an internal position.
    pub fn port_at(&self, position: Position) -> Option<PortId> {
        self.by_position.get(&position).copied()
    }

    /// Entries in port order.
    pub fn iter(&self) -> impl Iterator<Item = (PortId, &PortTarget)> + '_ {
        self.by_port.iter().map(|(&p, t)| (p, t))
    }

    /// Number of mapped ports.
    pub fn len(&self) -> usize {
        self.by_port.len()
    }

    /// Check if no port is mapped.
    pub fn is_empty(&self) -> bool {
        self.by_port.is_empty()
    }
}

/// Store of component-type schemas. Types are only removed to undo a
/// failed import.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    schemas: BTreeMap<TypeId, ComponentTypeSchema>,
    next_type: u32,
    identities: FxHashMap<String, TypeId>,
    circuits: FxHashMap<TypeId, CircuitId>,
    port_maps: FxHashMap<TypeId, CompositePortMap>,
}

impl SchemaCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self {
            next_type: 1,
            ..Self::default()
        }
    }

    /// Create a catalog holding every [`Primitive`].
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        for primitive in Primitive::ALL {
            let schema = primitive.schema();
            catalog.next_type = catalog.next_type.max(schema.id.0 + 1);
            catalog.schemas.insert(schema.id, schema);
        }
        catalog
    }

    /// Allocate a fresh type with an empty 1×1 primitive schema.
    pub fn allocate_type(&mut self) -> TypeId {
        let id = TypeId(self.next_type);
        self.next_type += 1;
        self.schemas.insert(id, ComponentTypeSchema::new(id));
        id
    }

    /// Get a schema.
    pub fn schema(&self, ty: TypeId) -> Option<&ComponentTypeSchema> {
        self.schemas.get(&ty)
    }

    fn schema_mut(&mut self, ty: TypeId) -> IrResult<&mut ComponentTypeSchema> {
        self.schemas.get_mut(&ty).ok_or(IrError::UnknownType(ty))
    }

    /// Check if a type has a schema.
    pub fn contains(&self, ty: TypeId) -> bool {
        self.schemas.contains_key(&ty)
    }

    /// Schemas in type order.
    pub fn schemas(&self) -> impl Iterator<Item = &ComponentTypeSchema> + '_ {
        self.schemas.values()
    }

    /// Number of catalogued types.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Check if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Set the footprint of a type.
    pub fn set_footprint(&mut self, ty: TypeId, size: Vector) -> IrResult<()> {
        self.schema_mut(ty)?.size = size;
        Ok(())
    }

    /// Mark a type primitive or composite.
    ///
    /// A composite type is never turned back into a primitive.
    pub fn set_primitive(&mut self, ty: TypeId, primitive: bool) -> IrResult<()> {
        let schema = self.schema_mut(ty)?;
        if primitive && !schema.primitive {
            return Err(IrError::CompositePolicy(ty));
        }
        schema.primitive = primitive;
        Ok(())
    }

    /// Set the catalog path of a type.
    pub fn set_catalog_path(&mut self, ty: TypeId, path: impl Into<String>) -> IrResult<()> {
        self.schema_mut(ty)?.path = path.into();
        Ok(())
    }

    /// Set the display name of a type.
    pub fn set_name(&mut self, ty: TypeId, name: impl Into<String>) -> IrResult<()> {
        self.schema_mut(ty)?.name = name.into();
        Ok(())
    }

    /// Declare a port. Redeclaring with the same direction moves it;
    /// a different direction is refused.
    pub fn add_port(
        &mut self,
        ty: TypeId,
        port: PortId,
        direction: PortDirection,
        offset: Vector,
    ) -> IrResult<()> {
        let schema = self.schema_mut(ty)?;
        match schema.ports.get_mut(&port) {
            Some(existing) if existing.direction != direction => {
                Err(IrError::PortDirectionConflict {
                    ty,
                    port,
                    existing: existing.direction.as_str(),
                })
            }
            Some(existing) => {
                existing.offset = offset;
                Ok(())
            }
            None => {
                schema.ports.insert(
                    port,
                    SchemaPort {
                        id: port,
                        direction,
                        offset,
                        name: None,
                    },
                );
                Ok(())
            }
        }
    }

    /// Name a declared port.
    pub fn set_port_name(
        &mut self,
        ty: TypeId,
        port: PortId,
        name: impl Into<String>,
    ) -> IrResult<()> {
        let entry = self
            .schema_mut(ty)?
            .ports
            .get_mut(&port)
            .ok_or(IrError::PortNotFound { ty, port })?;
        entry.name = Some(name.into());
        Ok(())
    }

    /// Find a type by `path/name` or by bare name.
    pub fn lookup(&self, key: &str) -> Option<TypeId> {
        let (path, name) = match key.rsplit_once('/') {
            Some((path, name)) => (Some(path), name),
            None => (None, key),
        };
        self.schemas
            .values()
            .find(|s| s.name == name && path.is_none_or(|p| s.path == p))
            .map(|s| s.id)
    }

    // ---- composite bookkeeping ----

    /// Type registered under a logical identity.
    pub fn type_for_identity(&self, identity: &str) -> Option<TypeId> {
        self.identities.get(identity).copied()
    }

    /// Bind a logical identity to a type.
    pub fn bind_identity(&mut self, identity: impl Into<String>, ty: TypeId) {
        self.identities.insert(identity.into(), ty);
    }

    /// Circuit defining a composite type.
    pub fn circuit_for_type(&self, ty: TypeId) -> Option<CircuitId> {
        self.circuits.get(&ty).copied()
    }

    /// Bind a composite type to the circuit that defines it.
    pub fn bind_circuit(&mut self, ty: TypeId, circuit: CircuitId) {
        self.circuits.insert(ty, circuit);
    }

    /// Port map of a composite type.
    pub fn port_map(&self, ty: TypeId) -> Option<&CompositePortMap> {
        self.port_maps.get(&ty)
    }

    /// Store the port map of a composite type.
    pub fn set_port_map(&mut self, ty: TypeId, map: CompositePortMap) {
        self.port_maps.insert(ty, map);
    }

    /// Remove a composite type and every binding to it, undoing a
    /// registration. Built-in primitives stay; type ids are never reused.
    pub fn remove_type(&mut self, ty: TypeId) -> bool {
        if Primitive::from_type_id(ty).is_some() || self.schemas.remove(&ty).is_none() {
            return false;
        }
        self.identities.retain(|_, bound| *bound != ty);
        self.circuits.remove(&ty);
        self.port_maps.remove(&ty);
        true
    }

    /// Drop every type and binding.
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}
