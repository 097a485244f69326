//! The Structural Record: a circuit as handed over by a producer.
//!
//! A record is built once (by a parser or a generator), mutated by the
//! validation stages, and consumed exactly once by registration. Components
//! are keyed by id in a [`BTreeMap`] so every walk over them is in ascending
//! id order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::geometry::{Bounds, Orientation, Placement, Position, Vector};
use crate::ids::{ComponentId, PortId, TypeId};
use crate::link::{Link, LinkEnd};
use crate::port::{PortDecl, PortDirection};
use crate::schema::SchemaCatalog;

/// The type of a component inside a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    /// A catalogued component type.
    Known(TypeId),
    /// A named dependency of the record, not yet registered.
    Dependency(String),
}

impl TypeRef {
    /// The catalogued type, if resolved.
    #[inline]
    pub fn known(&self) -> Option<TypeId> {
        match self {
            TypeRef::Known(ty) => Some(*ty),
            TypeRef::Dependency(_) => None,
        }
    }
}

impl From<TypeId> for TypeRef {
    fn from(ty: TypeId) -> Self {
        TypeRef::Known(ty)
    }
}

/// One placed element of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Unique, non-zero id within the record.
    pub id: ComponentId,
    /// Component type.
    pub ty: TypeRef,
    /// Position, possibly not yet on the grid.
    pub placement: Placement,
    /// Quarter-turn orientation.
    pub orientation: Orientation,
}

/// Validation verdict of a record. All-or-nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Validity {
    /// Not validated since the last edit.
    #[default]
    Pending,
    /// Every stage succeeded.
    Valid,
    /// Rejected. Never revisited.
    Invalid,
}

/// A named reference to another record used as a component type.
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    /// Name components use to refer to it.
    pub name: String,
    /// Declared number of input ports.
    pub inputs: u32,
    /// Declared number of output ports.
    pub outputs: u32,
    /// The record behind the name, if the producer resolved it.
    pub record: Option<Box<StructuralRecord>>,
    /// Catalogued type once the dependency has been registered.
    pub resolved: Option<TypeId>,
}

impl Dependency {
    /// Declare a dependency with its port counts.
    pub fn new(name: impl Into<String>, inputs: u32, outputs: u32) -> Self {
        Self {
            name: name.into(),
            inputs,
            outputs,
            record: None,
            resolved: None,
        }
    }

    /// Attach the record the name resolves to.
    #[must_use]
    pub fn with_record(mut self, record: StructuralRecord) -> Self {
        self.record = Some(Box::new(record));
        self
    }

    /// Footprint the dependency will occupy once registered.
    pub fn footprint(&self) -> Vector {
        match &self.record {
            Some(record) => record.fitted_size(),
            None => {
                let rows = self.inputs.max(self.outputs).max(1);
                Vector::new(2, i32::try_from(rows).unwrap_or(i32::MAX))
            }
        }
    }

    /// Direction of `port`, from the record's declared ports when available
    /// and otherwise from the declared counts (inputs first).
    pub fn port_direction(&self, port: PortId) -> Option<PortDirection> {
        if let Some(record) = &self.record {
            if !record.ports().is_empty() {
                return record
                    .ports()
                    .iter()
                    .find(|decl| decl.id == port)
                    .map(|decl| decl.direction);
            }
        }
        if port.0 < self.inputs {
            Some(PortDirection::Input)
        } else if port.0 - self.inputs < self.outputs {
            Some(PortDirection::Output)
        } else {
            None
        }
    }
}

/// Intermediate representation of a circuit prior to validation.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralRecord {
    name: String,
    identity: Option<String>,
    size: Vector,
    components: BTreeMap<ComponentId, Component>,
    links: Vec<Link>,
    ports: Vec<PortDecl>,
    dependencies: BTreeMap<String, Dependency>,
    validity: Validity,
    bounds: Bounds,
    next_id: u32,
}

impl StructuralRecord {
    /// Create an empty record.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity: None,
            size: Vector::UNIT,
            components: BTreeMap::new(),
            links: vec![],
            ports: vec![],
            dependencies: BTreeMap::new(),
            validity: Validity::Pending,
            bounds: Bounds::new(),
            next_id: 1,
        }
    }

    /// Set the stable logical identity used to deduplicate registrations.
    #[must_use]
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// Set the declared composite footprint.
    #[must_use]
    pub fn with_size(mut self, size: Vector) -> Self {
        self.size = size;
        self
    }

    /// Record name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Logical identity, if any.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Replace the logical identity.
    pub fn set_identity(&mut self, identity: impl Into<String>) {
        self.identity = Some(identity.into());
    }

    /// Declared composite footprint.
    pub fn size(&self) -> Vector {
        self.size
    }

    /// Replace the declared composite footprint.
    pub fn set_size(&mut self, size: Vector) {
        self.size = size;
        self.touch();
    }

    /// Declared footprint grown to hold every port offset, at least 1×1.
    pub fn fitted_size(&self) -> Vector {
        let mut size = Vector::new(self.size.dx.max(1), self.size.dy.max(1));
        for port in &self.ports {
            size.extend_to_fit(port.offset);
        }
        size
    }

    // ---- components ----

    /// Add a component with a producer-chosen id.
    pub fn add_component(
        &mut self,
        id: ComponentId,
        ty: impl Into<TypeRef>,
        placement: Placement,
        orientation: Orientation,
    ) -> IrResult<ComponentId> {
        if !id.is_valid() {
            return Err(IrError::InvalidComponentId);
        }
        if self.components.contains_key(&id) {
            return Err(IrError::DuplicateComponent(id));
        }
        self.insert_component(Component {
            id,
            ty: ty.into(),
            placement,
            orientation,
        });
        Ok(id)
    }

    /// Add a component with the next free id.
    pub fn push_component(
        &mut self,
        ty: impl Into<TypeRef>,
        placement: Placement,
        orientation: Orientation,
    ) -> ComponentId {
        while self.components.contains_key(&ComponentId(self.next_id)) {
            self.next_id += 1;
        }
        let id = ComponentId(self.next_id);
        self.next_id += 1;
        self.insert_component(Component {
            id,
            ty: ty.into(),
            placement,
            orientation,
        });
        id
    }

    fn insert_component(&mut self, component: Component) {
        self.components.insert(component.id, component);
        self.touch();
    }

    /// Get a component.
    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(&id)
    }

    /// Get a mutable component.
    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.components.get_mut(&id)
    }

    /// Check if a component exists.
    pub fn contains(&self, id: ComponentId) -> bool {
        self.components.contains_key(&id)
    }

    /// Iterate components in ascending id order.
    pub fn components(&self) -> impl Iterator<Item = &Component> + '_ {
        self.components.values()
    }

    /// Iterate components mutably in ascending id order.
    pub fn components_mut(&mut self) -> impl Iterator<Item = &mut Component> + '_ {
        self.components.values_mut()
    }

    /// Component ids in ascending order.
    pub fn component_ids(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.components.keys().copied()
    }

    /// Number of components.
    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    /// Check if the record has no components.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    // ---- links ----

    /// Record a single link exactly as the producer wrote it.
    pub fn add_link(&mut self, output: LinkEnd, input: LinkEnd) {
        self.links.push(Link::new(output, input));
        self.touch();
    }

    /// Record a connection from both ends.
    pub fn connect(&mut self, output: LinkEnd, input: LinkEnd) {
        let link = Link::new(output, input);
        self.links.push(link);
        self.links.push(link.reciprocal());
        self.touch();
    }

    /// All links in insertion order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Mutable access to the link list.
    pub fn links_mut(&mut self) -> &mut Vec<Link> {
        &mut self.links
    }

    // ---- ports ----

    /// Declare a composite port.
    pub fn add_port(&mut self, decl: PortDecl) -> IrResult<()> {
        if self.ports.iter().any(|p| p.id == decl.id) {
            return Err(IrError::DuplicatePort {
                port: decl.id,
                ty: None,
            });
        }
        self.ports.push(decl);
        self.touch();
        Ok(())
    }

    /// Declared ports in declaration order.
    pub fn ports(&self) -> &[PortDecl] {
        &self.ports
    }

    /// Mutable access to the declared ports.
    pub fn ports_mut(&mut self) -> &mut Vec<PortDecl> {
        &mut self.ports
    }

    // ---- dependencies ----

    /// Declare a named dependency. A later declaration replaces an earlier one.
    pub fn add_dependency(&mut self, dependency: Dependency) {
        self.dependencies.insert(dependency.name.clone(), dependency);
        self.touch();
    }

    /// Get a dependency by name.
    pub fn dependency(&self, name: &str) -> Option<&Dependency> {
        self.dependencies.get(name)
    }

    /// Get a mutable dependency by name.
    pub fn dependency_mut(&mut self, name: &str) -> Option<&mut Dependency> {
        self.dependencies.get_mut(name)
    }

    /// Dependencies in name order.
    pub fn dependencies(&self) -> impl DoubleEndedIterator<Item = &Dependency> + '_ {
        self.dependencies.values()
    }

    /// Dependencies in name order, mutably.
    pub fn dependencies_mut(&mut self) -> impl Iterator<Item = &mut Dependency> + '_ {
        self.dependencies.values_mut()
    }

    // ---- validity and bounds ----

    /// Current verdict.
    pub fn validity(&self) -> Validity {
        self.validity
    }

    /// Check if the record passed validation.
    pub fn is_valid(&self) -> bool {
        self.validity == Validity::Valid
    }

    /// Record a successful validation. Has no effect on a rejected record.
    pub fn mark_valid(&mut self) {
        if self.validity != Validity::Invalid {
            self.validity = Validity::Valid;
        }
    }

    /// Reject the record for good.
    pub fn reject(&mut self) {
        self.validity = Validity::Invalid;
    }

    fn touch(&mut self) {
        if self.validity != Validity::Invalid {
            self.validity = Validity::Pending;
        }
    }

    /// Extent of all definite positions seen so far.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Extend the bounds by a footprint anchored at `pos`.
    pub fn include_in_bounds(&mut self, pos: Position, size: Vector) {
        self.bounds.include_footprint(pos, size);
    }

    // ---- type queries ----

    /// Oriented footprint of a component.
    pub fn footprint(&self, component: &Component, catalog: &SchemaCatalog) -> IrResult<Vector> {
        let size = match &component.ty {
            TypeRef::Known(ty) => catalog.schema(*ty).ok_or(IrError::UnknownType(*ty))?.size(),
            TypeRef::Dependency(name) => self
                .dependencies
                .get(name)
                .map_or(Vector::UNIT, Dependency::footprint),
        };
        Ok(component.orientation.rotate_size(size))
    }

    /// Direction of the port a link end names, if it can be determined.
    pub fn port_direction(&self, end: LinkEnd, catalog: &SchemaCatalog) -> Option<PortDirection> {
        let component = self.components.get(&end.component)?;
        match &component.ty {
            TypeRef::Known(ty) => catalog.schema(*ty)?.port_direction(end.port),
            TypeRef::Dependency(name) => self.dependencies.get(name)?.port_direction(end.port),
        }
    }
}
