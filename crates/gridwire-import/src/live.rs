//! The live-circuit collaborator.
//!
//! Registration materializes a validated record through [`CircuitHost`].
//! [`LiveCircuits`] is the in-memory host used by the workspace and tests;
//! an application embeds its own simulator behind the same trait.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use gridwire_ir::{CircuitId, ComponentId, LinkEnd, Orientation, Position, TypeId};

/// Interface to the circuits the rest of the application works on.
///
/// Hosts assign their own component ids; callers never assume they match
/// record ids.
pub trait CircuitHost {
    /// Find the circuit registered under a logical identity.
    fn find_circuit(&self, identity: &str) -> Option<CircuitId>;

    /// Create an empty circuit.
    fn create_circuit(&mut self, name: &str, identity: &str) -> CircuitId;

    /// Remove a circuit and everything in it.
    fn destroy_circuit(&mut self, circuit: CircuitId) -> bool;

    /// Insert a component, returning its live id, or `None` if refused.
    fn insert_component_at(
        &mut self,
        circuit: CircuitId,
        position: Position,
        orientation: Orientation,
        ty: TypeId,
    ) -> Option<ComponentId>;

    /// Connect an output end to an input end.
    fn create_link(&mut self, circuit: CircuitId, output: LinkEnd, input: LinkEnd) -> bool;

    /// Type of a live component.
    fn type_of(&self, circuit: CircuitId, component: ComponentId) -> Option<TypeId>;

    /// Position of a live component.
    fn position_of(&self, circuit: CircuitId, component: ComponentId) -> Option<Position>;

    /// Live component ids of a circuit in ascending order.
    fn components(&self, circuit: CircuitId) -> Vec<ComponentId>;

    /// Mark a circuit as the definition of a composite type.
    fn set_circuit_type(&mut self, circuit: CircuitId, ty: TypeId);
}

/// A component inside a live circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveComponent {
    /// Anchor cell.
    pub position: Position,
    /// Orientation.
    pub orientation: Orientation,
    /// Component type.
    pub ty: TypeId,
}

/// One circuit of the in-memory host.
#[derive(Debug, Clone, Default)]
pub struct LiveCircuit {
    name: String,
    identity: String,
    ty: Option<TypeId>,
    components: BTreeMap<ComponentId, LiveComponent>,
    anchors: FxHashMap<Position, ComponentId>,
    links: Vec<(LinkEnd, LinkEnd)>,
    next_component: u32,
}

impl LiveCircuit {
    /// Circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Logical identity.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Composite type this circuit defines, if any.
    pub fn component_type(&self) -> Option<TypeId> {
        self.ty
    }

    /// Get a component.
    pub fn component(&self, id: ComponentId) -> Option<&LiveComponent> {
        self.components.get(&id)
    }

    /// Component at an anchor cell.
    pub fn component_at(&self, position: Position) -> Option<ComponentId> {
        self.anchors.get(&position).copied()
    }

    /// Number of components.
    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    /// Links as (output end, input end).
    pub fn links(&self) -> &[(LinkEnd, LinkEnd)] {
        &self.links
    }
}

/// In-memory [`CircuitHost`].
#[derive(Debug, Default)]
pub struct LiveCircuits {
    circuits: BTreeMap<CircuitId, LiveCircuit>,
    identities: FxHashMap<String, CircuitId>,
    next_circuit: u32,
}

impl LiveCircuits {
    /// Create an empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a circuit.
    pub fn circuit(&self, id: CircuitId) -> Option<&LiveCircuit> {
        self.circuits.get(&id)
    }

    /// Number of live circuits.
    pub fn len(&self) -> usize {
        self.circuits.len()
    }

    /// Check if there are no live circuits.
    pub fn is_empty(&self) -> bool {
        self.circuits.is_empty()
    }

    /// Drop every circuit.
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

impl CircuitHost for LiveCircuits {
    fn find_circuit(&self, identity: &str) -> Option<CircuitId> {
        self.identities.get(identity).copied()
    }

    fn create_circuit(&mut self, name: &str, identity: &str) -> CircuitId {
        self.next_circuit += 1;
        let id = CircuitId(self.next_circuit);
        self.circuits.insert(
            id,
            LiveCircuit {
                name: name.to_string(),
                identity: identity.to_string(),
                next_component: 1,
                ..LiveCircuit::default()
            },
        );
        self.identities.insert(identity.to_string(), id);
        id
    }

    fn destroy_circuit(&mut self, circuit: CircuitId) -> bool {
        let Some(removed) = self.circuits.remove(&circuit) else {
            return false;
        };
        if self.identities.get(&removed.identity) == Some(&circuit) {
            self.identities.remove(&removed.identity);
        }
        true
    }

    fn insert_component_at(
        &mut self,
        circuit: CircuitId,
        position: Position,
        orientation: Orientation,
        ty: TypeId,
    ) -> Option<ComponentId> {
        let live = self.circuits.get_mut(&circuit)?;
        if ty.is_none() || live.anchors.contains_key(&position) {
            return None;
        }
        let id = ComponentId(live.next_component);
        live.next_component += 1;
        live.components.insert(
            id,
            LiveComponent {
                position,
                orientation,
                ty,
            },
        );
        live.anchors.insert(position, id);
        Some(id)
    }

    fn create_link(&mut self, circuit: CircuitId, output: LinkEnd, input: LinkEnd) -> bool {
        let Some(live) = self.circuits.get_mut(&circuit) else {
            return false;
        };
        if !live.components.contains_key(&output.component)
            || !live.components.contains_key(&input.component)
            || live.links.contains(&(output, input))
        {
            return false;
        }
        live.links.push((output, input));
        true
    }

    fn type_of(&self, circuit: CircuitId, component: ComponentId) -> Option<TypeId> {
        Some(self.circuits.get(&circuit)?.components.get(&component)?.ty)
    }

    fn position_of(&self, circuit: CircuitId, component: ComponentId) -> Option<Position> {
        Some(self.circuits.get(&circuit)?.components.get(&component)?.position)
    }

    fn components(&self, circuit: CircuitId) -> Vec<ComponentId> {
        self.circuits
            .get(&circuit)
            .map(|c| c.components.keys().copied().collect())
            .unwrap_or_default()
    }

    fn set_circuit_type(&mut self, circuit: CircuitId, ty: TypeId) {
        if let Some(live) = self.circuits.get_mut(&circuit) {
            live.ty = Some(ty);
        }
    }
}
