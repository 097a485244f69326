//! Link graph of a record and the graph algorithms layout relies on.
//!
//! Nodes are components. Every link joins its two ends into one weakly
//! connected component; only links that drive a signal (output port into
//! input port) become directed edges. Directed cycles are collapsed with
//! Kosaraju's two-pass algorithm before the condensation is ordered.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex as PetNodeIndex};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{IrError, IrResult};
use crate::ids::ComponentId;

/// Node index type for the link graph.
pub type NodeIndex = PetNodeIndex<u32>;

/// Strongly-connected components in topological order, with their layers.
#[derive(Debug, Clone, Default)]
pub struct Condensation {
    /// Each SCC's members in ascending id order; SCCs in topological order.
    pub sccs: Vec<Vec<ComponentId>>,
    /// Layer of every SCC, index-aligned with `sccs`.
    pub layers: Vec<u32>,
}

impl Condensation {
    /// Layer of a component, if it is in the graph.
    pub fn layer_of(&self, id: ComponentId) -> Option<u32> {
        self.sccs
            .iter()
            .position(|scc| scc.binary_search(&id).is_ok())
            .map(|i| self.layers[i])
    }
}

/// Directed "output feeds input" graph over the components of a record.
#[derive(Debug, Default)]
pub struct LinkGraph {
    graph: DiGraph<ComponentId, (), u32>,
    nodes: FxHashMap<ComponentId, NodeIndex>,
    joins: Vec<(NodeIndex, NodeIndex)>,
}

impl LinkGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component. Adding it twice is a no-op.
    pub fn add_node(&mut self, id: ComponentId) -> NodeIndex {
        if let Some(&node) = self.nodes.get(&id) {
            return node;
        }
        let node = self.graph.add_node(id);
        self.nodes.insert(id, node);
        node
    }

    /// Record that two components share a link, in either direction.
    pub fn join(&mut self, a: ComponentId, b: ComponentId) {
        let a = self.add_node(a);
        let b = self.add_node(b);
        self.joins.push((a, b));
    }

    /// Record that `from` drives an input of `to`. Implies [`join`](Self::join).
    pub fn drive(&mut self, from: ComponentId, to: ComponentId) {
        self.join(from, to);
        let from = self.nodes[&from];
        let to = self.nodes[&to];
        if self.graph.find_edge(from, to).is_none() {
            self.graph.add_edge(from, to, ());
        }
    }

    /// Number of components.
    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of distinct driving edges.
    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// Components that drive `id`.
    pub fn drivers(&self, id: ComponentId) -> Vec<ComponentId> {
        let Some(&node) = self.nodes.get(&id) else {
            return vec![];
        };
        let mut drivers: Vec<_> = self
            .graph
            .edges_directed(node, petgraph::Direction::Incoming)
            .map(|e| self.graph[e.source()])
            .collect();
        drivers.sort_unstable();
        drivers
    }

    /// Partition into weakly-connected components.
    ///
    /// Members are sorted ascending; components are ordered by their
    /// smallest member.
    pub fn weak_components(&self) -> Vec<Vec<ComponentId>> {
        let mut sets = UnionFind::<usize>::new(self.graph.node_count());
        for &(a, b) in &self.joins {
            sets.union(a.index(), b.index());
        }

        let mut by_root: FxHashMap<usize, Vec<ComponentId>> = FxHashMap::default();
        for node in self.graph.node_indices() {
            by_root
                .entry(sets.find(node.index()))
                .or_default()
                .push(self.graph[node]);
        }

        let mut components: Vec<_> = by_root.into_values().collect();
        for members in &mut components {
            members.sort_unstable();
        }
        components.sort_unstable_by_key(|members| members[0]);
        components
    }

    /// Collapse directed cycles and order the result.
    ///
    /// SCCs come out of Kosaraju's algorithm, then are ordered by repeated
    /// removal of zero in-degree nodes (ties broken by smallest member).
    /// Each SCC's layer is one more than the highest layer feeding it, or 0.
    ///
    /// # Errors
    ///
    /// [`IrError::InvalidGraph`] if the condensation cannot be fully ordered,
    /// which would mean the SCC computation is broken.
    pub fn condense(&self) -> IrResult<Condensation> {
        let mut sccs: Vec<Vec<ComponentId>> = kosaraju_scc(&self.graph)
            .into_iter()
            .map(|nodes| {
                let mut members: Vec<_> = nodes.into_iter().map(|n| self.graph[n]).collect();
                members.sort_unstable();
                members
            })
            .collect();
        sccs.sort_unstable_by_key(|members| members[0]);

        let mut scc_of: FxHashMap<NodeIndex, usize> = FxHashMap::default();
        for (index, members) in sccs.iter().enumerate() {
            for id in members {
                scc_of.insert(self.nodes[id], index);
            }
        }

        let mut successors: Vec<FxHashSet<usize>> = vec![FxHashSet::default(); sccs.len()];
        let mut in_degree = vec![0usize; sccs.len()];
        for edge in self.graph.edge_references() {
            let from = scc_of[&edge.source()];
            let to = scc_of[&edge.target()];
            if from != to && successors[from].insert(to) {
                in_degree[to] += 1;
            }
        }

        let mut ready: BinaryHeap<Reverse<(ComponentId, usize)>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| Reverse((sccs[i][0], i)))
            .collect();
        let mut order = Vec::with_capacity(sccs.len());
        let mut layers = vec![0u32; sccs.len()];

        while let Some(Reverse((_, index))) = ready.pop() {
            order.push(index);
            let mut next: Vec<usize> = successors[index].iter().copied().collect();
            next.sort_unstable();
            for succ in next {
                layers[succ] = layers[succ].max(layers[index] + 1);
                in_degree[succ] -= 1;
                if in_degree[succ] == 0 {
                    ready.push(Reverse((sccs[succ][0], succ)));
                }
            }
        }

        if order.len() != sccs.len() {
            return Err(IrError::InvalidGraph(format!(
                "condensation ordered {} of {} SCCs",
                order.len(),
                sccs.len()
            )));
        }

        Ok(Condensation {
            layers: order.iter().map(|&i| layers[i]).collect(),
            sccs: order.into_iter().map(|i| std::mem::take(&mut sccs[i])).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> ComponentId {
        ComponentId(n)
    }

    #[test]
    fn test_weak_components() {
        let mut graph = LinkGraph::new();
        graph.drive(id(1), id(2));
        graph.join(id(5), id(4));
        graph.add_node(id(3));
        graph.drive(id(2), id(6));

        let components = graph.weak_components();
        assert_eq!(
            components,
            vec![vec![id(1), id(2), id(6)], vec![id(3)], vec![id(4), id(5)]]
        );
    }

    #[test]
    fn test_condense_chain() {
        let mut graph = LinkGraph::new();
        graph.drive(id(3), id(2));
        graph.drive(id(2), id(1));

        let condensation = graph.condense().unwrap();
        assert_eq!(condensation.sccs, vec![vec![id(3)], vec![id(2)], vec![id(1)]]);
        assert_eq!(condensation.layers, vec![0, 1, 2]);
        assert_eq!(condensation.layer_of(id(1)), Some(2));
    }

    #[test]
    fn test_condense_cycle_shares_layer() {
        let mut graph = LinkGraph::new();
        graph.drive(id(1), id(2));
        graph.drive(id(2), id(3));
        graph.drive(id(3), id(1));
        graph.drive(id(3), id(4));

        let condensation = graph.condense().unwrap();
        assert_eq!(condensation.sccs, vec![vec![id(1), id(2), id(3)], vec![id(4)]]);
        assert_eq!(condensation.layers, vec![0, 1]);
    }

    #[test]
    fn test_self_loop_is_single_scc() {
        let mut graph = LinkGraph::new();
        graph.drive(id(1), id(1));
        let condensation = graph.condense().unwrap();
        assert_eq!(condensation.sccs, vec![vec![id(1)]]);
        assert_eq!(condensation.layers, vec![0]);
    }

    #[test]
    fn test_layer_is_longest_path() {
        let mut graph = LinkGraph::new();
        graph.drive(id(1), id(2));
        graph.drive(id(2), id(3));
        graph.drive(id(1), id(3));

        let condensation = graph.condense().unwrap();
        assert_eq!(condensation.layer_of(id(3)), Some(2));
        assert_eq!(graph.drivers(id(3)), vec![id(1), id(2)]);
    }

    #[test]
    fn test_empty_graph() {
        let graph = LinkGraph::new();
        assert!(graph.weak_components().is_empty());
        let condensation = graph.condense().unwrap();
        assert!(condensation.sccs.is_empty());
    }
}
