//! Property-based tests for the link graph algorithms.

use std::collections::BTreeSet;

use gridwire_ir::{ComponentId, LinkGraph};
use proptest::prelude::*;

/// Directed edges over components 1..=n, self loops included.
fn arb_edges() -> impl Strategy<Value = (u32, Vec<(u32, u32)>)> {
    (1_u32..=24).prop_flat_map(|n| {
        (
            Just(n),
            prop::collection::vec((1..=n, 1..=n), 0..=48),
        )
    })
}

fn build(n: u32, edges: &[(u32, u32)]) -> LinkGraph {
    let mut graph = LinkGraph::new();
    for i in 1..=n {
        graph.add_node(ComponentId(i));
    }
    for &(a, b) in edges {
        graph.drive(ComponentId(a), ComponentId(b));
    }
    graph
}

proptest! {
    /// Weak components partition the node set and no edge crosses them.
    #[test]
    fn test_weak_components_partition((n, edges) in arb_edges()) {
        let graph = build(n, &edges);
        let components = graph.weak_components();

        let mut seen = BTreeSet::new();
        for members in &components {
            for id in members {
                prop_assert!(seen.insert(*id), "{} in two components", id);
            }
        }
        prop_assert_eq!(seen.len(), n as usize);

        for &(a, b) in &edges {
            let ca = components.iter().position(|m| m.contains(&ComponentId(a)));
            let cb = components.iter().position(|m| m.contains(&ComponentId(b)));
            prop_assert_eq!(ca, cb);
        }
    }

    /// Every driving edge between distinct SCCs goes to a strictly higher layer,
    /// and edges inside an SCC stay in one layer.
    #[test]
    fn test_condensation_layers_respect_edges((n, edges) in arb_edges()) {
        let graph = build(n, &edges);
        let condensation = graph.condense().expect("condensation is a DAG");

        let total: usize = condensation.sccs.iter().map(Vec::len).sum();
        prop_assert_eq!(total, n as usize);

        for &(a, b) in &edges {
            let la = condensation.layer_of(ComponentId(a)).unwrap();
            let lb = condensation.layer_of(ComponentId(b)).unwrap();
            let same_scc = condensation
                .sccs
                .iter()
                .any(|scc| scc.contains(&ComponentId(a)) && scc.contains(&ComponentId(b)));
            if same_scc {
                prop_assert_eq!(la, lb);
            } else {
                prop_assert!(la < lb, "edge {}->{} goes from layer {} to {}", a, b, la, lb);
            }
        }
    }
}
