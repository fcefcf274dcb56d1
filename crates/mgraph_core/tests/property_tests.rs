//! Property-based tests using proptest

use mgraph_core::{FaultSet, MatchingGraph};
use proptest::prelude::*;

/// Random graph: node count plus edges with small fault sets and weights,
/// including self-loops and parallel edges.
fn arb_graph() -> impl Strategy<Value = (usize, Vec<(usize, usize, Vec<usize>, f64)>)> {
    (1usize..12).prop_flat_map(|n| {
        let edge = (
            0..n,
            0..n,
            prop::collection::vec(0usize..20, 0..3),
            0.0f64..10.0,
        );
        (Just(n), prop::collection::vec(edge, 0..30))
    })
}

fn build(n: usize, edges: &[(usize, usize, Vec<usize>, f64)]) -> MatchingGraph {
    let mut graph = MatchingGraph::new(n, []).unwrap();
    for (u, v, faults, w) in edges {
        graph.add_edge(*u, *v, faults.iter().copied(), *w).unwrap();
    }
    graph.compute_all_pairs_shortest_paths();
    graph
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_distance_symmetric_and_zero_diagonal((n, edges) in arb_graph()) {
        let graph = build(n, &edges);
        for s in 0..n {
            prop_assert_eq!(graph.distance(s, s).unwrap(), 0.0);
            prop_assert_eq!(graph.shortest_path(s, s).unwrap(), vec![s]);
            for t in 0..n {
                let st = graph.distance(s, t).unwrap();
                let ts = graph.distance(t, s).unwrap();
                prop_assert!(st == ts || (st.is_infinite() && ts.is_infinite()));
            }
        }
    }

    #[test]
    fn test_path_weight_matches_distance((n, edges) in arb_graph()) {
        let graph = build(n, &edges);
        for s in 0..n {
            for t in 0..n {
                let d = graph.distance(s, t).unwrap();
                if d.is_infinite() {
                    prop_assert!(graph.shortest_path(s, t).is_err());
                    continue;
                }
                let path = graph.shortest_path(s, t).unwrap();
                prop_assert_eq!(path[0], s);
                prop_assert_eq!(*path.last().unwrap(), t);
                let w = graph.path_weight(&path).unwrap();
                prop_assert!((w - d).abs() < 1e-9, "path weight {} != distance {}", w, d);

                let mut reversed = graph.shortest_path(t, s).unwrap();
                reversed.reverse();
                prop_assert_eq!(reversed, path);
            }
        }
    }

    #[test]
    fn test_fault_ids_are_union_over_path_edges((n, edges) in arb_graph()) {
        let graph = build(n, &edges);
        for s in 0..n {
            for t in 0..n {
                let Ok(path) = graph.shortest_path(s, t) else { continue };
                let mut expected = FaultSet::new();
                for pair in path.windows(2) {
                    expected.extend(graph.fault_ids_of_edge(pair[0], pair[1]).unwrap());
                }
                prop_assert_eq!(graph.fault_ids(s, t).unwrap(), expected);
            }
        }
    }

    #[test]
    fn test_finite_distance_implies_same_component((n, edges) in arb_graph()) {
        let graph = build(n, &edges);
        let labels = graph.component_labels();
        let num_labels = labels.iter().copied().max().map_or(0, |m| m + 1);
        prop_assert_eq!(num_labels, graph.num_connected_components());
        for s in 0..n {
            for t in 0..n {
                let finite = graph.distance(s, t).unwrap().is_finite();
                prop_assert_eq!(finite, graph.connected(s, t).unwrap());
            }
        }
    }

    #[test]
    fn test_recompute_idempotent((n, edges) in arb_graph()) {
        let mut graph = build(n, &edges);
        let snapshot = |g: &MatchingGraph| {
            (0..n)
                .flat_map(|s| (0..n).map(move |t| (s, t)))
                .map(|(s, t)| (g.distance(s, t).unwrap().to_bits(), g.shortest_path(s, t).ok()))
                .collect::<Vec<_>>()
        };
        let first = snapshot(&graph);
        graph.compute_all_pairs_shortest_paths();
        prop_assert_eq!(first, snapshot(&graph));
    }

    #[test]
    fn test_insertion_order_does_not_change_components((n, edges) in arb_graph()) {
        let forward = build(n, &edges);
        let mut reversed_edges = edges.clone();
        reversed_edges.reverse();
        let backward = build(n, &reversed_edges);
        prop_assert_eq!(forward.num_connected_components(), backward.num_connected_components());
        prop_assert_eq!(forward.component_labels(), backward.component_labels());
    }
}
