//! Path reconstruction over a computed shortest-path table.

use crate::edge_store::EdgeStore;
use crate::shortest_path::ShortestPathTable;
use crate::{FaultSet, GraphError, NodeId, Result};
use alloc::vec;
use alloc::vec::Vec;

/// Ordered node sequence from s to t inclusive.
///
/// Walks predecessors in the row of the smaller endpoint and orients the
/// result to start at s. Callers are responsible for bounds and freshness
/// checks.
pub fn shortest_path(table: &ShortestPathTable, s: NodeId, t: NodeId) -> Result<Vec<NodeId>> {
    if s == t {
        return Ok(vec![s]);
    }
    if table.distance(s, t).is_infinite() {
        return Err(GraphError::NoPath { from: s, to: t });
    }

    let (root, far) = if s <= t { (s, t) } else { (t, s) };
    let mut path = vec![far];
    let mut node = far;
    while node != root {
        node = table
            .predecessor(root, node)
            .ok_or(GraphError::NoPath { from: s, to: t })?;
        path.push(node);
    }

    // path runs far -> root
    if s == root {
        path.reverse();
    }
    Ok(path)
}

/// Union of the fault sets of every edge along `path`.
pub fn collect_fault_ids(store: &EdgeStore, path: &[NodeId]) -> Result<FaultSet> {
    let mut faults = FaultSet::new();
    for pair in path.windows(2) {
        faults.extend(store.fault_ids_of_edge(pair[0], pair[1])?.iter().copied());
    }
    Ok(faults)
}

/// Sum of edge weights along `path`.
pub fn path_weight(store: &EdgeStore, path: &[NodeId]) -> Result<f64> {
    path.windows(2).try_fold(0.0, |acc, pair| {
        store
            .edge(pair[0], pair[1])
            .map(|e| acc + e.weight)
            .ok_or(GraphError::NoSuchEdge {
                u: pair[0],
                v: pair[1],
            })
    })
}
