//! All-pairs shortest paths by repeated single-source Dijkstra.
//!
//! Edge weights are non-negative, so one Dijkstra pass per source gives
//! exact distances in O(V * E log V) total. Each pass writes only its own
//! row of the dense table, which lets the passes run independently on the
//! rayon pool. The finished table is tagged with the edge-store generation
//! it was built from, and queries compare that tag against the live
//! generation to detect staleness.

use crate::NodeId;
use crate::edge_store::Adjacency;
use alloc::collections::BinaryHeap;
use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;

/// Predecessor sentinel for sources and unreachable nodes.
pub const NO_PREDECESSOR: u32 = u32::MAX;

/// Largest node count the dense table can index.
///
/// Node ids must stay strictly below the predecessor sentinel.
pub const MAX_NODES: usize = NO_PREDECESSOR as usize;

/// Options for a preprocessing pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShortestPathConfig {
    /// Run per-source passes on the rayon pool.
    ///
    /// Ignored unless the crate is built with the `parallel` feature.
    pub parallel: bool,
}

impl Default for ShortestPathConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// Dense distance and predecessor table for every ordered node pair.
///
/// Row `s` holds the output of the Dijkstra pass rooted at `s`. Lookups for
/// a pair always read the row of the smaller endpoint, which makes every
/// query symmetric bit-for-bit and makes the path for `(t, s)` the exact
/// reverse of the path for `(s, t)`.
#[derive(Clone, Debug)]
pub struct ShortestPathTable {
    num_nodes: usize,
    generation: u64,
    distances: Vec<f64>,
    predecessors: Vec<u32>,
}

impl ShortestPathTable {
    /// Runs one Dijkstra pass per node and assembles the table.
    ///
    /// The result is a fresh value, so any previous table is replaced as a
    /// whole by the caller and readers never observe a partially written
    /// table.
    ///
    /// # Arguments
    ///
    /// * `adjacency` - Compressed adjacency of the edge set to search
    /// * `generation` - Edge-store generation the adjacency was built from
    /// * `config` - Preprocessing options
    pub fn compute(adjacency: &Adjacency, generation: u64, config: &ShortestPathConfig) -> Self {
        let n = adjacency.num_nodes();
        let mut distances = vec![f64::INFINITY; n * n];
        let mut predecessors = vec![NO_PREDECESSOR; n * n];

        tracing::debug!(
            num_nodes = n,
            generation,
            parallel = config.parallel,
            "computing all-pairs shortest paths"
        );

        if n > 0 {
            fill_rows(adjacency, config, &mut distances, &mut predecessors);
        }

        let table = Self {
            num_nodes: n,
            generation,
            distances,
            predecessors,
        };
        tracing::debug!(
            num_nodes = n,
            generation,
            reachable_pairs = table.num_reachable_pairs(),
            "all-pairs shortest paths ready"
        );
        table
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Edge-store generation this table reflects.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    fn index(&self, row: NodeId, col: NodeId) -> usize {
        row * self.num_nodes + col
    }

    /// Shortest distance between s and t, or infinity if unreachable.
    ///
    /// Both nodes must be below `num_nodes`.
    #[inline]
    pub fn distance(&self, s: NodeId, t: NodeId) -> f64 {
        let (row, col) = if s <= t { (s, t) } else { (t, s) };
        self.distances[self.index(row, col)]
    }

    /// Predecessor of `node` on the shortest path rooted at `row`.
    #[inline]
    pub fn predecessor(&self, row: NodeId, node: NodeId) -> Option<NodeId> {
        match self.predecessors[self.index(row, node)] {
            NO_PREDECESSOR => None,
            p => Some(p as NodeId),
        }
    }

    /// Counts unordered pairs of distinct nodes with a finite distance.
    pub fn num_reachable_pairs(&self) -> usize {
        let n = self.num_nodes;
        (0..n)
            .map(|s| {
                self.distances[self.index(s, s + 1)..self.index(s, n)]
                    .iter()
                    .filter(|d| d.is_finite())
                    .count()
            })
            .sum()
    }
}

#[cfg(feature = "parallel")]
fn fill_rows(
    adjacency: &Adjacency,
    config: &ShortestPathConfig,
    distances: &mut [f64],
    predecessors: &mut [u32],
) {
    use rayon::prelude::*;

    let n = adjacency.num_nodes();
    if config.parallel {
        distances
            .par_chunks_mut(n)
            .zip(predecessors.par_chunks_mut(n))
            .enumerate()
            .for_each(|(source, (dist, pred))| dijkstra_into(adjacency, source, dist, pred));
    } else {
        fill_rows_sequential(adjacency, distances, predecessors);
    }
}

#[cfg(not(feature = "parallel"))]
fn fill_rows(
    adjacency: &Adjacency,
    _config: &ShortestPathConfig,
    distances: &mut [f64],
    predecessors: &mut [u32],
) {
    fill_rows_sequential(adjacency, distances, predecessors);
}

fn fill_rows_sequential(adjacency: &Adjacency, distances: &mut [f64], predecessors: &mut [u32]) {
    let n = adjacency.num_nodes();
    for (source, (dist, pred)) in distances
        .chunks_mut(n)
        .zip(predecessors.chunks_mut(n))
        .enumerate()
    {
        dijkstra_into(adjacency, source, dist, pred);
    }
}

/// Priority queue entry; ordered so the max-heap pops the nearest node first,
/// with ties going to the smaller node id.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    distance: f64,
    node: NodeId,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// Single-source Dijkstra writing one table row.
///
/// Predecessors are only replaced on a strict improvement. Combined with the
/// pop order and the ascending neighbour order of the adjacency, this makes
/// the chosen path among equal-weight alternatives deterministic.
fn dijkstra_into(adjacency: &Adjacency, source: NodeId, dist: &mut [f64], pred: &mut [u32]) {
    dist.fill(f64::INFINITY);
    pred.fill(NO_PREDECESSOR);
    dist[source] = 0.0;

    let mut heap = BinaryHeap::new();
    heap.push(Candidate {
        distance: 0.0,
        node: source,
    });

    while let Some(Candidate { distance, node }) = heap.pop() {
        if distance > dist[node] {
            continue;
        }
        for (next, weight) in adjacency.neighbours(node) {
            let candidate = distance + weight;
            if candidate < dist[next] {
                dist[next] = candidate;
                pred[next] = node as u32;
                heap.push(Candidate {
                    distance: candidate,
                    node: next,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge_store::{Edge, EdgeStore};
    use crate::FaultSet;

    fn dijkstra(adjacency: &Adjacency, source: NodeId) -> (Vec<f64>, Vec<u32>) {
        let n = adjacency.num_nodes();
        let mut dist = vec![f64::INFINITY; n];
        let mut pred = vec![NO_PREDECESSOR; n];
        dijkstra_into(adjacency, source, &mut dist, &mut pred);
        (dist, pred)
    }

    fn store(n: usize, edges: &[(usize, usize, f64)]) -> EdgeStore {
        let mut store = EdgeStore::new(n);
        for &(u, v, w) in edges {
            store.insert(u, v, Edge::new(w, FaultSet::new(), None)).unwrap();
        }
        store
    }

    #[test]
    fn test_dijkstra_line() {
        let s = store(4, &[(0, 1, 1.0), (1, 2, 2.0), (2, 3, 3.0)]);
        let (dist, pred) = dijkstra(&s.adjacency(), 0);
        assert_eq!(dist, vec![0.0, 1.0, 3.0, 6.0]);
        assert_eq!(pred, vec![NO_PREDECESSOR, 0, 1, 2]);
    }

    #[test]
    fn test_dijkstra_prefers_lighter_detour() {
        let s = store(3, &[(0, 2, 10.0), (0, 1, 1.0), (1, 2, 1.0)]);
        let (dist, pred) = dijkstra(&s.adjacency(), 0);
        assert_eq!(dist[2], 2.0);
        assert_eq!(pred[2], 1);
    }

    #[test]
    fn test_equal_weight_tie_goes_to_smaller_node() {
        // 0 -> 3 via 1 or via 2, both weight 2.
        let s = store(4, &[(0, 2, 1.0), (0, 1, 1.0), (2, 3, 1.0), (1, 3, 1.0)]);
        let (_, pred) = dijkstra(&s.adjacency(), 0);
        assert_eq!(pred[3], 1);
    }

    #[test]
    fn test_unreachable_is_infinite() {
        let s = store(3, &[(0, 1, 1.0)]);
        let table = ShortestPathTable::compute(&s.adjacency(), s.generation(), &Default::default());
        assert!(table.distance(0, 2).is_infinite());
        assert_eq!(table.predecessor(0, 2), None);
        assert_eq!(table.num_reachable_pairs(), 1);
    }

    #[test]
    fn test_zero_weight_edges() {
        let s = store(3, &[(0, 1, 0.0), (1, 2, 0.0)]);
        let table = ShortestPathTable::compute(&s.adjacency(), 0, &Default::default());
        assert_eq!(table.distance(0, 2), 0.0);
        assert_eq!(table.predecessor(0, 2), Some(1));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut edges = Vec::new();
        for i in 0..30usize {
            edges.push((i, (i * 7 + 3) % 30, 1.0 + (i % 5) as f64));
            edges.push((i, (i + 1) % 30, 2.5));
        }
        let s = store(30, &edges);
        let adj = s.adjacency();
        let par = ShortestPathTable::compute(&adj, 1, &ShortestPathConfig { parallel: true });
        let seq = ShortestPathTable::compute(&adj, 1, &ShortestPathConfig { parallel: false });
        assert_eq!(par.distances, seq.distances);
        assert_eq!(par.predecessors, seq.predecessors);
    }

    #[test]
    fn test_empty_graph() {
        let s = store(0, &[]);
        let table = ShortestPathTable::compute(&s.adjacency(), 0, &Default::default());
        assert_eq!(table.num_nodes(), 0);
        assert_eq!(table.num_reachable_pairs(), 0);
    }
}
