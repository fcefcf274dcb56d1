//! Matching graph representation for quantum error correction.
//!
//! Implements the graph structure a minimum-weight perfect matching decoder
//! queries. Nodes represent detectors (syndrome measurement points), edges
//! represent independent fault mechanisms annotated with the fault
//! identifiers they flip, and an optional boundary set marks virtual nodes
//! that absorb unpaired detection events. The graph is mutated only by edge
//! insertion; a single explicit preprocessing call then builds the dense
//! shortest-path table that all distance, path and fault queries read.

use crate::bit_utils::NodeMask;
use crate::edge_store::{Edge, EdgeStore};
use crate::noise::{self, NoiseSample};
use crate::oracle::MatchingOracle;
use crate::path;
use crate::shortest_path::{MAX_NODES, ShortestPathConfig, ShortestPathTable};
use crate::{FaultId, FaultSet, GraphError, NodeId, Result};
use alloc::vec::Vec;
use rand::Rng;

/// Matching graph with a lazily rebuilt all-pairs shortest-path table.
///
/// Follows a single-writer, many-reader discipline enforced by the borrow
/// checker: edge insertion and preprocessing take `&mut self`, while every
/// query takes `&self`. A preprocessed graph can therefore be shared across
/// worker threads (for example behind an `Arc`) for the read-heavy decoding
/// phase, and no query can ever race with a rebuild.
///
/// The shortest-path table is tagged with the edge-store generation it was
/// built from. Any edge insertion bumps the generation, after which queries
/// fail with [`GraphError::StaleOrMissingTable`] until the table is rebuilt.
#[derive(Clone, Debug)]
pub struct MatchingGraph {
    /// Merged edges, connectivity tracker and mutation generation.
    store: EdgeStore,

    /// Boundary membership, one bit per node.
    ///
    /// Boundary nodes are ordinary nodes for shortest-path purposes. They
    /// only affect noise sampling, where they never report syndrome bits,
    /// and the matching solver, which may leave them unpaired.
    boundary: NodeMask,

    /// Table from the most recent preprocessing call, if any.
    table: Option<ShortestPathTable>,

    /// Options applied to every preprocessing pass.
    config: ShortestPathConfig,
}

impl MatchingGraph {
    /// Creates an empty matching graph with default preprocessing options.
    ///
    /// # Arguments
    ///
    /// * `num_nodes` - Fixed number of nodes; valid ids are `0..num_nodes`
    /// * `boundary` - Nodes to mark as boundary (may be empty)
    ///
    /// # Returns
    ///
    /// The empty graph, `InvalidNodeCount` if the dense table could not be
    /// indexed for this many nodes, or `NodeOutOfRange` for a bad boundary id.
    pub fn new(num_nodes: usize, boundary: impl IntoIterator<Item = NodeId>) -> Result<Self> {
        Self::with_config(num_nodes, boundary, ShortestPathConfig::default())
    }

    /// Creates an empty matching graph with explicit preprocessing options.
    pub fn with_config(
        num_nodes: usize,
        boundary: impl IntoIterator<Item = NodeId>,
        config: ShortestPathConfig,
    ) -> Result<Self> {
        if num_nodes > MAX_NODES || num_nodes.checked_mul(num_nodes).is_none() {
            return Err(GraphError::InvalidNodeCount { num_nodes });
        }

        let mut graph = Self {
            store: EdgeStore::new(num_nodes),
            boundary: NodeMask::new(num_nodes),
            table: None,
            config,
        };
        graph.set_boundary(boundary)?;
        Ok(graph)
    }

    pub fn config(&self) -> &ShortestPathConfig {
        &self.config
    }

    /// Replaces the preprocessing options used by later rebuilds.
    pub fn set_config(&mut self, config: ShortestPathConfig) {
        self.config = config;
    }

    /// Adds an edge between nodes u and v.
    ///
    /// Records a fault mechanism connecting two detectors. If an edge
    /// between the same unordered pair already exists, the two are merged:
    /// the lighter edge wins outright, and equal weights union their fault
    /// sets. Self-loops are accepted and stored but never lie on a shortest
    /// path. The connectivity tracker is updated immediately and the current
    /// shortest-path table becomes stale.
    ///
    /// # Arguments
    ///
    /// * `u` - First node index
    /// * `v` - Second node index
    /// * `fault_ids` - Fault identifiers explained by the edge (may be empty)
    /// * `weight` - Non-negative edge weight
    ///
    /// # Returns
    ///
    /// Ok(()) on success, `NodeOutOfRange` for a bad endpoint, or
    /// `NegativeWeight` for a negative, infinite or NaN weight.
    pub fn add_edge(
        &mut self,
        u: NodeId,
        v: NodeId,
        fault_ids: impl IntoIterator<Item = FaultId>,
        weight: f64,
    ) -> Result<()> {
        let edge = Edge::new(weight, fault_ids.into_iter().collect(), None);
        self.store.insert(u, v, edge)
    }

    /// Adds an edge that also records its independent error probability.
    ///
    /// Behaves like [`add_edge`](Self::add_edge) and additionally stores
    /// `error_probability` for noise sampling. Fails with
    /// `InvalidProbability` if the probability lies outside `[0, 1]`.
    pub fn add_edge_with_probability(
        &mut self,
        u: NodeId,
        v: NodeId,
        fault_ids: impl IntoIterator<Item = FaultId>,
        weight: f64,
        error_probability: f64,
    ) -> Result<()> {
        let edge = Edge::new(
            weight,
            fault_ids.into_iter().collect(),
            Some(error_probability),
        );
        self.store.insert(u, v, edge)
    }

    /// Rebuilds the all-pairs shortest-path table from the current edges.
    ///
    /// Runs one Dijkstra pass per node (in parallel when enabled) and
    /// replaces any previous table as a whole. Repeated calls without an
    /// intervening insertion produce identical tables.
    pub fn compute_all_pairs_shortest_paths(&mut self) {
        let adjacency = self.store.adjacency();
        self.table = Some(ShortestPathTable::compute(
            &adjacency,
            self.store.generation(),
            &self.config,
        ));
    }

    /// Returns true if the table reflects every inserted edge.
    pub fn is_ready(&self) -> bool {
        self.table().is_ok()
    }

    /// Mutation generation of the edge set.
    pub fn generation(&self) -> u64 {
        self.store.generation()
    }

    fn table(&self) -> Result<&ShortestPathTable> {
        match &self.table {
            Some(table) if table.generation() == self.store.generation() => Ok(table),
            _ => Err(GraphError::StaleOrMissingTable),
        }
    }

    fn check_pair(&self, s: NodeId, t: NodeId) -> Result<()> {
        self.store.check_node(s)?;
        self.store.check_node(t)
    }

    /// Returns the shortest-path distance between s and t.
    ///
    /// A direct table lookup; unreachable pairs yield positive infinity and
    /// `distance(s, s)` is zero. A path sum that overflows `f64` saturates
    /// to infinity as well.
    ///
    /// # Arguments
    ///
    /// * `s` - Source node index
    /// * `t` - Target node index
    ///
    /// # Returns
    ///
    /// The distance, `NodeOutOfRange`, or `StaleOrMissingTable`.
    pub fn distance(&self, s: NodeId, t: NodeId) -> Result<f64> {
        self.check_pair(s, t)?;
        Ok(self.table()?.distance(s, t))
    }

    /// Returns the ordered node sequence of a shortest path from s to t.
    ///
    /// The sequence starts at s and ends at t. For s == t it is `[s]`. The
    /// path chosen among equal-weight alternatives is deterministic, and the
    /// path from t to s is always the reverse of this one.
    ///
    /// # Returns
    ///
    /// The path, `NodeOutOfRange`, `StaleOrMissingTable`, or `NoPath` if t
    /// is unreachable from s.
    pub fn shortest_path(&self, s: NodeId, t: NodeId) -> Result<Vec<NodeId>> {
        self.check_pair(s, t)?;
        path::shortest_path(self.table()?, s, t)
    }

    /// Returns the union of fault identifiers along the shortest path from s to t.
    ///
    /// Identifiers shared by several edges of the path appear once. For
    /// s == t the set is empty.
    pub fn fault_ids(&self, s: NodeId, t: NodeId) -> Result<FaultSet> {
        let path = self.shortest_path(s, t)?;
        path::collect_fault_ids(&self.store, &path)
    }

    /// Returns the fault identifiers stored on the direct edge between u and v.
    pub fn fault_ids_of_edge(&self, u: NodeId, v: NodeId) -> Result<&FaultSet> {
        self.check_pair(u, v)?;
        self.store.fault_ids_of_edge(u, v)
    }

    /// Sums stored edge weights along consecutive nodes of `path`.
    pub fn path_weight(&self, path: &[NodeId]) -> Result<f64> {
        path::path_weight(&self.store, path)
    }

    pub fn num_nodes(&self) -> usize {
        self.store.num_nodes()
    }

    pub fn num_edges(&self) -> usize {
        self.store.num_edges()
    }

    /// Number of distinct fault identifiers across all edges.
    pub fn num_fault_ids(&self) -> usize {
        self.store.num_fault_ids()
    }

    /// Number of connected components, counting isolated nodes.
    pub fn num_connected_components(&self) -> usize {
        self.store.components().num_components()
    }

    /// Returns true if u and v lie in the same connected component.
    ///
    /// Answered from the incrementally maintained union-find, so it needs no
    /// preprocessing and is always current.
    pub fn connected(&self, u: NodeId, v: NodeId) -> Result<bool> {
        self.check_pair(u, v)?;
        Ok(self.store.components().connected(u, v))
    }

    /// Dense component index per node, numbered by smallest member.
    pub fn component_labels(&self) -> Vec<usize> {
        self.store.components().component_labels()
    }

    pub fn has_edge(&self, u: NodeId, v: NodeId) -> bool {
        self.store.has_edge(u, v)
    }

    pub fn edge(&self, u: NodeId, v: NodeId) -> Option<&Edge> {
        self.store.edge(u, v)
    }

    /// Iterates merged edges as `(u, v, edge)` with `u <= v`.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, &Edge)> + '_ {
        self.store.edges()
    }

    /// Boundary nodes in ascending order.
    pub fn boundary(&self) -> Vec<NodeId> {
        self.boundary.iter_ones().collect()
    }

    pub fn is_boundary(&self, node: NodeId) -> bool {
        self.boundary.contains(node)
    }

    /// Replaces the boundary set.
    ///
    /// Every id is validated before the current set is touched. The
    /// shortest-path table stays valid, since boundary nodes are ordinary
    /// nodes for path search.
    pub fn set_boundary(&mut self, nodes: impl IntoIterator<Item = NodeId>) -> Result<()> {
        let mut boundary = NodeMask::new(self.num_nodes());
        for node in nodes {
            self.store.check_node(node)?;
            boundary.insert(node);
        }
        self.boundary = boundary;
        Ok(())
    }

    pub fn all_edges_have_error_probabilities(&self) -> bool {
        self.store.all_edges_have_error_probabilities()
    }

    /// Samples an error pattern by flipping each edge with its error probability.
    ///
    /// # Arguments
    ///
    /// * `rng` - Random source; seed it for reproducible samples
    ///
    /// # Returns
    ///
    /// The flipped fault identifiers (by parity) and the sorted non-boundary
    /// syndrome, or `MissingErrorProbabilities` if some edge lacks one.
    pub fn add_noise<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<NoiseSample> {
        noise::sample(&self.store, &self.boundary, rng)
    }
}

impl MatchingOracle for MatchingGraph {
    fn num_nodes(&self) -> usize {
        MatchingGraph::num_nodes(self)
    }

    fn is_boundary(&self, node: NodeId) -> bool {
        MatchingGraph::is_boundary(self, node)
    }

    fn distance(&self, s: NodeId, t: NodeId) -> Result<f64> {
        MatchingGraph::distance(self, s, t)
    }

    fn shortest_path(&self, s: NodeId, t: NodeId) -> Result<Vec<NodeId>> {
        MatchingGraph::shortest_path(self, s, t)
    }

    fn fault_ids(&self, s: NodeId, t: NodeId) -> Result<FaultSet> {
        MatchingGraph::fault_ids(self, s, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MatchingGraph {
        let mut graph = MatchingGraph::new(4, [3]).unwrap();
        graph.add_edge(0, 1, [0], 1.0).unwrap();
        graph.add_edge(1, 2, [1], 1.0).unwrap();
        graph.add_edge(0, 2, [2], 3.0).unwrap();
        graph
    }

    #[test]
    fn test_queries_before_preprocessing_fail() {
        let graph = triangle();
        assert!(!graph.is_ready());
        assert_eq!(graph.distance(0, 1), Err(GraphError::StaleOrMissingTable));
        assert_eq!(graph.shortest_path(0, 1), Err(GraphError::StaleOrMissingTable));
        assert_eq!(graph.fault_ids(0, 1), Err(GraphError::StaleOrMissingTable));
    }

    #[test]
    fn test_insertion_invalidates_table() {
        let mut graph = triangle();
        graph.compute_all_pairs_shortest_paths();
        assert!(graph.is_ready());
        assert_eq!(graph.distance(0, 2).unwrap(), 2.0);

        graph.add_edge(0, 2, [3], 0.5).unwrap();
        assert_eq!(graph.distance(0, 2), Err(GraphError::StaleOrMissingTable));

        graph.compute_all_pairs_shortest_paths();
        assert_eq!(graph.distance(0, 2).unwrap(), 0.5);
        assert_eq!(graph.fault_ids(0, 2).unwrap(), FaultSet::from([3]));
    }

    #[test]
    fn test_failed_insertion_keeps_table_fresh() {
        let mut graph = triangle();
        graph.compute_all_pairs_shortest_paths();
        assert!(graph.add_edge(0, 9, [], 1.0).is_err());
        assert!(graph.add_edge(0, 1, [], -2.0).is_err());
        assert!(graph.is_ready());
    }

    #[test]
    fn test_bounds_checked_before_freshness() {
        let graph = triangle();
        assert_eq!(
            graph.distance(0, 4),
            Err(GraphError::NodeOutOfRange { node: 4, num_nodes: 4 })
        );
        assert!(matches!(
            graph.fault_ids_of_edge(7, 0),
            Err(GraphError::NodeOutOfRange { node: 7, .. })
        ));
    }

    #[test]
    fn test_boundary_accessors() {
        let mut graph = triangle();
        graph.compute_all_pairs_shortest_paths();
        assert_eq!(graph.boundary(), vec![3]);
        assert!(graph.is_boundary(3));
        assert!(!graph.is_boundary(0));

        graph.set_boundary([0, 2]).unwrap();
        assert_eq!(graph.boundary(), vec![0, 2]);
        assert!(graph.is_ready());

        assert!(graph.set_boundary([1, 4]).is_err());
        assert_eq!(graph.boundary(), vec![0, 2]);
    }

    #[test]
    fn test_invalid_construction() {
        assert!(matches!(
            MatchingGraph::new(3, [3]),
            Err(GraphError::NodeOutOfRange { node: 3, num_nodes: 3 })
        ));
        assert_eq!(
            MatchingGraph::new(usize::MAX, []).map(|_| ()),
            Err(GraphError::InvalidNodeCount { num_nodes: usize::MAX })
        );
    }

    #[test]
    fn test_connectivity_without_preprocessing() {
        let graph = triangle();
        assert_eq!(graph.num_connected_components(), 2);
        assert!(graph.connected(0, 2).unwrap());
        assert!(!graph.connected(0, 3).unwrap());
        assert_eq!(graph.component_labels(), vec![0, 0, 0, 1]);
    }

    #[test]
    fn test_distance_matrix_validates_single_node() {
        let mut graph = triangle();
        assert_eq!(
            graph.distance_matrix(&[0]),
            Err(GraphError::StaleOrMissingTable)
        );
        assert_eq!(
            graph.distance_matrix(&[99]),
            Err(GraphError::NodeOutOfRange { node: 99, num_nodes: 4 })
        );

        graph.compute_all_pairs_shortest_paths();
        assert_eq!(
            graph.distance_matrix(&[99]),
            Err(GraphError::NodeOutOfRange { node: 99, num_nodes: 4 })
        );
        assert_eq!(graph.distance_matrix(&[2]), Ok(vec![0.0]));
        assert_eq!(graph.distance_matrix(&[]), Ok(vec![]));
    }

    #[test]
    fn test_oracle_distance_matrix() {
        let mut graph = triangle();
        graph.compute_all_pairs_shortest_paths();
        let matrix = graph.distance_matrix(&[0, 2, 3]).unwrap();
        assert_eq!(matrix[1], 2.0);
        assert_eq!(matrix[3], 2.0);
        assert!(matrix[2].is_infinite());
        assert_eq!(matrix[4], 0.0);
    }
}
