//! Weighted matching-graph engine for quantum error correction decoders.
//!
//! This crate turns a sparse list of weighted, fault-annotated edges between
//! detector nodes into a dense all-pairs shortest-path table that a
//! minimum-weight perfect matching solver can query with low latency. It
//! covers edge ingestion and merging, incremental connectivity tracking,
//! per-source Dijkstra preprocessing, explicit path reconstruction, and
//! fault-identifier aggregation along paths. The crate builds without `std`
//! (with `alloc`) when the default features are disabled.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::collections::BTreeSet;

/// Packed bit masks over node indices.
///
/// Stores per-node flags (such as boundary membership or syndrome bits) as
/// u64 words, keeping membership tests branch-free and the memory footprint
/// at one bit per node.
pub mod bit_utils;

/// Disjoint set union (DSU) data structure for connectivity tracking.
///
/// Maintains the connected components of the matching graph online as edges
/// are inserted, using union-by-rank with path halving over a flat arena of
/// parent and rank values indexed by node id.
pub mod dsu;

/// Merged edge storage for the matching graph.
///
/// Owns the node count and the set of undirected edges, merging parallel
/// edges with a single pure merge function, and exports the compressed
/// adjacency used by the shortest-path engine.
pub mod edge_store;

/// Query facade over the matching graph.
///
/// Exposes edge insertion, preprocessing, and the distance, path, and
/// fault-identifier queries consumed by a matching solver. Validates node
/// bounds and table freshness on every call.
pub mod graph;

/// Random noise sampling over edges with error probabilities.
///
/// Flips each edge independently according to its error probability and
/// reports the resulting fault flips and detector syndrome, for generating
/// benchmark and test data from the same graph the decoder queries.
pub mod noise;

/// Interface consumed by an external matching solver.
///
/// Defines the minimal query surface a minimum-weight perfect matching
/// solver needs from a preprocessed graph, so solvers can be written against
/// the trait instead of the concrete graph type.
pub mod oracle;

/// Path reconstruction from predecessor tables.
///
/// Walks predecessor chains to produce explicit node sequences and collects
/// the union of fault identifiers along the traversed edges.
pub mod path;

/// All-pairs shortest-path computation.
///
/// Runs one Dijkstra pass per source node over the compressed adjacency and
/// stores the resulting distances and predecessors in a dense, generation
/// tagged table. Passes run on the rayon pool when the `parallel` feature is
/// enabled.
pub mod shortest_path;

pub use edge_store::{Edge, EdgeStore};
pub use graph::MatchingGraph;
pub use noise::NoiseSample;
pub use oracle::MatchingOracle;
pub use shortest_path::{ShortestPathConfig, ShortestPathTable};

/// Index of a node in the matching graph, in `[0, num_nodes)`.
pub type NodeId = usize;

/// Identifier of one elementary fault mechanism.
pub type FaultId = usize;

/// Unordered set of fault identifiers explained by an edge or a path.
pub type FaultSet = BTreeSet<FaultId>;

/// Result type returned by matching-graph operations.
pub type Result<T> = core::result::Result<T, GraphError>;

/// Error types returned by matching-graph operations.
///
/// Every error is reported by the call that triggers it and leaves the graph
/// unmodified, so the graph stays usable after any failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// The requested node count cannot be represented by the dense table.
    ///
    /// Predecessors are stored as u32 indices and the distance table holds
    /// `num_nodes * num_nodes` entries, so counts beyond either limit are
    /// rejected at construction time rather than at preprocessing time.
    #[error("invalid node count {num_nodes}")]
    InvalidNodeCount { num_nodes: usize },

    /// A node index exceeds the bounds of the graph.
    ///
    /// Indicates that an edge endpoint, boundary node, or query argument
    /// references a node that does not exist. Usually caused by a mismatch
    /// between the detector numbering of the caller and the node count the
    /// graph was built with.
    #[error("node {node} out of range for graph with {num_nodes} nodes")]
    NodeOutOfRange { node: NodeId, num_nodes: usize },

    /// An edge weight was negative, infinite or NaN.
    ///
    /// Dijkstra's algorithm requires non-negative weights, and infinity is
    /// reserved for unreachable pairs. The edge is not inserted and the graph
    /// is unchanged.
    #[error("edge weight {weight} is not a finite non-negative number")]
    NegativeWeight { weight: f64 },

    /// An edge error probability lies outside `[0, 1]`.
    #[error("error probability {probability} is outside [0, 1]")]
    InvalidProbability { probability: f64 },

    /// No direct edge exists between the two nodes.
    #[error("no edge between nodes {u} and {v}")]
    NoSuchEdge { u: NodeId, v: NodeId },

    /// The target is not reachable from the source.
    ///
    /// Only reported by path and fault-identifier queries. Distance queries
    /// return positive infinity for unreachable pairs instead.
    ///
    /// Path sums are plain `f64` additions. A path whose total weight
    /// overflows saturates to infinity and is reported exactly like an
    /// unreachable pair, even though [`MatchingGraph::connected`] holds.
    ///
    /// [`MatchingGraph::connected`]: crate::MatchingGraph::connected
    #[error("no path from node {from} to node {to}")]
    NoPath { from: NodeId, to: NodeId },

    /// The shortest-path table is missing or older than the edge set.
    ///
    /// Raised when a query runs before `compute_all_pairs_shortest_paths`
    /// has been called, or after an edge insertion has invalidated the
    /// previously computed table.
    #[error("shortest-path table is missing or stale; recompute before querying")]
    StaleOrMissingTable,

    /// Noise sampling requires an error probability on every edge.
    #[error("not every edge has an error probability")]
    MissingErrorProbabilities,
}
