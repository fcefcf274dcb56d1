//! Merged edge storage for the matching graph.
//!
//! Holds at most one edge per unordered node pair. Parallel insertions are
//! folded into the stored edge by [`merge`], and every insertion is also
//! registered with the connectivity tracker and bumps the store generation
//! so that derived shortest-path tables can detect staleness.

use crate::dsu::UnionFind;
use crate::{FaultSet, GraphError, NodeId, Result};
use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;

/// Undirected edge payload stored for one node pair.
///
/// Carries the weight used by shortest-path search together with the set of
/// fault identifiers the edge explains. The endpoints are the key under which
/// the edge is stored and are not repeated here.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    /// Non-negative weight of the edge.
    ///
    /// Typically the log-likelihood ratio `ln((1 - p) / p)` of the fault
    /// mechanism, so that lighter paths correspond to likelier error chains.
    pub weight: f64,

    /// Fault identifiers explained by this edge. May be empty.
    pub fault_ids: FaultSet,

    /// Optional independent probability that this edge flips.
    ///
    /// Only required for noise sampling. Shortest-path search ignores it.
    pub error_probability: Option<f64>,
}

impl Edge {
    pub fn new(weight: f64, fault_ids: FaultSet, error_probability: Option<f64>) -> Self {
        Self {
            weight,
            fault_ids,
            error_probability,
        }
    }
}

/// Merges an incoming parallel edge into the stored one.
///
/// The lighter edge governs: a strictly lighter incoming edge replaces the
/// stored edge entirely, and a strictly heavier one is discarded. When both
/// weights are equal the fault sets are unioned, and the stored error
/// probability is kept unless it is absent.
pub fn merge(existing: Edge, incoming: Edge) -> Edge {
    if incoming.weight < existing.weight {
        incoming
    } else if incoming.weight > existing.weight {
        existing
    } else {
        let mut fault_ids = existing.fault_ids;
        fault_ids.extend(incoming.fault_ids);
        Edge {
            weight: existing.weight,
            fault_ids,
            error_probability: existing.error_probability.or(incoming.error_probability),
        }
    }
}

/// Compressed sparse row adjacency exported for shortest-path search.
///
/// Each undirected edge appears once in the neighbour list of each endpoint.
/// Self-loops are omitted since they never shorten a path. Neighbour lists
/// are sorted by node id, which fixes the relaxation order of Dijkstra and
/// therefore its tie-breaking.
#[derive(Clone, Debug, Default)]
pub struct Adjacency {
    offsets: Vec<usize>,
    targets: Vec<u32>,
    weights: Vec<f64>,
}

impl Adjacency {
    pub fn num_nodes(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Iterates `(neighbour, weight)` pairs of node u in ascending neighbour order.
    #[inline]
    pub fn neighbours(&self, u: NodeId) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        let range = self.offsets[u]..self.offsets[u + 1];
        self.targets[range.clone()]
            .iter()
            .zip(&self.weights[range])
            .map(|(&v, &w)| (v as NodeId, w))
    }
}

/// Node set and merged edge map of a matching graph.
///
/// Edges are keyed by the canonical `(min, max)` endpoint pair in a
/// `BTreeMap`, which gives deterministic iteration order and at most one
/// stored edge per unordered pair.
#[derive(Clone, Debug)]
pub struct EdgeStore {
    num_nodes: usize,
    edges: BTreeMap<(NodeId, NodeId), Edge>,
    components: UnionFind,
    generation: u64,
}

impl EdgeStore {
    pub fn new(num_nodes: usize) -> Self {
        Self {
            num_nodes,
            edges: BTreeMap::new(),
            components: UnionFind::new(num_nodes),
            generation: 0,
        }
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Counts distinct fault identifiers across all stored edges.
    pub fn num_fault_ids(&self) -> usize {
        self.edges
            .values()
            .flat_map(|e| e.fault_ids.iter().copied())
            .collect::<FaultSet>()
            .len()
    }

    /// Mutation counter, bumped by every successful insertion.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn components(&self) -> &UnionFind {
        &self.components
    }

    #[inline]
    pub fn check_node(&self, node: NodeId) -> Result<()> {
        if node < self.num_nodes {
            Ok(())
        } else {
            Err(GraphError::NodeOutOfRange {
                node,
                num_nodes: self.num_nodes,
            })
        }
    }

    /// Inserts an edge between u and v, merging with any stored parallel edge.
    ///
    /// All arguments are validated before anything is modified, so a
    /// rejected insertion leaves the store exactly as it was.
    #[allow(clippy::collapsible_if)]
    pub fn insert(&mut self, u: NodeId, v: NodeId, edge: Edge) -> Result<()> {
        self.check_node(u)?;
        self.check_node(v)?;
        if !edge.weight.is_finite() || edge.weight < 0.0 {
            return Err(GraphError::NegativeWeight {
                weight: edge.weight,
            });
        }
        if let Some(p) = edge.error_probability {
            if !(0.0..=1.0).contains(&p) {
                return Err(GraphError::InvalidProbability { probability: p });
            }
        }

        let key = canonical(u, v);
        let merged = match self.edges.remove(&key) {
            Some(existing) => {
                tracing::trace!(
                    u = key.0,
                    v = key.1,
                    existing_weight = existing.weight,
                    incoming_weight = edge.weight,
                    "merging parallel edge"
                );
                merge(existing, edge)
            }
            None => edge,
        };
        self.edges.insert(key, merged);
        self.components.union(u, v);
        self.generation += 1;
        Ok(())
    }

    pub fn edge(&self, u: NodeId, v: NodeId) -> Option<&Edge> {
        self.edges.get(&canonical(u, v))
    }

    pub fn has_edge(&self, u: NodeId, v: NodeId) -> bool {
        self.edges.contains_key(&canonical(u, v))
    }

    pub fn fault_ids_of_edge(&self, u: NodeId, v: NodeId) -> Result<&FaultSet> {
        self.edge(u, v)
            .map(|e| &e.fault_ids)
            .ok_or(GraphError::NoSuchEdge { u, v })
    }

    /// Iterates stored edges as `(u, v, edge)` with `u <= v`, in key order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, &Edge)> + '_ {
        self.edges.iter().map(|(&(u, v), e)| (u, v, e))
    }

    pub fn all_edges_have_error_probabilities(&self) -> bool {
        self.edges.values().all(|e| e.error_probability.is_some())
    }

    /// Builds the compressed adjacency of the current edge set.
    pub fn adjacency(&self) -> Adjacency {
        let n = self.num_nodes;
        let mut degree = vec![0usize; n];
        for &(u, v) in self.edges.keys() {
            if u != v {
                degree[u] += 1;
                degree[v] += 1;
            }
        }

        let mut offsets = Vec::with_capacity(n + 1);
        offsets.push(0);
        for d in &degree {
            let last = offsets[offsets.len() - 1];
            offsets.push(last + d);
        }

        let total = offsets[n];
        let mut targets = vec![0u32; total];
        let mut weights = vec![0.0f64; total];
        let mut cursor = offsets[..n].to_vec();

        // Keys iterate in (min, max) order, so for every node the smaller
        // neighbours arrive first and each half arrives ascending.
        for (&(u, v), e) in &self.edges {
            if u == v {
                continue;
            }
            targets[cursor[u]] = v as u32;
            weights[cursor[u]] = e.weight;
            cursor[u] += 1;
            targets[cursor[v]] = u as u32;
            weights[cursor[v]] = e.weight;
            cursor[v] += 1;
        }

        Adjacency {
            offsets,
            targets,
            weights,
        }
    }
}

#[inline]
fn canonical(u: NodeId, v: NodeId) -> (NodeId, NodeId) {
    if u <= v { (u, v) } else { (v, u) }
}
