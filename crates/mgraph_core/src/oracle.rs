use crate::{FaultSet, NodeId, Result};
use alloc::vec;
use alloc::vec::Vec;

/// Query surface a matching solver needs from a preprocessed graph.
///
/// A minimum-weight perfect matching solver pairs up triggered nodes (or
/// pairs them with the boundary) using shortest-path distances, then maps
/// each chosen pair back to the faults it implies. Implementations must
/// answer every query from state computed before the query began.
pub trait MatchingOracle {
    fn num_nodes(&self) -> usize;

    fn is_boundary(&self, node: NodeId) -> bool;

    fn distance(&self, s: NodeId, t: NodeId) -> Result<f64>;

    fn shortest_path(&self, s: NodeId, t: NodeId) -> Result<Vec<NodeId>>;

    fn fault_ids(&self, s: NodeId, t: NodeId) -> Result<FaultSet>;

    /// Dense row-major matrix of pairwise distances among `nodes`.
    ///
    /// Entry `i * nodes.len() + j` is the distance between `nodes[i]` and
    /// `nodes[j]`. The matrix is symmetric with a zero diagonal. Every node
    /// is validated, including the diagonal, so a single-node list still
    /// reports out-of-range ids and a missing or stale table.
    fn distance_matrix(&self, nodes: &[NodeId]) -> Result<Vec<f64>> {
        let k = nodes.len();
        let mut matrix = vec![0.0; k * k];
        for (i, &node) in nodes.iter().enumerate() {
            matrix[i * k + i] = self.distance(node, node)?;
        }
        for i in 0..k {
            for j in (i + 1)..k {
                let d = self.distance(nodes[i], nodes[j])?;
                matrix[i * k + j] = d;
                matrix[j * k + i] = d;
            }
        }
        Ok(matrix)
    }
}
