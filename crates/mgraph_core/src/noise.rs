//! Independent edge-flip noise sampling.
//!
//! Samples an error pattern by flipping each edge with its recorded error
//! probability. The fault identifiers carried by flipped edges accumulate
//! by parity, and each flipped edge toggles both of its endpoints. Boundary
//! nodes never report a syndrome bit, so the resulting syndrome is exactly
//! what a decoder built on the same graph would be asked to explain.

use crate::bit_utils::NodeMask;
use crate::edge_store::EdgeStore;
use crate::{FaultSet, GraphError, NodeId, Result};
use alloc::vec::Vec;
use rand::Rng;

/// One sampled error pattern.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NoiseSample {
    /// Fault identifiers flipped an odd number of times.
    pub fault_flips: FaultSet,

    /// Non-boundary nodes toggled an odd number of times, ascending.
    pub syndrome: Vec<NodeId>,
}

/// Samples one error pattern from the edges of `store`.
///
/// # Arguments
///
/// * `store` - Edge set to sample from; every edge needs an error probability
/// * `boundary` - Nodes excluded from the reported syndrome
/// * `rng` - Random source supplied by the caller
///
/// # Returns
///
/// The sampled fault flips and syndrome, or `MissingErrorProbabilities` if
/// some edge has no probability.
pub fn sample<R: Rng + ?Sized>(
    store: &EdgeStore,
    boundary: &NodeMask,
    rng: &mut R,
) -> Result<NoiseSample> {
    if !store.all_edges_have_error_probabilities() {
        return Err(GraphError::MissingErrorProbabilities);
    }

    let mut fault_flips = FaultSet::new();
    let mut parity = NodeMask::new(store.num_nodes());

    for (u, v, edge) in store.edges() {
        let p = edge
            .error_probability
            .ok_or(GraphError::MissingErrorProbabilities)?;
        if !rng.gen_bool(p) {
            continue;
        }
        for &fault in &edge.fault_ids {
            if !fault_flips.remove(&fault) {
                fault_flips.insert(fault);
            }
        }
        parity.toggle(u);
        parity.toggle(v);
    }

    let syndrome = parity
        .iter_ones()
        .filter(|&node| !boundary.contains(node))
        .collect();

    Ok(NoiseSample {
        fault_flips,
        syndrome,
    })
}
