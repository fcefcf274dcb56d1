//! Disjoint Set Union (DSU) data structure with component counting.
//!
//! Implements a union-find data structure that maintains the connected
//! components of the matching graph as edges are inserted. Parent and rank
//! values live in flat arrays indexed by node id, so the structure can be
//! cloned or snapshotted without any pointer fix-up. The component count is
//! maintained online and never recomputed in bulk.

use alloc::vec;
use alloc::vec::Vec;

/// Union-Find data structure tracking connected components of the graph.
///
/// Manages a collection of disjoint sets where each set is one connected
/// component of the matching graph. Uses path halving and union-by-rank
/// optimizations for amortized near-constant-time operations. Self-unions
/// and repeated unions are no-ops, so the result is independent of edge
/// insertion order and multiplicity.
#[derive(Clone, Debug)]
pub struct UnionFind {
    /// `parent[i]` is the next node on the way to i's root; roots are
    /// self-parented. Rewritten by [`find`](Self::find) as it halves paths.
    parent: Vec<usize>,

    /// Upper bound on tree height, only meaningful at roots.
    ///
    /// A union hangs the shorter tree under the taller one, so heights grow
    /// logarithmically in component size.
    rank: Vec<u8>,

    /// Number of distinct roots in the forest.
    ///
    /// Starts at the node count and decreases by one on every union that
    /// merges two different sets.
    num_components: usize,
}

impl UnionFind {
    /// Initializes a union-find structure with `n` singleton sets.
    ///
    /// Sets all nodes to be their own parent and resets all ranks to zero.
    /// An empty structure (n = 0) has zero components.
    ///
    /// # Arguments
    ///
    /// * `n` - Number of nodes tracked by the structure
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
            num_components: n,
        }
    }

    /// Returns the number of disjoint components.
    pub fn num_components(&self) -> usize {
        self.num_components
    }

    /// Finds the root of the set containing node i, with path halving.
    ///
    /// Traverses the parent chain to locate the root, pointing every visited
    /// node at its grandparent along the way. This keeps trees shallow so
    /// that later finds for the same nodes are nearly O(1).
    ///
    /// # Returns
    ///
    /// The representative of i's component.
    #[inline(always)]
    pub fn find(&mut self, mut i: usize) -> usize {
        while i != self.parent[i] {
            let p = self.parent[i];
            let gp = self.parent[p];
            self.parent[i] = gp;
            i = p;
        }
        i
    }

    /// Finds the root of the set containing node i without modifying the forest.
    ///
    /// Read-only variant of [`find`](Self::find) for callers holding a
    /// shared reference.
    #[inline(always)]
    pub fn find_root(&self, mut i: usize) -> usize {
        while i != self.parent[i] {
            i = self.parent[i];
        }
        i
    }

    /// Merges the sets containing nodes i and j.
    ///
    /// If the nodes are in different sets, attaches the root of lower rank
    /// beneath the root of higher rank and decrements the component count.
    /// Equal ranks attach j's root beneath i's root and bump i's rank.
    ///
    /// # Returns
    ///
    /// Whether two distinct components were joined. Self-unions and unions
    /// inside one component return false and change nothing.
    pub fn union(&mut self, i: usize, j: usize) -> bool {
        let root_i = self.find(i);
        let root_j = self.find(j);

        if root_i == root_j {
            return false;
        }

        if self.rank[root_i] < self.rank[root_j] {
            self.parent[root_i] = root_j;
        } else {
            self.parent[root_j] = root_i;
            if self.rank[root_i] == self.rank[root_j] {
                self.rank[root_i] = self.rank[root_i].saturating_add(1);
            }
        }
        self.num_components -= 1;
        true
    }

    /// Returns true if nodes i and j lie in the same component.
    pub fn connected(&self, i: usize, j: usize) -> bool {
        self.find_root(i) == self.find_root(j)
    }

    /// Labels every node with a dense component index.
    ///
    /// Component indices are assigned 0, 1, 2, ... in order of the smallest
    /// node id in each component, so the labeling is deterministic for a
    /// given partition regardless of which node ended up as the root.
    ///
    /// # Returns
    ///
    /// A vector where `labels[i]` is the component index of node i.
    pub fn component_labels(&self) -> Vec<usize> {
        let n = self.parent.len();
        let mut root_label = vec![usize::MAX; n];
        let mut labels = Vec::with_capacity(n);
        let mut next = 0;

        for i in 0..n {
            let root = self.find_root(i);
            if root_label[root] == usize::MAX {
                root_label[root] = next;
                next += 1;
            }
            labels.push(root_label[root]);
        }
        labels
    }
}
