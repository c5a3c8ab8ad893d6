use alloy::primitives::B256;
use serde::{Deserialize, Serialize};

use crate::crypto::hash::sha256_to_field_pair;

/// Membership witness for a leaf in a message tree: the leaf's index plus
/// the sibling hashes from leaf to root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipWitness {
    pub leaf_index: u64,
    pub path: Vec<B256>,
}

/// Append-only binary Merkle tree over message hashes.
///
/// Leaves are padded to the next power of two with zero leaves; node hashes
/// use the field-safe digest, so roots are valid rollup field elements. The
/// tree retains its leaves and recomputes levels on demand; message trees
/// here hold a handful of leaves per block.
#[derive(Debug, Clone, Default)]
pub struct MessageTree {
    leaves: Vec<B256>,
}

impl MessageTree {
    pub fn new() -> Self {
        Self { leaves: Vec::new() }
    }

    /// Append a leaf, returning its index.
    pub fn insert(&mut self, leaf: B256) -> u64 {
        self.leaves.push(leaf);
        (self.leaves.len() - 1) as u64
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn leaves(&self) -> &[B256] {
        &self.leaves
    }

    fn padded_leaves(&self) -> Vec<B256> {
        let mut level = self.leaves.clone();
        let width = self.leaves.len().next_power_of_two().max(1);
        level.resize(width, B256::ZERO);
        level
    }

    /// Current root. The empty tree's root is the zero element.
    pub fn root(&self) -> B256 {
        if self.leaves.is_empty() {
            return B256::ZERO;
        }
        let mut level = self.padded_leaves();
        while level.len() > 1 {
            level = level
                .chunks(2)
                .map(|pair| sha256_to_field_pair(pair[0], pair[1]))
                .collect();
        }
        level[0]
    }

    /// Membership witness for the leaf at `leaf_index`, or `None` if out of
    /// range.
    pub fn witness(&self, leaf_index: u64) -> Option<MembershipWitness> {
        let mut index = leaf_index as usize;
        if index >= self.leaves.len() {
            return None;
        }
        let mut level = self.padded_leaves();
        let mut path = Vec::new();
        while level.len() > 1 {
            path.push(level[index ^ 1]);
            level = level
                .chunks(2)
                .map(|pair| sha256_to_field_pair(pair[0], pair[1]))
                .collect();
            index /= 2;
        }
        Some(MembershipWitness {
            leaf_index,
            path,
        })
    }
}

/// Verify that `leaf` sits at `witness.leaf_index` under `root`.
pub fn verify_membership(leaf: B256, witness: &MembershipWitness, root: B256) -> bool {
    let mut node = leaf;
    let mut index = witness.leaf_index;
    for sibling in &witness.path {
        node = if index & 1 == 0 {
            sha256_to_field_pair(node, *sibling)
        } else {
            sha256_to_field_pair(*sibling, node)
        };
        index >>= 1;
    }
    node == root
}
