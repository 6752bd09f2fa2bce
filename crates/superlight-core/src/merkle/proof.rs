use serde::{Deserialize, Serialize};

use crate::merkle::tree::Hash;
use crate::types::hex_serde;

/// Inclusion proof for one leaf of an n-ary [`MerkleTree`](super::MerkleTree).
///
/// `levels[i]` holds the `n - 1` sibling hashes at height `i`, left to right.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    #[serde(with = "hex_serde::nested")]
    pub levels: Vec<Vec<Hash>>,
}

impl MerkleProof {
    pub fn verify<H>(
        &self,
        leaf: &Hash,
        index: usize,
        root: &Hash,
        hash_fn: H,
        branching: usize,
    ) -> bool
    where
        H: Fn(&[u8]) -> Hash,
    {
        merkle_verify(leaf, index, root, &self.levels, hash_fn, branching)
    }
}

/// Check that `leaf` sits at `index` under `root`.
///
/// Needs no tree: at each level the running hash is put back at position
/// `(index / n^i) % n` among that level's siblings and the group is hashed.
/// Every level is assembled in a fresh buffer; `proof` is only read.
///
/// Malformed proofs (wrong group size) and indices that do not fit in a tree
/// of `proof.len()` levels are rejected.
pub fn merkle_verify<H>(
    leaf: &Hash,
    index: usize,
    root: &Hash,
    proof: &[Vec<Hash>],
    hash_fn: H,
    branching: usize,
) -> bool
where
    H: Fn(&[u8]) -> Hash,
{
    if branching < 2 {
        return false;
    }
    let Ok(depth) = u32::try_from(proof.len()) else {
        return false;
    };
    // With overflow the tree is wider than any usize index
    if let Some(width) = branching.checked_pow(depth) {
        if index >= width {
            return false;
        }
    }

    if proof.iter().any(|siblings| siblings.len() != branching - 1) {
        return false;
    }

    let mut value = *leaf;
    let mut position = index;
    for siblings in proof {
        let slot = position % branching;

        // Sized from the group actually supplied, never from `branching`
        let mut buffer = Vec::with_capacity((siblings.len() + 1) * value.len());
        for sibling in &siblings[..slot] {
            buffer.extend_from_slice(sibling);
        }
        buffer.extend_from_slice(&value);
        for sibling in &siblings[slot..] {
            buffer.extend_from_slice(sibling);
        }

        value = hash_fn(&buffer);
        position /= branching;
    }

    value == *root
}
