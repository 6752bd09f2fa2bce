//! Hash functions used for commitments and SSZ roots.
//!
//! Any `Fn(&[u8]) -> [u8; 32]` can drive a [`MerkleTree`](crate::merkle::MerkleTree);
//! SSZ roots are always SHA-256.

use sha2::{Digest, Sha256};
use tiny_keccak::{Hasher, Keccak};

/// SHA256 hash of arbitrary data.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA256 hash of two 32-byte values concatenated.
pub fn sha256_pair(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(a);
    data[32..].copy_from_slice(b);
    sha256(&data)
}

/// Compute keccak256 hash of data.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}
