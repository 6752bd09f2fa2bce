//! Small byte helpers shared by the tree and the stores.

use crate::types::beacon::BlsPublicKey;

/// Concatenate byte slices in order.
pub fn concat_bytes<T: AsRef<[u8]>>(parts: &[T]) -> Vec<u8> {
    let len = parts.iter().map(|p| p.as_ref().len()).sum();
    let mut out = Vec::with_capacity(len);
    for part in parts {
        out.extend_from_slice(part.as_ref());
    }
    out
}

/// Byte-wise equality of two fixed-length arrays.
pub fn bytes_equal<const N: usize>(a: &[u8; N], b: &[u8; N]) -> bool {
    a[..] == b[..]
}

/// Positional comparison of two committees.
/// Committees of different sizes are never equal.
pub fn committees_equal(a: &[BlsPublicKey], b: &[BlsPublicKey]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| bytes_equal(&x.0, &y.0))
}

/// First 8 hex characters of `bytes`, for log fields.
pub fn short_hex(bytes: &[u8]) -> String {
    let mut s = hex::encode(bytes);
    s.truncate(8);
    s
}
