//! `0x`-prefixed hex encodings for byte fields.
//!
//! Output always carries the `0x` prefix; input accepts it optionally.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serializer};

fn encode(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn decode_vec(s: &str) -> Result<Vec<u8>, String> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s).map_err(|e| e.to_string())
}

pub(crate) fn decode_array<const N: usize>(s: &str) -> Result<[u8; N], String> {
    let bytes = decode_vec(s)?;
    <[u8; N]>::try_from(bytes.as_slice())
        .map_err(|_| format!("expected {} bytes, got {}", N, bytes.len()))
}

/// `[u8; N]` as one hex string.
pub mod array {
    use super::*;

    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[u8; N], D::Error> {
        let s = String::deserialize(deserializer)?;
        decode_array(&s).map_err(D::Error::custom)
    }
}

/// `Vec<u8>` as one hex string.
pub mod bytes {
    use super::*;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        decode_vec(&s).map_err(D::Error::custom)
    }
}

/// `Vec<[u8; N]>` as a list of hex strings (Merkle branches).
pub mod array_vec {
    use super::*;

    pub fn serialize<S: Serializer, const N: usize>(
        items: &[[u8; N]],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(items.iter().map(|b| encode(b)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<Vec<[u8; N]>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|s| decode_array(s).map_err(D::Error::custom))
            .collect()
    }
}

/// `Vec<Vec<[u8; N]>>` as nested lists of hex strings.
pub mod nested {
    use super::*;

    pub fn serialize<S: Serializer, const N: usize>(
        groups: &[Vec<[u8; N]>],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(
            groups
                .iter()
                .map(|group| group.iter().map(|b| encode(b)).collect::<Vec<_>>()),
        )
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<Vec<Vec<[u8; N]>>, D::Error> {
        Vec::<Vec<String>>::deserialize(deserializer)?
            .iter()
            .map(|group| {
                group
                    .iter()
                    .map(|s| decode_array(s).map_err(D::Error::custom))
                    .collect()
            })
            .collect()
    }
}
