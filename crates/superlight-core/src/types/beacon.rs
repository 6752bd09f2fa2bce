use bitvec::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::hex_serde;

/// Number of validators in the Ethereum beacon chain sync committee.
pub const SYNC_COMMITTEE_SIZE: usize = 512;

/// Number of bytes in a BLS12-381 public key (compressed).
pub const BLS_PUBKEY_LEN: usize = 48;

/// Number of bytes in a BLS12-381 signature (compressed).
pub const BLS_SIGNATURE_LEN: usize = 96;

/// Slots per sync committee period (256 epochs * 32 slots/epoch = 8192).
pub const SLOTS_PER_SYNC_COMMITTEE_PERIOD: u64 = 8192;

/// Domain type for sync committee signatures.
pub const DOMAIN_SYNC_COMMITTEE: [u8; 4] = [0x07, 0x00, 0x00, 0x00];

/// DST (domain separation tag) for Ethereum BLS signatures.
pub const BLS_DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// A BLS12-381 public key (48 bytes, compressed G1 point).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlsPublicKey(pub [u8; BLS_PUBKEY_LEN]);

impl Serialize for BlsPublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        hex_serde::array::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for BlsPublicKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = hex_serde::bytes::deserialize(deserializer)?;
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

impl BlsPublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
        <[u8; BLS_PUBKEY_LEN]>::try_from(bytes)
            .map(Self)
            .map_err(|_| "Invalid BLS public key length")
    }
}

/// A BLS12-381 signature (96 bytes, compressed G2 point).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlsSignature(pub [u8; BLS_SIGNATURE_LEN]);

impl Serialize for BlsSignature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        hex_serde::array::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for BlsSignature {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = hex_serde::bytes::deserialize(deserializer)?;
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

impl BlsSignature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
        <[u8; BLS_SIGNATURE_LEN]>::try_from(bytes)
            .map(Self)
            .map_err(|_| "Invalid BLS signature length")
    }
}

/// A beacon chain block header.
/// The all-zero header stands for "absent" in a finalized-header slot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconBlockHeader {
    /// Slot number of this block.
    pub slot: u64,
    /// Index of the validator who proposed this block.
    pub proposer_index: u64,
    /// Root hash of the parent beacon block.
    #[serde(with = "hex_serde::array")]
    pub parent_root: [u8; 32],
    /// Root hash of the beacon state after processing this block.
    #[serde(with = "hex_serde::array")]
    pub state_root: [u8; 32],
    /// Root hash of the block body.
    #[serde(with = "hex_serde::array")]
    pub body_root: [u8; 32],
}

impl BeaconBlockHeader {
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// The sync committee: the validators that sign off on the chain head for
/// one period.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCommittee {
    /// BLS public keys of committee members, in committee order.
    pub pubkeys: Vec<BlsPublicKey>,
    /// Aggregated public key for fast signature verification.
    pub aggregate_pubkey: BlsPublicKey,
}

/// The aggregate BLS signature from the sync committee.
/// Contains a bitvector indicating which committee members signed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncAggregate {
    /// Bit `i` (LSB-first within each byte) is set when member `i` signed.
    #[serde(with = "hex_serde::bytes")]
    pub sync_committee_bits: Vec<u8>,
    /// The aggregated BLS signature from all participating members.
    pub sync_committee_signature: BlsSignature,
}

impl SyncAggregate {
    fn bits(&self) -> &BitSlice<u8, Lsb0> {
        self.sync_committee_bits.view_bits::<Lsb0>()
    }

    /// Count how many sync committee members participated (set bits).
    pub fn num_participants(&self) -> usize {
        self.bits().count_ones()
    }

    /// Check if a specific committee member (by index) participated.
    pub fn has_participant(&self, index: usize) -> bool {
        self.bits().get(index).map(|bit| *bit).unwrap_or(false)
    }

    /// Get the indices of all participating committee members.
    pub fn participant_indices(&self) -> Vec<usize> {
        (0..self.bits().len())
            .filter(|&index| self.has_participant(index))
            .collect()
    }
}

/// A light client update: the signed proof that carries the next period's
/// committee. Every field must be verified before the committee is trusted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightClientUpdate {
    /// The header that the sync committee is attesting to.
    pub attested_header: BeaconBlockHeader,
    /// The next sync committee (present on committee rotations).
    pub next_sync_committee: Option<SyncCommittee>,
    /// Merkle branch proving next_sync_committee against the attested state.
    #[serde(with = "hex_serde::array_vec")]
    pub next_sync_committee_branch: Vec<[u8; 32]>,
    /// The latest finalized header that this update references.
    pub finalized_header: BeaconBlockHeader,
    /// Merkle branch proving finalized_header against the attested state.
    #[serde(with = "hex_serde::array_vec")]
    pub finality_branch: Vec<[u8; 32]>,
    /// The aggregate signature from the sync committee.
    pub sync_aggregate: SyncAggregate,
    /// The slot at which the signature was produced.
    pub signature_slot: u64,
}

/// A light client bootstrap: the trusted genesis snapshot a client starts from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightClientBootstrap {
    /// The beacon block header at the checkpoint.
    pub header: BeaconBlockHeader,
    /// The current sync committee at the checkpoint.
    pub current_sync_committee: SyncCommittee,
    /// Merkle branch proving current_sync_committee against the beacon state.
    /// May be empty when the snapshot is taken on trust.
    #[serde(default, with = "hex_serde::array_vec")]
    pub current_sync_committee_branch: Vec<[u8; 32]>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_aggregate_participation() {
        let mut bits = vec![0u8; 64]; // 512 bits
        bits[0] = 0b11111111; // First 8 members participated
        bits[1] = 0b00000001; // 9th member

        let aggregate = SyncAggregate {
            sync_committee_bits: bits,
            sync_committee_signature: BlsSignature([0u8; 96]),
        };

        assert_eq!(aggregate.num_participants(), 9);
        assert!(aggregate.has_participant(0));
        assert!(aggregate.has_participant(7));
        assert!(aggregate.has_participant(8));
        assert!(!aggregate.has_participant(9));
        assert!(!aggregate.has_participant(512));
        assert_eq!(aggregate.participant_indices(), (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn test_pubkey_hex_serde() {
        let pk = BlsPublicKey([0xab; 48]);
        let json = serde_json::to_string(&pk).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "ab".repeat(48)));

        // Prefix is optional on input
        let unprefixed = format!("\"{}\"", "ab".repeat(48));
        assert_eq!(serde_json::from_str::<BlsPublicKey>(&unprefixed).unwrap(), pk);

        let short = format!("\"0x{}\"", "ab".repeat(47));
        assert!(serde_json::from_str::<BlsPublicKey>(&short).is_err());

        // Length errors surface through serde
        let err = serde_json::from_str::<BlsSignature>(&short).unwrap_err();
        assert!(err.to_string().contains("Invalid BLS signature length"));
        let sig = BlsSignature([0x5a; 96]);
        let json = serde_json::to_string(&sig).unwrap();
        assert_eq!(serde_json::from_str::<BlsSignature>(&json).unwrap(), sig);
    }

    #[test]
    fn test_pubkey_from_bytes_length() {
        assert!(BlsPublicKey::from_bytes(&[0u8; 48]).is_ok());
        assert!(BlsPublicKey::from_bytes(&[0u8; 47]).is_err());
        assert!(BlsSignature::from_bytes(&[0u8; 96]).is_ok());
        assert!(BlsSignature::from_bytes(&[0u8; 95]).is_err());
    }

    #[test]
    fn test_zero_header() {
        assert!(BeaconBlockHeader::default().is_zero());
        let header = BeaconBlockHeader {
            slot: 1,
            ..Default::default()
        };
        assert!(!header.is_zero());
    }

    #[test]
    fn test_bootstrap_branch_defaults_to_empty() {
        let json = serde_json::json!({
            "header": {
                "slot": 8192,
                "proposer_index": 3,
                "parent_root": format!("0x{}", "00".repeat(32)),
                "state_root": format!("0x{}", "11".repeat(32)),
                "body_root": format!("0x{}", "22".repeat(32)),
            },
            "current_sync_committee": {
                "pubkeys": [format!("0x{}", "aa".repeat(48))],
                "aggregate_pubkey": format!("0x{}", "aa".repeat(48)),
            },
        });
        let bootstrap: LightClientBootstrap = serde_json::from_value(json).unwrap();
        assert_eq!(bootstrap.header.state_root, [0x11; 32]);
        assert!(bootstrap.current_sync_committee_branch.is_empty());
    }
}
