use blst::min_pk::{AggregatePublicKey, PublicKey, Signature};
use blst::BLST_ERROR;
use thiserror::Error;

use crate::config::ChainConfig;
use crate::hashing::{sha256, sha256_pair};
use crate::merkle::merkleize_chunks;
use crate::types::beacon::*;

/// Generalized index of the finalized checkpoint root in the beacon state.
pub const FINALIZED_ROOT_GINDEX: u64 = 105;
pub const FINALIZED_ROOT_DEPTH: usize = 6;

/// Generalized index of the current sync committee in the beacon state.
pub const CURRENT_SYNC_COMMITTEE_GINDEX: u64 = 54;
pub const CURRENT_SYNC_COMMITTEE_DEPTH: usize = 5;

/// Generalized index of the next sync committee in the beacon state.
pub const NEXT_SYNC_COMMITTEE_GINDEX: u64 = 55;
pub const NEXT_SYNC_COMMITTEE_DEPTH: usize = 5;

/// Errors that can occur during sync committee update validation.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Sync committee has {got} members, expected {expected}")]
    CommitteeSizeMismatch { expected: usize, got: usize },

    #[error("Insufficient sync committee participation: {participants} (need at least {required})")]
    InsufficientParticipation {
        participants: usize,
        required: usize,
    },

    #[error("Invalid BLS signature: the aggregate signature does not verify against the participating committee members")]
    InvalidSignature,

    #[error("Invalid BLS public key at index {index}: {reason}")]
    InvalidPublicKey { index: usize, reason: String },

    #[error("Signature slot {signature_slot} is not after attested header slot {attested_slot}")]
    InvalidSlotOrder {
        signature_slot: u64,
        attested_slot: u64,
    },

    #[error("Attested header slot {attested_slot} is not after finalized header slot {finalized_slot}")]
    InvalidFinalityOrder {
        attested_slot: u64,
        finalized_slot: u64,
    },

    #[error("Invalid Merkle branch for finalized header: branch verification failed")]
    InvalidFinalityBranch,

    #[error("Update does not carry a next sync committee")]
    MissingNextSyncCommittee,

    #[error("Invalid Merkle branch for sync committee: branch verification failed")]
    InvalidSyncCommitteeBranch,

    #[error("Sync committee bits length mismatch: expected {expected} bytes, got {got}")]
    InvalidSyncCommitteeBitsLength { expected: usize, got: usize },

    #[error("BLS aggregation error: {0}")]
    BlsError(String),
}

/// Compute the signing root for a beacon block header: the header's
/// hash_tree_root mixed with the signing domain.
pub fn compute_signing_root(header: &BeaconBlockHeader, domain: &[u8; 32]) -> [u8; 32] {
    sha256_pair(&hash_beacon_block_header(header), domain)
}

/// Compute the domain for sync committee signing.
/// domain = domain_type + fork_data_root[:28]
pub fn compute_domain(
    domain_type: &[u8; 4],
    fork_version: &[u8; 4],
    genesis_validators_root: &[u8; 32],
) -> [u8; 32] {
    let fork_data_root = compute_fork_data_root(fork_version, genesis_validators_root);
    let mut domain = [0u8; 32];
    domain[..4].copy_from_slice(domain_type);
    domain[4..].copy_from_slice(&fork_data_root[..28]);
    domain
}

/// Compute the fork data root from fork version and genesis validators root.
fn compute_fork_data_root(
    fork_version: &[u8; 4],
    genesis_validators_root: &[u8; 32],
) -> [u8; 32] {
    // fork_version padded to a 32-byte chunk
    let mut version_leaf = [0u8; 32];
    version_leaf[..4].copy_from_slice(fork_version);
    sha256_pair(&version_leaf, genesis_validators_root)
}

/// SSZ hash_tree_root of a beacon block header (5 fields padded to 8 chunks).
pub fn hash_beacon_block_header(header: &BeaconBlockHeader) -> [u8; 32] {
    merkleize_chunks(&[
        uint64_to_leaf(header.slot),
        uint64_to_leaf(header.proposer_index),
        header.parent_root,
        header.state_root,
        header.body_root,
    ])
}

/// SSZ hash_tree_root of a `Bytes48` public key: two chunks, the second
/// zero-padded.
fn hash_pubkey(pubkey: &BlsPublicKey) -> [u8; 32] {
    let mut chunks = [0u8; 64];
    chunks[..BLS_PUBKEY_LEN].copy_from_slice(&pubkey.0);
    sha256(&chunks)
}

/// SSZ hash_tree_root of a sync committee:
/// `H(merkleize(pubkey roots) || root(aggregate_pubkey))`.
pub fn hash_sync_committee(committee: &SyncCommittee) -> [u8; 32] {
    let pubkey_roots: Vec<[u8; 32]> = committee.pubkeys.iter().map(hash_pubkey).collect();
    sha256_pair(
        &merkleize_chunks(&pubkey_roots),
        &hash_pubkey(&committee.aggregate_pubkey),
    )
}

/// Root implied by `leaf` and its SSZ branch. Only the low `branch.len()` bits
/// of `index` are used, so a generalized index works as-is.
pub fn merkle_root_from_branch(leaf: &[u8; 32], branch: &[[u8; 32]], index: u64) -> [u8; 32] {
    let mut current = *leaf;
    for (i, node) in branch.iter().enumerate() {
        if (index >> i) & 1 == 1 {
            current = sha256_pair(node, &current);
        } else {
            current = sha256_pair(&current, node);
        }
    }
    current
}

/// Verify a Merkle branch (SSZ proof) against an expected root.
pub fn verify_merkle_branch(
    leaf: &[u8; 32],
    branch: &[[u8; 32]],
    depth: usize,
    index: u64,
    root: &[u8; 32],
) -> bool {
    branch.len() == depth && merkle_root_from_branch(leaf, branch, index) == *root
}

/// A committee with its keys decompressed and summed, ready for signature checks.
#[derive(Clone)]
pub struct SyncCommitteeFast {
    pub pubkeys: Vec<PublicKey>,
    pub aggregate_pubkey: PublicKey,
}

/// Decompress every key of `committee` and compute their aggregate.
///
/// Keys are subgroup-checked; the infinity point is rejected.
pub fn deserialize_sync_committee(
    committee: &[BlsPublicKey],
) -> Result<SyncCommitteeFast, VerificationError> {
    let pubkeys = committee
        .iter()
        .enumerate()
        .map(|(index, pk)| {
            PublicKey::key_validate(&pk.0).map_err(|e| VerificationError::InvalidPublicKey {
                index,
                reason: format!("{:?}", e),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let aggregate_pubkey = aggregate_pubkeys(&pubkeys.iter().collect::<Vec<_>>())?;

    Ok(SyncCommitteeFast {
        pubkeys,
        aggregate_pubkey,
    })
}

fn aggregate_pubkeys(pubkeys: &[&PublicKey]) -> Result<PublicKey, VerificationError> {
    if pubkeys.is_empty() {
        return Err(VerificationError::BlsError(
            "cannot aggregate an empty set of public keys".into(),
        ));
    }
    AggregatePublicKey::aggregate(pubkeys, false)
        .map(|agg| agg.to_public_key())
        .map_err(|e| {
            VerificationError::BlsError(format!("Failed to aggregate public keys: {:?}", e))
        })
}

/// Validate a committee-rotation update against the committee of the period
/// it was signed in.
///
/// Checks, in order: committee size, participation bitvector length,
/// supermajority participation, slot ordering, the finality branch (when a
/// finalized header is present), the mandatory next-sync-committee branch, and
/// finally the aggregate BLS signature over the attested header's signing root.
pub fn assert_valid_light_client_update(
    config: &ChainConfig,
    committee: &SyncCommitteeFast,
    update: &LightClientUpdate,
) -> Result<(), VerificationError> {
    if committee.pubkeys.len() != config.sync_committee_size {
        return Err(VerificationError::CommitteeSizeMismatch {
            expected: config.sync_committee_size,
            got: committee.pubkeys.len(),
        });
    }

    let aggregate = &update.sync_aggregate;
    if aggregate.sync_committee_bits.len() != config.sync_committee_bits_len() {
        return Err(VerificationError::InvalidSyncCommitteeBitsLength {
            expected: config.sync_committee_bits_len(),
            got: aggregate.sync_committee_bits.len(),
        });
    }

    // Need a supermajority of the committee
    let num_participants = aggregate.num_participants();
    if num_participants < config.min_participants() {
        return Err(VerificationError::InsufficientParticipation {
            participants: num_participants,
            required: config.min_participants(),
        });
    }

    // Verify slot ordering: signature_slot > attested_header.slot >= finalized_header.slot
    if update.signature_slot <= update.attested_header.slot {
        return Err(VerificationError::InvalidSlotOrder {
            signature_slot: update.signature_slot,
            attested_slot: update.attested_header.slot,
        });
    }
    if update.attested_header.slot < update.finalized_header.slot {
        return Err(VerificationError::InvalidFinalityOrder {
            attested_slot: update.attested_header.slot,
            finalized_slot: update.finalized_header.slot,
        });
    }

    // No finalized header: the branch must carry nothing either
    if update.finalized_header.is_zero() {
        if update.finality_branch.iter().any(|node| *node != [0u8; 32]) {
            return Err(VerificationError::InvalidFinalityBranch);
        }
    } else if !verify_merkle_branch(
        &hash_beacon_block_header(&update.finalized_header),
        &update.finality_branch,
        FINALIZED_ROOT_DEPTH,
        FINALIZED_ROOT_GINDEX,
        &update.attested_header.state_root,
    ) {
        return Err(VerificationError::InvalidFinalityBranch);
    }

    let next_committee = update
        .next_sync_committee
        .as_ref()
        .ok_or(VerificationError::MissingNextSyncCommittee)?;
    if !verify_merkle_branch(
        &hash_sync_committee(next_committee),
        &update.next_sync_committee_branch,
        NEXT_SYNC_COMMITTEE_DEPTH,
        NEXT_SYNC_COMMITTEE_GINDEX,
        &update.attested_header.state_root,
    ) {
        return Err(VerificationError::InvalidSyncCommitteeBranch);
    }

    let domain = compute_domain(
        &DOMAIN_SYNC_COMMITTEE,
        &config.fork_version,
        &config.genesis_validators_root,
    );
    let signing_root = compute_signing_root(&update.attested_header, &domain);

    // Full participation signs against the precomputed aggregate
    let signer_key = if num_participants == committee.pubkeys.len() {
        committee.aggregate_pubkey.clone()
    } else {
        let participants: Vec<&PublicKey> = aggregate
            .participant_indices()
            .into_iter()
            .map(|i| &committee.pubkeys[i])
            .collect();
        aggregate_pubkeys(&participants)?
    };

    verify_bls_signature(&signer_key, &signing_root, &aggregate.sync_committee_signature)
}

/// Verify a BLS12-381 signature against a single (possibly aggregate) key.
fn verify_bls_signature(
    pubkey: &PublicKey,
    message: &[u8; 32],
    signature: &BlsSignature,
) -> Result<(), VerificationError> {
    let sig = Signature::from_bytes(&signature.0).map_err(|e| {
        VerificationError::BlsError(format!("Failed to deserialize signature: {:?}", e))
    })?;

    let result = sig.verify(true, message, BLS_DST, &[], pubkey, false);
    if result != BLST_ERROR::BLST_SUCCESS {
        return Err(VerificationError::InvalidSignature);
    }

    Ok(())
}

/// Encode a u64 as a 32-byte SSZ leaf (little-endian, zero-padded).
fn uint64_to_leaf(value: u64) -> [u8; 32] {
    let mut leaf = [0u8; 32];
    leaf[..8].copy_from_slice(&value.to_le_bytes());
    leaf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{signed_update, test_config, TestCommittee};

    #[test]
    fn test_uint64_to_leaf() {
        let leaf = uint64_to_leaf(42);
        assert_eq!(leaf[0], 42);
        assert_eq!(leaf[1..8], [0; 7]);
        assert_eq!(leaf[8..32], [0; 24]);
    }

    #[test]
    fn test_header_root_matches_manual_merkleization() {
        let header = BeaconBlockHeader {
            slot: 100,
            proposer_index: 3,
            parent_root: [1; 32],
            state_root: [2; 32],
            body_root: [3; 32],
        };
        let zero = [0u8; 32];
        let h01 = sha256_pair(&uint64_to_leaf(100), &uint64_to_leaf(3));
        let h23 = sha256_pair(&[1; 32], &[2; 32]);
        let h45 = sha256_pair(&[3; 32], &zero);
        let h67 = sha256_pair(&zero, &zero);
        let expected = sha256_pair(&sha256_pair(&h01, &h23), &sha256_pair(&h45, &h67));

        assert_eq!(hash_beacon_block_header(&header), expected);
    }

    #[test]
    fn test_compute_domain() {
        let domain = compute_domain(
            &DOMAIN_SYNC_COMMITTEE,
            &[0x04, 0x00, 0x00, 0x00], // Deneb fork version
            &[0xaa; 32],
        );
        // Domain should start with the domain type
        assert_eq!(&domain[..4], &DOMAIN_SYNC_COMMITTEE);
        // A different fork gives a different domain
        let other = compute_domain(&DOMAIN_SYNC_COMMITTEE, &[0x03, 0x00, 0x00, 0x00], &[0xaa; 32]);
        assert_ne!(domain, other);
    }

    #[test]
    fn test_verify_merkle_branch_trivial() {
        // Single-depth branch: leaf with one sibling
        let leaf = sha256(b"leaf");
        let sibling = sha256(b"sibling");
        let root = sha256_pair(&leaf, &sibling);

        assert!(verify_merkle_branch(&leaf, &[sibling], 1, 0, &root));
        // Wrong index should fail
        assert!(!verify_merkle_branch(&leaf, &[sibling], 1, 1, &root));
        // Wrong depth should fail
        assert!(!verify_merkle_branch(&leaf, &[sibling], 2, 0, &root));
    }

    #[test]
    fn test_sync_committee_root_depends_on_order() {
        let committee = TestCommittee::generate("order", 8).sync_committee();
        let mut reversed = committee.clone();
        reversed.pubkeys.reverse();
        assert_ne!(hash_sync_committee(&committee), hash_sync_committee(&reversed));
    }

    #[test]
    fn test_deserialize_rejects_garbage_key() {
        let mut keys = TestCommittee::generate("garbage", 8).pubkeys;
        keys[5] = BlsPublicKey([0x11; 48]);
        assert!(matches!(
            deserialize_sync_committee(&keys),
            Err(VerificationError::InvalidPublicKey { index: 5, .. })
        ));
        assert!(matches!(
            deserialize_sync_committee(&[]),
            Err(VerificationError::BlsError(_))
        ));
    }

    #[test]
    fn test_valid_update_full_and_partial_participation() {
        let config = test_config();
        let current = TestCommittee::generate("current", config.sync_committee_size);
        let next = TestCommittee::generate("next", config.sync_committee_size);
        let fast = deserialize_sync_committee(&current.pubkeys).unwrap();

        let full = signed_update(&config, &current, &next, 4, config.sync_committee_size);
        assert!(assert_valid_light_client_update(&config, &fast, &full).is_ok());

        let partial = signed_update(&config, &current, &next, 4, config.min_participants());
        assert!(assert_valid_light_client_update(&config, &fast, &partial).is_ok());
    }

    #[test]
    fn test_insufficient_participation_rejected() {
        let config = test_config();
        let current = TestCommittee::generate("current", config.sync_committee_size);
        let next = TestCommittee::generate("next", config.sync_committee_size);
        let fast = deserialize_sync_committee(&current.pubkeys).unwrap();

        let update = signed_update(&config, &current, &next, 4, config.min_participants() - 1);
        assert!(matches!(
            assert_valid_light_client_update(&config, &fast, &update),
            Err(VerificationError::InsufficientParticipation { participants: 10, required: 11 })
        ));
    }

    #[test]
    fn test_wrong_signer_rejected() {
        let config = test_config();
        let current = TestCommittee::generate("current", config.sync_committee_size);
        let impostor = TestCommittee::generate("impostor", config.sync_committee_size);
        let next = TestCommittee::generate("next", config.sync_committee_size);
        let fast = deserialize_sync_committee(&current.pubkeys).unwrap();

        let update = signed_update(&config, &impostor, &next, 4, config.sync_committee_size);
        assert!(matches!(
            assert_valid_light_client_update(&config, &fast, &update),
            Err(VerificationError::InvalidSignature)
        ));
    }

    #[test]
    fn test_other_fork_signature_rejected() {
        let config = test_config();
        let current = TestCommittee::generate("current", config.sync_committee_size);
        let next = TestCommittee::generate("next", config.sync_committee_size);
        let fast = deserialize_sync_committee(&current.pubkeys).unwrap();
        let update = signed_update(&config, &current, &next, 4, config.sync_committee_size);

        let other_fork = ChainConfig {
            fork_version: [0x03, 0x00, 0x00, 0x00],
            ..config
        };
        assert!(matches!(
            assert_valid_light_client_update(&other_fork, &fast, &update),
            Err(VerificationError::InvalidSignature)
        ));
    }

    #[test]
    fn test_structural_violations_rejected() {
        let config = test_config();
        let current = TestCommittee::generate("current", config.sync_committee_size);
        let next = TestCommittee::generate("next", config.sync_committee_size);
        let fast = deserialize_sync_committee(&current.pubkeys).unwrap();
        let valid = signed_update(&config, &current, &next, 4, config.sync_committee_size);

        let mut update = valid.clone();
        update.next_sync_committee = None;
        assert!(matches!(
            assert_valid_light_client_update(&config, &fast, &update),
            Err(VerificationError::MissingNextSyncCommittee)
        ));

        let mut update = valid.clone();
        update.next_sync_committee_branch[2][0] ^= 0x01;
        assert!(matches!(
            assert_valid_light_client_update(&config, &fast, &update),
            Err(VerificationError::InvalidSyncCommitteeBranch)
        ));

        let mut update = valid.clone();
        update.signature_slot = update.attested_header.slot;
        assert!(matches!(
            assert_valid_light_client_update(&config, &fast, &update),
            Err(VerificationError::InvalidSlotOrder { .. })
        ));

        let mut update = valid.clone();
        update.finality_branch = vec![[0x01; 32]; FINALIZED_ROOT_DEPTH];
        assert!(matches!(
            assert_valid_light_client_update(&config, &fast, &update),
            Err(VerificationError::InvalidFinalityBranch)
        ));

        let mut update = valid.clone();
        update.finalized_header.slot = update.attested_header.slot + 1;
        assert!(matches!(
            assert_valid_light_client_update(&config, &fast, &update),
            Err(VerificationError::InvalidFinalityOrder { .. })
        ));

        let mut update = valid;
        update.sync_aggregate.sync_committee_bits.push(0);
        assert!(matches!(
            assert_valid_light_client_update(&config, &fast, &update),
            Err(VerificationError::InvalidSyncCommitteeBitsLength { expected: 2, got: 3 })
        ));
    }

    #[test]
    fn test_committee_size_mismatch() {
        let config = test_config();
        let small = TestCommittee::generate("small", 8);
        let next = TestCommittee::generate("next", config.sync_committee_size);
        let fast = deserialize_sync_committee(&small.pubkeys).unwrap();
        let update = signed_update(&config, &small, &next, 4, 8);
        assert!(matches!(
            assert_valid_light_client_update(&config, &fast, &update),
            Err(VerificationError::CommitteeSizeMismatch { expected: 16, got: 8 })
        ));
    }
}
