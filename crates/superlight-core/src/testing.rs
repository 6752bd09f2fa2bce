//! Deterministic committees and signed updates for unit tests.

use blst::min_pk::{AggregateSignature, SecretKey, Signature};

use crate::config::ChainConfig;
use crate::consensus::sync_committee::*;
use crate::hashing::sha256;
use crate::types::beacon::*;

/// A small chain: 16 members, 32 slots per period, 11 signers needed.
pub(crate) fn test_config() -> ChainConfig {
    ChainConfig {
        sync_committee_size: 16,
        slots_per_sync_committee_period: 32,
        ..ChainConfig::mainnet()
    }
}

pub(crate) struct TestCommittee {
    secret_keys: Vec<SecretKey>,
    pub pubkeys: Vec<BlsPublicKey>,
}

impl TestCommittee {
    /// Keys derived from `seed`, so the same seed always yields the same committee.
    pub fn generate(seed: &str, size: usize) -> Self {
        let secret_keys: Vec<SecretKey> = (0..size)
            .map(|i| {
                let ikm = sha256(format!("{seed}/{i}").as_bytes());
                SecretKey::key_gen(&ikm, &[]).expect("32-byte ikm is always accepted")
            })
            .collect();
        let pubkeys = secret_keys
            .iter()
            .map(|sk| BlsPublicKey(sk.sk_to_pk().to_bytes()))
            .collect();
        Self {
            secret_keys,
            pubkeys,
        }
    }

    pub fn sync_committee(&self) -> SyncCommittee {
        let fast = deserialize_sync_committee(&self.pubkeys).expect("generated keys are valid");
        SyncCommittee {
            pubkeys: self.pubkeys.clone(),
            aggregate_pubkey: BlsPublicKey(fast.aggregate_pubkey.to_bytes()),
        }
    }

    pub fn sign(&self, message: &[u8; 32], signers: &[usize]) -> BlsSignature {
        let sigs: Vec<Signature> = signers
            .iter()
            .map(|&i| self.secret_keys[i].sign(message, BLS_DST, &[]))
            .collect();
        let refs: Vec<&Signature> = sigs.iter().collect();
        let aggregate = AggregateSignature::aggregate(&refs, false).expect("non-empty signer set");
        BlsSignature(aggregate.to_signature().to_bytes())
    }
}

/// An update attested in `period`, signed by the first `participants`
/// members of `signer`, rotating to `next`.
pub(crate) fn signed_update(
    config: &ChainConfig,
    signer: &TestCommittee,
    next: &TestCommittee,
    period: u64,
    participants: usize,
) -> LightClientUpdate {
    let next_committee = next.sync_committee();
    let branch: Vec<[u8; 32]> = (0..NEXT_SYNC_COMMITTEE_DEPTH)
        .map(|i| sha256(&[period as u8, i as u8]))
        .collect();
    let state_root = merkle_root_from_branch(
        &hash_sync_committee(&next_committee),
        &branch,
        NEXT_SYNC_COMMITTEE_GINDEX,
    );

    let slot = period * config.slots_per_sync_committee_period + 1;
    let attested_header = BeaconBlockHeader {
        slot,
        proposer_index: 7,
        parent_root: [period as u8; 32],
        state_root,
        body_root: [0x42; 32],
    };

    let domain = compute_domain(
        &DOMAIN_SYNC_COMMITTEE,
        &config.fork_version,
        &config.genesis_validators_root,
    );
    let signing_root = compute_signing_root(&attested_header, &domain);

    let mut bits = vec![0u8; config.sync_committee_bits_len()];
    for i in 0..participants {
        bits[i / 8] |= 1 << (i % 8);
    }
    let signers: Vec<usize> = (0..participants).collect();

    LightClientUpdate {
        attested_header,
        next_sync_committee: Some(next_committee),
        next_sync_committee_branch: branch,
        finalized_header: BeaconBlockHeader::default(),
        finality_branch: vec![],
        sync_aggregate: SyncAggregate {
            sync_committee_bits: bits,
            sync_committee_signature: signer.sign(&signing_root, &signers),
        },
        signature_slot: slot + 1,
    }
}

/// Genesis snapshot plus `num_updates` correctly rotating, fully signed updates.
pub(crate) struct TestChain {
    pub config: ChainConfig,
    pub bootstrap: LightClientBootstrap,
    /// `committees[k]` is the committee of period `start_period + k`.
    pub committees: Vec<TestCommittee>,
    /// `updates[k]` is signed by `committees[k]` and carries `committees[k + 1]`.
    pub updates: Vec<LightClientUpdate>,
}

impl TestChain {
    pub fn honest(start_period: u64, num_updates: usize) -> Self {
        let config = test_config();
        let committees: Vec<TestCommittee> = (0..=num_updates as u64)
            .map(|k| {
                TestCommittee::generate(
                    &format!("committee-{}", start_period + k),
                    config.sync_committee_size,
                )
            })
            .collect();

        let bootstrap = LightClientBootstrap {
            header: BeaconBlockHeader {
                slot: start_period * config.slots_per_sync_committee_period,
                proposer_index: 1,
                parent_root: [0; 32],
                state_root: [0; 32],
                body_root: [0; 32],
            },
            current_sync_committee: committees[0].sync_committee(),
            current_sync_committee_branch: vec![],
        };

        let updates = (0..num_updates)
            .map(|k| {
                signed_update(
                    &config,
                    &committees[k],
                    &committees[k + 1],
                    start_period + k as u64,
                    config.sync_committee_size,
                )
            })
            .collect();

        Self {
            config,
            bootstrap,
            committees,
            updates,
        }
    }
}
