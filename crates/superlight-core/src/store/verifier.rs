use tracing::{debug, info};

use crate::config::ChainConfig;
use crate::consensus::sync_committee::{
    assert_valid_light_client_update, deserialize_sync_committee, hash_sync_committee,
    verify_merkle_branch, CURRENT_SYNC_COMMITTEE_DEPTH, CURRENT_SYNC_COMMITTEE_GINDEX,
};
use crate::store::{StoreError, SyncStoreVerifier};
use crate::types::beacon::*;
use crate::utils::{committees_equal, short_hex};

/// The verifier side of a superlight client.
///
/// Holds nothing but the genesis trust anchor and the current-period bound;
/// every later committee has to be earned through
/// [`sync_update_verify`](SyncStoreVerifier::sync_update_verify).
#[derive(Clone, Debug)]
pub struct BeaconStoreVerifier {
    config: ChainConfig,
    genesis_period: u64,
    genesis_sync_committee: Vec<BlsPublicKey>,
    current_period: u64,
}

impl BeaconStoreVerifier {
    /// Anchor a verifier at `genesis`.
    ///
    /// This is the one moment of trust. The snapshot is only checked for
    /// self-consistency: committee size, and the committee branch against the
    /// header's state root when a branch is supplied.
    pub fn new(
        config: ChainConfig,
        genesis: &LightClientBootstrap,
        current_period: u64,
    ) -> Result<Self, StoreError> {
        config.validate()?;

        let committee = &genesis.current_sync_committee;
        if committee.pubkeys.len() != config.sync_committee_size {
            return Err(StoreError::InvalidGenesis {
                reason: format!(
                    "committee has {} members, expected {}",
                    committee.pubkeys.len(),
                    config.sync_committee_size
                ),
            });
        }

        if !genesis.current_sync_committee_branch.is_empty()
            && !verify_merkle_branch(
                &hash_sync_committee(committee),
                &genesis.current_sync_committee_branch,
                CURRENT_SYNC_COMMITTEE_DEPTH,
                CURRENT_SYNC_COMMITTEE_GINDEX,
                &genesis.header.state_root,
            )
        {
            return Err(StoreError::InvalidGenesis {
                reason: "current sync committee branch does not match the header state root".into(),
            });
        }

        let genesis_period = config.period_at_slot(genesis.header.slot);
        if current_period < genesis_period {
            return Err(StoreError::PeriodBeforeStart {
                period: current_period,
                start_period: genesis_period,
            });
        }

        info!(
            genesis_period,
            current_period,
            genesis_root = %short_hex(&hash_sync_committee(committee)),
            "anchored sync committee verifier"
        );

        Ok(Self {
            config,
            genesis_period,
            genesis_sync_committee: committee.pubkeys.clone(),
            current_period,
        })
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }
}

impl SyncStoreVerifier for BeaconStoreVerifier {
    type Update = LightClientUpdate;

    fn sync_update_verify(
        &self,
        prev_committee: &[BlsPublicKey],
        claimed_next_committee: &[BlsPublicKey],
        update: &LightClientUpdate,
    ) -> bool {
        let slot = update.attested_header.slot;

        // The update has to name the committee being claimed before any
        // signature work is done
        let Some(next) = update.next_sync_committee.as_ref() else {
            debug!(slot, "update rejected: no next sync committee");
            return false;
        };
        if !committees_equal(&next.pubkeys, claimed_next_committee) {
            debug!(slot, "update rejected: next sync committee differs from the claimed one");
            return false;
        }

        let prev = match deserialize_sync_committee(prev_committee) {
            Ok(prev) => prev,
            Err(err) => {
                debug!(slot, %err, "update rejected: previous committee unusable");
                return false;
            }
        };

        match assert_valid_light_client_update(&self.config, &prev, update) {
            Ok(()) => true,
            Err(err) => {
                debug!(slot, %err, "update rejected");
                false
            }
        }
    }

    fn genesis_sync_committee(&self) -> &[BlsPublicKey] {
        &self.genesis_sync_committee
    }

    fn genesis_period(&self) -> u64 {
        self.genesis_period
    }

    fn current_period(&self) -> u64 {
        self.current_period
    }
}
