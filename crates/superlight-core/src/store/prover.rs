use tracing::{info, warn};

use crate::config::ChainConfig;
use crate::store::{StoreError, SyncStoreProver};
use crate::types::beacon::*;

/// Committees and rotation updates served by one data provider.
///
/// Built once through [`BeaconStoreProverBuilder`]; read-only afterwards. The
/// store does no verification of its own and serves exactly the data it was
/// built with, honest or not.
#[derive(Clone, Debug)]
pub struct BeaconStoreProver {
    start_period: u64,
    /// `sync_committees[k]` belongs to period `start_period + k`.
    sync_committees: Vec<Vec<BlsPublicKey>>,
    /// `sync_updates[k]` is attested in period `start_period + k`.
    sync_updates: Vec<LightClientUpdate>,
}

/// Collects the genesis snapshot and update history for a [`BeaconStoreProver`].
#[derive(Clone, Debug)]
pub struct BeaconStoreProverBuilder {
    config: ChainConfig,
    genesis: LightClientBootstrap,
    updates: Vec<LightClientUpdate>,
    overrides: Vec<(u64, Vec<BlsPublicKey>)>,
}

impl BeaconStoreProverBuilder {
    pub fn new(config: ChainConfig, genesis: LightClientBootstrap) -> Self {
        Self {
            config,
            genesis,
            updates: Vec::new(),
            overrides: Vec::new(),
        }
    }

    /// Append updates in period order.
    pub fn updates(mut self, updates: impl IntoIterator<Item = LightClientUpdate>) -> Self {
        self.updates.extend(updates);
        self
    }

    /// Serve `committee` for `period` instead of the one derived from the
    /// updates. This is how a dishonest provider is put together.
    pub fn override_committee(mut self, period: u64, committee: Vec<BlsPublicKey>) -> Self {
        self.overrides.push((period, committee));
        self
    }

    pub fn build(self) -> Result<BeaconStoreProver, StoreError> {
        self.config.validate()?;
        let start_period = self.config.period_at_slot(self.genesis.header.slot);

        for (index, update) in self.updates.iter().enumerate() {
            let expected = start_period.saturating_add(index as u64);
            let attested = self.config.period_at_slot(update.attested_header.slot);
            if attested != expected {
                warn!(index, expected, attested, "update attested outside its position's period");
            }
        }

        // The last update's next committee belongs to the upcoming period,
        // which this store does not serve yet
        let mut sync_committees = Vec::with_capacity(self.updates.len().max(1));
        sync_committees.push(self.genesis.current_sync_committee.pubkeys);
        for (index, update) in self
            .updates
            .iter()
            .enumerate()
            .take(self.updates.len().saturating_sub(1))
        {
            let next = update
                .next_sync_committee
                .as_ref()
                .ok_or(StoreError::MissingNextCommittee {
                    period: start_period.saturating_add(index as u64),
                })?;
            sync_committees.push(next.pubkeys.clone());
        }

        for (period, committee) in self.overrides {
            let index = period_index(period, start_period, sync_committees.len())?;
            warn!(period, "serving an overridden sync committee");
            sync_committees[index] = committee;
        }

        info!(
            start_period,
            committees = sync_committees.len(),
            updates = self.updates.len(),
            "built beacon store prover"
        );

        Ok(BeaconStoreProver {
            start_period,
            sync_committees,
            sync_updates: self.updates,
        })
    }
}

impl BeaconStoreProver {
    pub fn builder(config: ChainConfig, genesis: LightClientBootstrap) -> BeaconStoreProverBuilder {
        BeaconStoreProverBuilder::new(config, genesis)
    }

    /// Build from a JSON genesis snapshot and a JSON array of updates.
    pub fn from_json(
        config: ChainConfig,
        genesis_json: &str,
        updates_json: &str,
    ) -> Result<Self, StoreError> {
        let genesis: LightClientBootstrap = serde_json::from_str(genesis_json)?;
        let updates: Vec<LightClientUpdate> = serde_json::from_str(updates_json)?;
        Self::builder(config, genesis).updates(updates).build()
    }

    pub fn start_period(&self) -> u64 {
        self.start_period
    }

    /// Last period whose committee this store serves.
    pub fn last_period(&self) -> u64 {
        self.start_period + (self.sync_committees.len() as u64 - 1)
    }
}

impl SyncStoreProver for BeaconStoreProver {
    type Update = LightClientUpdate;

    fn sync_committee(&self, period: u64) -> Result<&[BlsPublicKey], StoreError> {
        let index = period_index(period, self.start_period, self.sync_committees.len())?;
        Ok(&self.sync_committees[index])
    }

    fn sync_update(&self, period: u64) -> Result<&LightClientUpdate, StoreError> {
        let index = period_index(period, self.start_period, self.sync_updates.len())?;
        Ok(&self.sync_updates[index])
    }

    fn all_sync_committees(&self) -> (u64, &[Vec<BlsPublicKey>]) {
        (self.start_period, &self.sync_committees)
    }
}

/// Position of `period` in a sequence of `held` entries starting at `start_period`.
fn period_index(period: u64, start_period: u64, held: usize) -> Result<usize, StoreError> {
    if period < start_period {
        return Err(StoreError::PeriodBeforeStart {
            period,
            start_period,
        });
    }
    match usize::try_from(period - start_period) {
        Ok(index) if index < held => Ok(index),
        _ => Err(StoreError::PeriodOutOfRange {
            period,
            start_period,
            held,
        }),
    }
}
