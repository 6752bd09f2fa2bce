//! Provider and verifier roles over the committee chain.
//!
//! A [`SyncStoreProver`] serves committees and the updates that rotate them;
//! a [`SyncStoreVerifier`] holds the genesis trust anchor and judges one
//! rotation at a time. Multi-provider comparison is built on top by walking
//! each provider's chain from genesis, see [`chain::walk_committee_chain`].

pub mod chain;
pub mod prover;
pub mod verifier;

pub use chain::*;
pub use prover::*;
pub use verifier::*;

use thiserror::Error;

use crate::config::ConfigError;
use crate::types::beacon::BlsPublicKey;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Requested period {period} is before the start period {start_period}")]
    PeriodBeforeStart { period: u64, start_period: u64 },

    #[error("Requested period {period} is outside the {held} periods held from {start_period}")]
    PeriodOutOfRange {
        period: u64,
        start_period: u64,
        held: usize,
    },

    #[error("Invalid genesis snapshot: {reason}")]
    InvalidGenesis { reason: String },

    #[error("Update for period {period} does not carry a next sync committee")]
    MissingNextCommittee { period: u64 },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to decode store data: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Data-provider role: serves committees and rotation updates by period.
pub trait SyncStoreProver {
    type Update;

    /// Committee of `period`.
    fn sync_committee(&self, period: u64) -> Result<&[BlsPublicKey], StoreError>;

    /// Update attested in `period`, carrying the committee of `period + 1`.
    fn sync_update(&self, period: u64) -> Result<&Self::Update, StoreError>;

    /// Start period and every held committee, in period order.
    fn all_sync_committees(&self) -> (u64, &[Vec<BlsPublicKey>]);
}

/// Verifier role: the trust anchor plus the single-transition predicate.
pub trait SyncStoreVerifier {
    type Update;

    /// True iff `update` is a valid rotation from `prev_committee` to
    /// `claimed_next_committee`. Never errors: every failure is `false`.
    fn sync_update_verify(
        &self,
        prev_committee: &[BlsPublicKey],
        claimed_next_committee: &[BlsPublicKey],
        update: &Self::Update,
    ) -> bool;

    fn genesis_sync_committee(&self) -> &[BlsPublicKey];

    fn genesis_period(&self) -> u64;

    fn current_period(&self) -> u64;
}
