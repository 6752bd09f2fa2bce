//! Chain parameters the verifier depends on.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::beacon::{SLOTS_PER_SYNC_COMMITTEE_PERIOD, SYNC_COMMITTEE_SIZE};
use crate::types::hex_serde;

/// Mainnet genesis validators root.
pub const MAINNET_GENESIS_VALIDATORS_ROOT: [u8; 32] = [
    0x4b, 0x36, 0x3d, 0xb9, 0x4e, 0x28, 0x61, 0x20, 0xd7, 0x6e, 0xb9, 0x05, 0x34, 0x0f, 0xdd,
    0x4e, 0x54, 0xbf, 0xe9, 0xf0, 0x6b, 0xf3, 0x3f, 0xf6, 0xcf, 0x5a, 0xd2, 0x7f, 0x51, 0x1b,
    0xfe, 0x95,
];

/// Deneb fork version on mainnet.
pub const MAINNET_FORK_VERSION: [u8; 4] = [0x04, 0x00, 0x00, 0x00];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Sync committee size must be a non-zero multiple of 8, got {0}")]
    InvalidCommitteeSize(usize),

    #[error("Slots per sync committee period must be non-zero")]
    ZeroPeriodLength,

    #[error("Supermajority {numerator}/{denominator} must lie in (0, 1]")]
    InvalidSupermajority { numerator: usize, denominator: usize },

    #[error("Invalid config JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Parameters of the chain whose committees are being followed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Members per sync committee.
    pub sync_committee_size: usize,
    /// Length of one committee period in slots.
    pub slots_per_sync_committee_period: u64,
    /// Genesis validators root, mixed into the signing domain.
    #[serde(with = "hex_serde::array")]
    pub genesis_validators_root: [u8; 32],
    /// Fork version, mixed into the signing domain.
    #[serde(with = "hex_serde::array")]
    pub fork_version: [u8; 4],
    /// Participation needed to accept an update, as a fraction of the committee.
    pub supermajority_numerator: usize,
    pub supermajority_denominator: usize,
}

impl ChainConfig {
    pub fn mainnet() -> Self {
        Self {
            sync_committee_size: SYNC_COMMITTEE_SIZE,
            slots_per_sync_committee_period: SLOTS_PER_SYNC_COMMITTEE_PERIOD,
            genesis_validators_root: MAINNET_GENESIS_VALIDATORS_ROOT,
            fork_version: MAINNET_FORK_VERSION,
            supermajority_numerator: 2,
            supermajority_denominator: 3,
        }
    }

    /// Decode and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync_committee_size == 0 || self.sync_committee_size % 8 != 0 {
            return Err(ConfigError::InvalidCommitteeSize(self.sync_committee_size));
        }
        if self.slots_per_sync_committee_period == 0 {
            return Err(ConfigError::ZeroPeriodLength);
        }
        if self.supermajority_numerator == 0
            || self.supermajority_denominator == 0
            || self.supermajority_numerator > self.supermajority_denominator
        {
            return Err(ConfigError::InvalidSupermajority {
                numerator: self.supermajority_numerator,
                denominator: self.supermajority_denominator,
            });
        }
        Ok(())
    }

    /// Minimum number of signers for an update to be accepted, rounded up.
    pub fn min_participants(&self) -> usize {
        let scaled = self.sync_committee_size * self.supermajority_numerator;
        scaled.div_ceil(self.supermajority_denominator)
    }

    /// Length of the participation bitvector in bytes.
    pub fn sync_committee_bits_len(&self) -> usize {
        self.sync_committee_size / 8
    }

    /// Committee period containing `slot`.
    pub fn period_at_slot(&self, slot: u64) -> u64 {
        slot / self.slots_per_sync_committee_period
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}
