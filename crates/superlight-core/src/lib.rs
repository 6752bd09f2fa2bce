//! # Superlight Core
//!
//! Sync-committee verification for a superlight Ethereum client.
//!
//! This crate contains **no networking code**. A verifier trusts exactly one
//! genesis checkpoint; every later sync committee is accepted only once an
//! update signed by the previous committee has been checked.
//!
//! ## Roles
//!
//! - **Prover** (`store::prover`): serves committees and rotation updates by
//!   period. It may be honest or not; nothing it serves is trusted.
//!
//! - **Verifier** (`store::verifier`): holds the genesis anchor and decides,
//!   one rotation at a time, whether a claimed committee follows from the
//!   previous one. Built on the BLS12-381 aggregate signature checks in
//!   `consensus`.
//!
//! - **Commitments** (`merkle`): an n-ary hash commitment tree with
//!   membership proofs, used to commit to committee sequences.
//!
//! ## Usage
//!
//! ```ignore
//! use superlight_core::store::{walk_committee_chain, BeaconStoreProver, BeaconStoreVerifier};
//!
//! let verifier = BeaconStoreVerifier::new(config.clone(), &bootstrap, current_period)?;
//! let prover = BeaconStoreProver::builder(config, bootstrap).updates(updates).build()?;
//! let walk = walk_committee_chain(&verifier, &prover)?;
//! ```

pub mod config;
pub mod consensus;
pub mod hashing;
pub mod merkle;
pub mod store;
pub mod types;
pub mod utils;

#[cfg(test)]
mod testing;

// Re-export commonly used types for convenience
pub use config::{ChainConfig, ConfigError};
pub use consensus::sync_committee::{assert_valid_light_client_update, VerificationError};
pub use merkle::{merkle_verify, MerkleProof, MerkleTree, TreeError};
pub use store::{
    walk_committee_chain, BeaconStoreProver, BeaconStoreVerifier, ChainWalk, StoreError,
    SyncStoreProver, SyncStoreVerifier, WalkVerdict,
};
pub use types::beacon::*;
