use tracing::{info, warn};

use crate::store::{StoreError, SyncStoreProver, SyncStoreVerifier};
use crate::types::beacon::BlsPublicKey;
use crate::utils::committees_equal;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkVerdict {
    /// Every rotation up to the verifier's current period checked out.
    Honest,
    /// The provider's committee for `period` could not be justified.
    Rejected { period: u64 },
}

/// Outcome of walking one provider's committee chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainWalk {
    /// Last period whose committee the verifier now trusts. The genesis
    /// period is always trusted.
    pub verified_through: u64,
    /// The committee of `verified_through`.
    pub committee: Vec<BlsPublicKey>,
    pub verdict: WalkVerdict,
}

impl ChainWalk {
    pub fn is_honest(&self) -> bool {
        self.verdict == WalkVerdict::Honest
    }
}

/// Walk `prover`'s committees from the verifier's genesis up to its current
/// period, one rotation at a time.
///
/// Stops at the first committee that fails verification. Data the provider
/// cannot serve at all surfaces as an error rather than a verdict.
pub fn walk_committee_chain<P, V>(verifier: &V, prover: &P) -> Result<ChainWalk, StoreError>
where
    P: SyncStoreProver,
    V: SyncStoreVerifier<Update = P::Update>,
{
    let genesis_period = verifier.genesis_period();
    let mut trusted = verifier.genesis_sync_committee();
    let mut verified_through = genesis_period;

    if !committees_equal(prover.sync_committee(genesis_period)?, trusted) {
        warn!(period = genesis_period, "provider disagrees on the genesis committee");
        return Ok(ChainWalk {
            verified_through,
            committee: trusted.to_vec(),
            verdict: WalkVerdict::Rejected {
                period: genesis_period,
            },
        });
    }

    for period in (genesis_period..verifier.current_period()).map(|p| p + 1) {
        let claimed = prover.sync_committee(period)?;
        let update = prover.sync_update(period - 1)?;

        if !verifier.sync_update_verify(trusted, claimed, update) {
            warn!(period, verified_through, "provider committee rejected");
            return Ok(ChainWalk {
                verified_through,
                committee: trusted.to_vec(),
                verdict: WalkVerdict::Rejected { period },
            });
        }

        trusted = claimed;
        verified_through = period;
    }

    info!(genesis_period, verified_through, "provider committee chain verified");
    Ok(ChainWalk {
        verified_through,
        committee: trusted.to_vec(),
        verdict: WalkVerdict::Honest,
    })
}
