//! Validator management.

use neuromesh_identity::PublicKey;
use serde::{Deserialize, Serialize};

/// A validator in the consensus network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Validator {
    /// The validator's public key.
    pub public_key: PublicKey,
    /// Staked weight backing this validator's vote.
    pub stake: u64,
    /// Reputation score in `[0, 1]`, adjusted by observed behavior over
    /// time; not currently consulted by quorum math but tracked so a
    /// coordinator can deprioritize flaky validators.
    pub reputation: f64,
    /// Fraction of this validator's recent votes that diverged from the
    /// eventual quorum outcome, in `[0, 1]`. A validator whose
    /// `byzantine_score` crosses an operator-defined threshold is a
    /// candidate for removal from the set.
    pub byzantine_score: f64,
    /// Whether the validator currently participates in voting.
    pub active: bool,
}

impl Validator {
    /// Creates a new validator with neutral reputation and no observed
    /// Byzantine behavior.
    #[must_use]
    pub fn new(public_key: PublicKey, stake: u64) -> Self {
        Self {
            public_key,
            stake,
            reputation: 1.0,
            byzantine_score: 0.0,
            active: true,
        }
    }
}

/// A set of validators, ordered for deterministic epoch-indexed leader
/// rotation.
#[derive(Debug, Clone, Default)]
pub struct ValidatorSet {
    validators: Vec<Validator>,
}

impl ValidatorSet {
    /// Creates an empty validator set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a validator to the set.
    pub fn add(&mut self, validator: Validator) {
        self.validators.push(validator);
    }

    /// Returns the number of validators (active and inactive).
    #[must_use]
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Returns the active validators.
    pub fn active(&self) -> impl Iterator<Item = &Validator> {
        self.validators.iter().filter(|v| v.active)
    }

    /// Returns the total stake of active validators.
    #[must_use]
    pub fn total_stake(&self) -> u64 {
        self.active().map(|v| v.stake).sum()
    }

    /// Returns the number of votes required to commit a block: `floor(2n/3) + 1`
    /// of the active validator count, where `n` is the number of active
    /// validators (vote counting is per-validator, not stake-weighted).
    #[must_use]
    pub fn quorum_threshold(&self) -> usize {
        let n = self.active().count();
        (2 * n) / 3 + 1
    }

    /// The maximum number of simultaneously Byzantine validators this set
    /// can tolerate while still reaching quorum safely: `floor((n-1)/3)`.
    #[must_use]
    pub fn max_tolerated_faulty(&self) -> usize {
        let n = self.active().count();
        n.saturating_sub(1) / 3
    }

    /// Whether this set has enough active validators to safely start
    /// consensus: `n >= 3f + 1` for the requested fault tolerance `f`.
    #[must_use]
    pub fn meets_byzantine_threshold(&self, f: usize) -> bool {
        self.active().count() >= 3 * f + 1
    }

    /// Checks if the given public key belongs to an active validator.
    #[must_use]
    pub fn contains(&self, public_key: &PublicKey) -> bool {
        self.active().any(|v| v.public_key.as_bytes() == public_key.as_bytes())
    }

    /// Returns the leader for the given epoch, chosen by round-robin over
    /// active validators sorted by public key bytes (a stable, deterministic
    /// order every node computes identically without further coordination).
    #[must_use]
    pub fn leader_for_epoch(&self, epoch: u64) -> Option<&Validator> {
        let mut active: Vec<&Validator> = self.active().collect();
        if active.is_empty() {
            return None;
        }
        active.sort_by(|a, b| a.public_key.as_bytes().cmp(b.public_key.as_bytes()));
        let index = (epoch as usize) % active.len();
        Some(active[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuromesh_identity::Keypair;

    fn set_of(n: u64) -> ValidatorSet {
        let mut set = ValidatorSet::new();
        for i in 0..n {
            let kp = Keypair::from_seed(i);
            set.add(Validator::new(kp.public_key(), 100));
        }
        set
    }

    #[test]
    fn quorum_threshold_is_floor_two_thirds_plus_one() {
        let set = set_of(4);
        assert_eq!(set.quorum_threshold(), 3);
        let set = set_of(7);
        assert_eq!(set.quorum_threshold(), 5);
    }

    #[test]
    fn byzantine_threshold_requires_three_f_plus_one() {
        let set = set_of(4);
        assert!(set.meets_byzantine_threshold(1));
        assert!(!set.meets_byzantine_threshold(2));
        assert_eq!(set.max_tolerated_faulty(), 1);
    }

    #[test]
    fn leader_rotates_deterministically_across_epochs() {
        let set = set_of(4);
        let leader0 = set.leader_for_epoch(0).unwrap().public_key.clone();
        let leader1 = set.leader_for_epoch(1).unwrap().public_key.clone();
        assert_ne!(leader0.as_bytes(), leader1.as_bytes());
        let leader4 = set.leader_for_epoch(4).unwrap();
        assert_eq!(leader4.public_key.as_bytes(), leader0.as_bytes());
    }

    #[test]
    fn total_stake_sums_active_validators() {
        let set = set_of(4);
        assert_eq!(set.total_stake(), 400);
    }
}
