//! Genesis configuration for the consensus network.
//!
//! The genesis file defines the initial validator set and consensus
//! parameters a fresh mesh starts from.

use crate::error::{ConsensusError, Result};
use crate::validator::{Validator, ValidatorSet};
use neuromesh_identity::{PublicKey, SerializablePublicKey};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Genesis configuration for a single validator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisValidator {
    /// Human-readable name.
    pub name: String,
    /// Public key (hex-encoded).
    pub pubkey: String,
    /// Staked weight.
    pub stake: u64,
}

impl GenesisValidator {
    /// Converts to a [`Validator`].
    pub fn into_validator(self) -> Result<Validator> {
        let pubkey_bytes =
            hex::decode(&self.pubkey).map_err(|e| ConsensusError::InvalidGenesis(e.to_string()))?;
        if pubkey_bytes.len() != PublicKey::LEN {
            return Err(ConsensusError::InvalidGenesis(format!(
                "invalid public key length: expected {} bytes, got {}",
                PublicKey::LEN,
                pubkey_bytes.len()
            )));
        }

        let public_key = SerializablePublicKey::from_hex(&self.pubkey)
            .to_public_key()
            .map_err(|e| ConsensusError::InvalidGenesis(e.to_string()))?;

        Ok(Validator::new(public_key, self.stake))
    }
}

/// Consensus parameters from genesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusParams {
    /// Target time between block proposals, in milliseconds.
    pub block_time_ms: u64,
    /// Maximum block size in bytes.
    pub max_block_size: usize,
    /// How long a pending transaction may wait before it is discarded.
    pub consensus_timeout_ms: u64,
    /// The Byzantine fault tolerance this network is configured for: the
    /// engine refuses to start unless the validator set satisfies
    /// `n >= 3 * byzantine_tolerance + 1`.
    pub byzantine_tolerance: usize,
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self {
            block_time_ms: 2000,
            max_block_size: 10 * 1024 * 1024,
            consensus_timeout_ms: 30_000,
            byzantine_tolerance: 1,
        }
    }
}

/// Complete genesis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genesis {
    /// Network identifier (mesh ID).
    pub mesh_id: String,
    /// Genesis timestamp (unix milliseconds).
    pub timestamp: u64,
    /// Initial validators.
    pub validators: Vec<GenesisValidator>,
    /// Consensus parameters.
    #[serde(default)]
    pub consensus: ConsensusParams,
}

impl Genesis {
    /// Creates a new genesis configuration.
    #[must_use]
    pub fn new(mesh_id: impl Into<String>, timestamp: u64) -> Self {
        Self {
            mesh_id: mesh_id.into(),
            timestamp,
            validators: Vec::new(),
            consensus: ConsensusParams::default(),
        }
    }

    /// Adds a validator to the genesis.
    #[must_use]
    pub fn with_validator(mut self, validator: GenesisValidator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Sets the consensus parameters.
    #[must_use]
    pub fn with_consensus_params(mut self, params: ConsensusParams) -> Self {
        self.consensus = params;
        self
    }

    /// Loads genesis from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConsensusError::InvalidGenesis(format!("failed to read file: {e}")))?;
        let genesis: Genesis = serde_json::from_str(&content)?;
        genesis.validate()?;
        Ok(genesis)
    }

    /// Loads genesis from a YAML file.
    pub fn load_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConsensusError::InvalidGenesis(format!("failed to read file: {e}")))?;
        let genesis: Genesis =
            serde_yaml::from_str(&content).map_err(|e| ConsensusError::InvalidGenesis(e.to_string()))?;
        genesis.validate()?;
        Ok(genesis)
    }

    /// Validates the genesis configuration, including the Byzantine fault
    /// tolerance floor (`n >= 3f + 1`).
    pub fn validate(&self) -> Result<()> {
        if self.mesh_id.is_empty() {
            return Err(ConsensusError::InvalidGenesis("mesh_id is empty".into()));
        }

        if self.validators.is_empty() {
            return Err(ConsensusError::InvalidGenesis("no validators".into()));
        }

        let required = 3 * self.consensus.byzantine_tolerance + 1;
        if self.validators.len() < required {
            return Err(ConsensusError::InsufficientValidators {
                validators: self.validators.len(),
                faulty: self.consensus.byzantine_tolerance,
                required,
            });
        }

        for v in &self.validators {
            let _ = v.clone().into_validator()?;
        }

        let mut seen_names = std::collections::HashSet::new();
        let mut seen_pubkeys = std::collections::HashSet::new();

        for v in &self.validators {
            if !seen_names.insert(&v.name) {
                return Err(ConsensusError::InvalidGenesis(format!(
                    "duplicate validator name: {}",
                    v.name
                )));
            }
            if !seen_pubkeys.insert(&v.pubkey) {
                return Err(ConsensusError::InvalidGenesis(format!(
                    "duplicate validator pubkey: {}",
                    v.pubkey
                )));
            }
        }

        Ok(())
    }

    /// Converts to a [`ValidatorSet`], validating first.
    pub fn into_validator_set(self) -> Result<ValidatorSet> {
        self.validate()?;
        let mut set = ValidatorSet::new();
        for gv in self.validators {
            set.add(gv.into_validator()?);
        }
        Ok(set)
    }
}

/// Generates a devnet genesis with `validator_count` freshly-keyed
/// validators, for local testing.
#[must_use]
pub fn generate_devnet_genesis(validator_count: usize) -> Genesis {
    use neuromesh_identity::Keypair;

    let validators: Vec<GenesisValidator> = (0..validator_count as u64)
        .map(|i| {
            let kp = Keypair::from_seed(i);
            GenesisValidator {
                name: format!("validator-{}", i + 1),
                pubkey: hex::encode(kp.public_key().as_bytes()),
                stake: 100,
            }
        })
        .collect();

    Genesis {
        mesh_id: "neuromesh-devnet".into(),
        timestamp: std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64,
        validators,
        consensus: ConsensusParams::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn devnet_genesis_with_enough_validators_is_valid() {
        let genesis = generate_devnet_genesis(4);
        assert!(genesis.validate().is_ok());
    }

    #[test]
    fn too_few_validators_for_byzantine_tolerance_is_rejected() {
        let genesis = generate_devnet_genesis(3);
        assert!(matches!(
            genesis.validate(),
            Err(ConsensusError::InsufficientValidators { .. })
        ));
    }

    #[test]
    fn genesis_to_validator_set_has_expected_len() {
        let genesis = generate_devnet_genesis(4);
        let set = genesis.into_validator_set().unwrap();
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn genesis_serde_roundtrip() {
        let genesis = generate_devnet_genesis(4);
        let json = serde_json::to_string(&genesis).unwrap();
        let parsed: Genesis = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.mesh_id, genesis.mesh_id);
        assert_eq!(parsed.validators.len(), 4);
    }

    #[test]
    fn duplicate_validator_name_is_rejected() {
        let mut genesis = generate_devnet_genesis(4);
        genesis.validators[1].name = genesis.validators[0].name.clone();
        assert!(matches!(
            genesis.validate(),
            Err(ConsensusError::InvalidGenesis(msg)) if msg.contains("duplicate validator name")
        ));
    }

    #[test]
    fn duplicate_validator_pubkey_is_rejected() {
        let mut genesis = generate_devnet_genesis(4);
        genesis.validators[1].pubkey = genesis.validators[0].pubkey.clone();
        assert!(matches!(
            genesis.validate(),
            Err(ConsensusError::InvalidGenesis(msg)) if msg.contains("duplicate validator pubkey")
        ));
    }
}
