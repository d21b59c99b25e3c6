//! Consensus block structure.
//!
//! Blocks contain ordered transactions and are the unit of consensus.

use crate::transaction::{Transaction, TransactionId};
use neuromesh_identity::{SerializablePublicKey, SerializableSignature};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A unique block identifier (SHA-256 hash of the block header).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId([u8; 32]);

impl BlockId {
    /// The genesis block's parent ID (all zeros).
    pub const GENESIS_PARENT: Self = Self([0u8; 32]);

    /// Creates a block ID from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the hex representation.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Creates a block ID from a hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex_str, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::GENESIS_PARENT
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// A block header containing metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockHeader {
    /// Block height (0 = genesis). Heights strictly increase; no two
    /// finalized blocks ever share a height.
    pub height: u64,

    /// Parent block hash.
    pub parent: BlockId,

    /// Epoch this block was proposed in, used to check that the proposer
    /// was in fact that epoch's leader.
    pub epoch: u64,

    /// Block producer (leader's public key).
    pub producer: SerializablePublicKey,

    /// Timestamp (unix milliseconds).
    pub timestamp: u64,

    /// Merkle root of transactions.
    pub tx_root: [u8; 32],

    /// State root after applying all transactions.
    pub state_root: [u8; 32],

    /// Number of transactions in this block.
    pub tx_count: u32,
}

impl BlockHeader {
    /// Computes the block ID from the header.
    #[must_use]
    pub fn id(&self) -> BlockId {
        let bytes = serde_json::to_vec(self).expect("header serialization should not fail");
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let result = hasher.finalize();
        let mut id = [0u8; 32];
        id.copy_from_slice(&result);
        BlockId(id)
    }
}

/// A full block containing header and transactions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    /// Block header.
    pub header: BlockHeader,

    /// Ordered transactions in this block, by descending priority.
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Creates a new block.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        height: u64,
        parent: BlockId,
        epoch: u64,
        producer: SerializablePublicKey,
        timestamp: u64,
        transactions: Vec<Transaction>,
        state_root: [u8; 32],
    ) -> Self {
        let tx_root = Self::compute_tx_root(&transactions);
        let tx_count = transactions.len() as u32;

        let header = BlockHeader {
            height,
            parent,
            epoch,
            producer,
            timestamp,
            tx_root,
            state_root,
            tx_count,
        };

        Self {
            header,
            transactions,
        }
    }

    /// Creates the genesis block.
    #[must_use]
    pub fn genesis(producer: SerializablePublicKey) -> Self {
        Self::new(0, BlockId::GENESIS_PARENT, 0, producer, 0, vec![], [0u8; 32])
    }

    /// Returns the block ID.
    #[must_use]
    pub fn id(&self) -> BlockId {
        self.header.id()
    }

    /// Returns the block height.
    #[must_use]
    pub fn height(&self) -> u64 {
        self.header.height
    }

    /// Returns the parent block ID.
    #[must_use]
    pub fn parent(&self) -> BlockId {
        self.header.parent
    }

    /// Returns the epoch the block was proposed in.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.header.epoch
    }

    /// Returns the timestamp.
    #[must_use]
    pub fn timestamp(&self) -> u64 {
        self.header.timestamp
    }

    /// Returns the number of transactions.
    #[must_use]
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    /// Returns the encoded size of the block, used to enforce
    /// `max_block_size` while filling a proposal.
    #[must_use]
    pub fn encoded_size(&self) -> usize {
        serde_json::to_vec(self).map(|b| b.len()).unwrap_or(0)
    }

    /// Computes the Merkle root of transactions.
    fn compute_tx_root(transactions: &[Transaction]) -> [u8; 32] {
        if transactions.is_empty() {
            return [0u8; 32];
        }

        let mut hashes: Vec<[u8; 32]> = transactions.iter().map(|tx| *tx.id().as_bytes()).collect();

        while hashes.len() > 1 {
            let mut next_level = Vec::with_capacity(hashes.len().div_ceil(2));

            for chunk in hashes.chunks(2) {
                let mut hasher = Sha256::new();
                hasher.update(chunk[0]);
                if chunk.len() > 1 {
                    hasher.update(chunk[1]);
                } else {
                    hasher.update(chunk[0]);
                }
                let result = hasher.finalize();
                let mut hash = [0u8; 32];
                hash.copy_from_slice(&result);
                next_level.push(hash);
            }

            hashes = next_level;
        }

        hashes[0]
    }

    /// Verifies the transaction root matches.
    #[must_use]
    pub fn verify_tx_root(&self) -> bool {
        let computed = Self::compute_tx_root(&self.transactions);
        computed == self.header.tx_root
    }

    /// Returns an iterator over transaction IDs.
    pub fn transaction_ids(&self) -> impl Iterator<Item = TransactionId> + '_ {
        self.transactions.iter().map(|tx| tx.id())
    }
}

/// Block with consensus metadata (the quorum of votes that committed it).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinalizedBlock {
    /// The block.
    pub block: Block,

    /// Epoch the block was committed in.
    pub epoch: u64,

    /// Validator signatures over the commit vote.
    pub signatures: Vec<(SerializablePublicKey, SerializableSignature)>,
}

impl FinalizedBlock {
    /// Creates a new finalized block.
    #[must_use]
    pub fn new(
        block: Block,
        epoch: u64,
        signatures: Vec<(SerializablePublicKey, SerializableSignature)>,
    ) -> Self {
        Self {
            block,
            epoch,
            signatures,
        }
    }

    /// Returns the block ID.
    #[must_use]
    pub fn id(&self) -> BlockId {
        self.block.id()
    }

    /// Returns the block height.
    #[must_use]
    pub fn height(&self) -> u64 {
        self.block.height()
    }

    /// Returns the number of signatures backing this commit.
    #[must_use]
    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::AgentSpawn;
    use neuromesh_core::AgentId;
    use neuromesh_identity::Keypair;

    fn test_keypair() -> (SerializablePublicKey, SerializableSignature) {
        let kp = Keypair::from_seed(42);
        let sig = kp.sign(b"test");
        (
            SerializablePublicKey::from_public_key(&kp.public_key()),
            SerializableSignature::from_signature(&sig),
        )
    }

    fn test_tx(producer: SerializablePublicKey, signature: SerializableSignature) -> Transaction {
        Transaction::AgentSpawn {
            payload: AgentSpawn {
                agent_id: AgentId::generate(),
                architecture: vec![],
                target_node: None,
            },
            priority: 1,
            submitter: producer,
            signature,
        }
    }

    #[test]
    fn block_id_roundtrip() {
        let bytes = [0xab; 32];
        let id = BlockId::from_bytes(bytes);
        assert_eq!(id.as_bytes(), &bytes);

        let hex = id.to_hex();
        let parsed = BlockId::from_hex(&hex).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn genesis_block_has_empty_tx_root() {
        let (producer, _) = test_keypair();
        let genesis = Block::genesis(producer);

        assert_eq!(genesis.height(), 0);
        assert_eq!(genesis.parent(), BlockId::GENESIS_PARENT);
        assert_eq!(genesis.tx_count(), 0);
        assert!(genesis.verify_tx_root());
    }

    #[test]
    fn block_with_transactions_verifies() {
        let (producer, signature) = test_keypair();
        let tx = test_tx(producer.clone(), signature);

        let block = Block::new(1, BlockId::GENESIS_PARENT, 0, producer, 12345, vec![tx], [0u8; 32]);

        assert_eq!(block.height(), 1);
        assert_eq!(block.tx_count(), 1);
        assert!(block.verify_tx_root());
    }

    #[test]
    fn block_id_differs_by_height() {
        let (producer, _) = test_keypair();

        let block1 = Block::new(1, BlockId::GENESIS_PARENT, 0, producer.clone(), 12345, vec![], [0u8; 32]);
        let block2 = Block::new(2, BlockId::GENESIS_PARENT, 0, producer, 12345, vec![], [0u8; 32]);

        assert_ne!(block1.id(), block2.id());
    }

    #[test]
    fn finalized_block_carries_signatures() {
        let (producer, sig) = test_keypair();
        let block = Block::genesis(producer.clone());
        let signatures = vec![(producer, sig)];

        let finalized = FinalizedBlock::new(block, 1, signatures);

        assert_eq!(finalized.height(), 0);
        assert_eq!(finalized.signature_count(), 1);
        assert_eq!(finalized.epoch, 1);
    }
}
