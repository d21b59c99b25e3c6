//! Consensus message types exchanged between validators.
//!
//! These ride inside `neuromesh_protocol::Message`'s `Consensus` kind; this
//! crate stays independent of the transport layer and only defines the
//! payload shape and its `encode`/`decode` helpers.

use crate::block::{Block, BlockId, FinalizedBlock};
use crate::transaction::Transaction;
use bytes::Bytes;
use neuromesh_identity::{SerializablePublicKey, SerializableSignature};
use serde::{Deserialize, Serialize};

/// A consensus message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ConsensusMessage {
    /// Block proposal from the epoch leader.
    Propose(ProposeMessage),
    /// A validator's vote on a proposed block.
    Vote(VoteMessage),
    /// Broadcast of a newly submitted transaction.
    Transaction(TransactionMessage),
    /// Request for missing finalized blocks.
    SyncRequest(SyncRequestMessage),
    /// Response carrying the requested finalized blocks.
    SyncResponse(SyncResponseMessage),
}

impl ConsensusMessage {
    /// Encodes the message to bytes.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let json = serde_json::to_vec(self).expect("message serialization should not fail");
        Bytes::from(json)
    }

    /// Decodes a message from bytes.
    pub fn decode(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }

    /// Returns the message kind as a string, for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ConsensusMessage::Propose(_) => "propose",
            ConsensusMessage::Vote(_) => "vote",
            ConsensusMessage::Transaction(_) => "transaction",
            ConsensusMessage::SyncRequest(_) => "sync_request",
            ConsensusMessage::SyncResponse(_) => "sync_response",
        }
    }
}

/// Block proposal message from the epoch leader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposeMessage {
    /// The epoch this proposal was made in.
    pub epoch: u64,
    /// The proposed block.
    pub block: Block,
    /// Leader's public key.
    pub producer: SerializablePublicKey,
    /// Leader's signature over the block ID.
    pub signature: SerializableSignature,
}

impl ProposeMessage {
    /// Returns the proposed block's ID.
    #[must_use]
    pub fn block_id(&self) -> BlockId {
        self.block.id()
    }
}

/// A ballot in [`VoteMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ballot {
    /// Vote to commit the block.
    Yes,
    /// Vote to abort the block.
    No,
}

/// A validator's vote on a proposed block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteMessage {
    /// The epoch being voted on.
    pub epoch: u64,
    /// The block being voted on.
    pub block_id: BlockId,
    /// The ballot cast.
    pub ballot: Ballot,
    /// Voter's public key.
    pub voter: SerializablePublicKey,
    /// Voter's signature over `(epoch, block_id, ballot)`.
    pub signature: SerializableSignature,
}

impl VoteMessage {
    /// Returns the data that should be signed for this vote.
    #[must_use]
    pub fn signing_data(&self) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"VOTE:");
        data.extend_from_slice(&self.epoch.to_le_bytes());
        data.extend_from_slice(self.block_id.as_bytes());
        data.push(match self.ballot {
            Ballot::Yes => 1,
            Ballot::No => 0,
        });
        data
    }
}

/// Broadcast of a newly submitted transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionMessage {
    /// The transaction.
    pub transaction: Transaction,
}

/// Request for missing finalized blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRequestMessage {
    /// Starting height (exclusive).
    pub from_height: u64,
    /// Ending height (inclusive).
    pub to_height: u64,
    /// Requestor's public key.
    pub requestor: SerializablePublicKey,
}

/// Response carrying the requested finalized blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResponseMessage {
    /// The finalized blocks, in ascending height order.
    pub blocks: Vec<FinalizedBlock>,
    /// Responder's public key.
    pub responder: SerializablePublicKey,
}

/// Tracks votes cast for a given block, to detect quorum.
#[derive(Debug, Clone, Default)]
pub struct VoteTally {
    votes: std::collections::HashMap<BlockId, Vec<VoteMessage>>,
}

impl VoteTally {
    /// Creates an empty tally.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a vote, ignoring a second vote from the same voter for the
    /// same block.
    pub fn record(&mut self, vote: VoteMessage) {
        let entry = self.votes.entry(vote.block_id).or_default();
        if !entry.iter().any(|v| v.voter == vote.voter) {
            entry.push(vote);
        }
    }

    /// Returns the number of `Yes` votes recorded for `block_id`.
    #[must_use]
    pub fn yes_count(&self, block_id: &BlockId) -> usize {
        self.votes
            .get(block_id)
            .map(|v| v.iter().filter(|vote| vote.ballot == Ballot::Yes).count())
            .unwrap_or(0)
    }

    /// Returns the number of `No` votes recorded for `block_id`.
    #[must_use]
    pub fn no_count(&self, block_id: &BlockId) -> usize {
        self.votes
            .get(block_id)
            .map(|v| v.iter().filter(|vote| vote.ballot == Ballot::No).count())
            .unwrap_or(0)
    }

    /// Returns all `Yes` votes for `block_id`, used to build the commit
    /// signature set.
    #[must_use]
    pub fn yes_votes(&self, block_id: &BlockId) -> Vec<(SerializablePublicKey, SerializableSignature)> {
        self.votes
            .get(block_id)
            .map(|v| {
                v.iter()
                    .filter(|vote| vote.ballot == Ballot::Yes)
                    .map(|vote| (vote.voter.clone(), vote.signature.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Clears all tallies for a block, after it is committed or aborted.
    pub fn clear(&mut self, block_id: &BlockId) {
        self.votes.remove(block_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_roundtrips_through_encode_decode() {
        let msg = ConsensusMessage::SyncRequest(SyncRequestMessage {
            from_height: 1,
            to_height: 10,
            requestor: SerializablePublicKey::from_hex("ab".repeat(32)),
        });

        let encoded = msg.encode();
        let decoded = ConsensusMessage::decode(&encoded).unwrap();
        assert_eq!(decoded.kind(), "sync_request");
    }

    #[test]
    fn vote_tally_counts_ballots_and_dedupes_voter() {
        let block_id = BlockId::from_bytes([1u8; 32]);
        let voter = SerializablePublicKey::from_hex("cd".repeat(32));
        let mut tally = VoteTally::new();

        tally.record(VoteMessage {
            epoch: 0,
            block_id,
            ballot: Ballot::Yes,
            voter: voter.clone(),
            signature: SerializableSignature::from_hex(String::new()),
        });
        tally.record(VoteMessage {
            epoch: 0,
            block_id,
            ballot: Ballot::No,
            voter,
            signature: SerializableSignature::from_hex(String::new()),
        });

        assert_eq!(tally.yes_count(&block_id), 1);
        assert_eq!(tally.no_count(&block_id), 0);
    }

    #[test]
    fn signing_data_is_distinct_per_ballot() {
        let vote_yes = VoteMessage {
            epoch: 1,
            block_id: BlockId::from_bytes([2u8; 32]),
            ballot: Ballot::Yes,
            voter: SerializablePublicKey::from_hex("ef".repeat(32)),
            signature: SerializableSignature::from_hex(String::new()),
        };
        let mut vote_no = vote_yes.clone();
        vote_no.ballot = Ballot::No;

        assert_ne!(vote_yes.signing_data(), vote_no.signing_data());
    }
}
