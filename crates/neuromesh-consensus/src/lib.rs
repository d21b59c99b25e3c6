//! # Neuromesh Consensus
//!
//! Epoch-rotation BFT consensus for mesh-wide coordination transactions:
//! agent spawn/terminate, task assignment, resource allocation, and durable
//! state updates. Each epoch has one deterministic leader; the leader
//! proposes a block filled from the mempool, validators vote, and the block
//! commits at `floor(2n/3) + 1` `Yes` votes or aborts at the same threshold
//! of `No`.
//!
//! This crate is transport-agnostic: [`message::ConsensusMessage`] defines
//! the wire payload and [`engine::ConsensusEngine`] drives the round loop,
//! but sending and receiving those messages over the network is left to the
//! caller (typically `neuromesh-coordinator`).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod block;
mod engine;
mod error;
mod genesis;
mod mempool;
mod message;
mod transaction;
mod validator;

pub use block::{Block, BlockHeader, BlockId, FinalizedBlock};
pub use engine::{
    ConsensusApplication, ConsensusEngine, ConsensusEvent, EngineConfig, EngineState,
    NoOpApplication,
};
pub use error::{ConsensusError, Result};
pub use genesis::{generate_devnet_genesis, ConsensusParams, Genesis, GenesisValidator};
pub use mempool::{Mempool, MempoolConfig, MempoolStats};
pub use message::{
    Ballot, ConsensusMessage, ProposeMessage, SyncRequestMessage, SyncResponseMessage,
    TransactionMessage, VoteMessage, VoteTally,
};
pub use transaction::{
    AgentSpawn, AgentTerminate, ResourceAllocate, StateUpdate, TaskAssign, Transaction,
    TransactionId,
};
pub use validator::{Validator, ValidatorSet};
