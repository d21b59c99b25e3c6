//! Consensus engine implementation.
//!
//! Implements leader-rotation consensus: each epoch has one deterministic
//! leader (see [`crate::validator::ValidatorSet::leader_for_epoch`]), the
//! leader proposes a block filled from the mempool, validators vote, and the
//! block commits once `floor(2n/3) + 1` validators vote `Yes` (or aborts on
//! the same threshold of `No`, or on timeout with no quorum reached).
//!
//! This crate never touches a socket. A caller (typically
//! `neuromesh-coordinator`) drives [`ConsensusEngine::run`] and feeds
//! received [`ConsensusMessage`]s into [`ConsensusEngine::handle_message`];
//! the engine emits outbound messages on the channel returned by
//! [`ConsensusEngine::new`].

use crate::block::{Block, BlockId, FinalizedBlock};
use crate::error::{ConsensusError, Result};
use crate::mempool::Mempool;
use crate::message::{
    Ballot, ConsensusMessage, ProposeMessage, SyncRequestMessage, SyncResponseMessage,
    TransactionMessage, VoteMessage, VoteTally,
};
use crate::transaction::{Transaction, TransactionId};
use crate::validator::ValidatorSet;
use async_trait::async_trait;
use neuromesh_identity::{Keypair, SerializablePublicKey, SerializableSignature};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

/// Configuration for the consensus engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Target time between block proposals.
    pub block_time: Duration,
    /// Maximum block size in bytes, enforced while filling a proposal.
    pub max_block_size: usize,
    /// Byzantine fault tolerance this engine refuses to start below:
    /// requires `validators >= 3 * byzantine_tolerance + 1`.
    pub byzantine_tolerance: usize,
    /// When false, every submitted transaction is finalized immediately in
    /// a single-validator block without a vote round (local/dev mode).
    pub consensus_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            block_time: Duration::from_millis(2000),
            max_block_size: 10 * 1024 * 1024,
            byzantine_tolerance: 1,
            consensus_enabled: true,
        }
    }
}

/// State of the consensus engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Engine constructed but `run` not yet called.
    Starting,
    /// Engine is actively participating in consensus.
    Active,
    /// Engine is stopped.
    Stopped,
}

/// Events emitted by the consensus engine.
#[derive(Debug, Clone)]
pub enum ConsensusEvent {
    /// A new block was proposed.
    BlockProposed {
        height: u64,
        producer: SerializablePublicKey,
        tx_count: usize,
    },
    /// A block was finalized (committed by quorum).
    BlockFinalized {
        height: u64,
        block_id: BlockId,
        tx_count: usize,
    },
    /// A proposed block was aborted (quorum `No`, or timeout).
    ProposalAborted { epoch: u64, block_id: BlockId },
    /// The epoch advanced to a new leader.
    EpochChanged {
        epoch: u64,
        leader: SerializablePublicKey,
    },
    /// Consensus state changed.
    StateChanged { old: EngineState, new: EngineState },
    /// A transaction was included in a finalized block.
    TransactionIncluded {
        tx_id: TransactionId,
        block_height: u64,
    },
}

/// Application interface for the consensus engine: the thing that actually
/// applies finalized transactions to mesh state.
#[async_trait]
pub trait ConsensusApplication: Send + Sync {
    /// Called when a block is finalized.
    async fn on_block_finalized(&self, block: &FinalizedBlock) -> Result<()>;

    /// Computes the state root after applying transactions.
    async fn compute_state_root(&self, transactions: &[Transaction]) -> Result<[u8; 32]>;

    /// Verifies that a transaction is valid for inclusion, beyond its
    /// signature (which the engine checks itself).
    async fn verify_transaction(&self, transaction: &Transaction) -> Result<()>;

    /// Gets the current finalized height.
    fn current_height(&self) -> u64;
}

/// A no-op application, useful for tests and single-node operation.
#[derive(Default)]
pub struct NoOpApplication {
    height: RwLock<u64>,
}

impl NoOpApplication {
    /// Creates a new no-op application.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConsensusApplication for NoOpApplication {
    async fn on_block_finalized(&self, block: &FinalizedBlock) -> Result<()> {
        *self.height.write() = block.height();
        Ok(())
    }

    async fn compute_state_root(&self, _transactions: &[Transaction]) -> Result<[u8; 32]> {
        Ok([0u8; 32])
    }

    async fn verify_transaction(&self, _transaction: &Transaction) -> Result<()> {
        Ok(())
    }

    fn current_height(&self) -> u64 {
        *self.height.read()
    }
}

/// The consensus engine.
pub struct ConsensusEngine {
    config: EngineConfig,
    keypair: Option<Keypair>,
    validators: RwLock<ValidatorSet>,
    mempool: Arc<Mempool>,
    blocks: RwLock<HashMap<u64, FinalizedBlock>>,
    pending: RwLock<HashMap<BlockId, Block>>,
    tally: RwLock<VoteTally>,
    committed_tx_ids: RwLock<HashSet<TransactionId>>,
    state: RwLock<EngineState>,
    epoch: RwLock<u64>,
    finalized_height: RwLock<u64>,
    events: broadcast::Sender<ConsensusEvent>,
    outbound: mpsc::UnboundedSender<ConsensusMessage>,
}

impl ConsensusEngine {
    /// Creates a new consensus engine and the channel it will send outbound
    /// [`ConsensusMessage`]s on.
    ///
    /// # Errors
    ///
    /// Returns [`ConsensusError::InsufficientValidators`] if `validators`
    /// does not satisfy `n >= 3 * config.byzantine_tolerance + 1` — the
    /// engine refuses to start below its configured fault tolerance floor.
    pub fn new(
        config: EngineConfig,
        keypair: Option<Keypair>,
        validators: ValidatorSet,
        mempool: Arc<Mempool>,
    ) -> Result<(Arc<Self>, mpsc::UnboundedReceiver<ConsensusMessage>)> {
        if !validators.meets_byzantine_threshold(config.byzantine_tolerance) {
            return Err(ConsensusError::InsufficientValidators {
                validators: validators.len(),
                faulty: config.byzantine_tolerance,
                required: 3 * config.byzantine_tolerance + 1,
            });
        }

        let (events, _) = broadcast::channel(1024);
        let (outbound, outbound_rx) = mpsc::unbounded_channel();

        let engine = Arc::new(Self {
            config,
            keypair,
            validators: RwLock::new(validators),
            mempool,
            blocks: RwLock::new(HashMap::new()),
            pending: RwLock::new(HashMap::new()),
            tally: RwLock::new(VoteTally::new()),
            committed_tx_ids: RwLock::new(HashSet::new()),
            state: RwLock::new(EngineState::Starting),
            epoch: RwLock::new(0),
            finalized_height: RwLock::new(0),
            events,
            outbound,
        });

        Ok((engine, outbound_rx))
    }

    /// Subscribes to consensus events.
    pub fn subscribe(&self) -> broadcast::Receiver<ConsensusEvent> {
        self.events.subscribe()
    }

    /// Returns the current engine state.
    #[must_use]
    pub fn state(&self) -> EngineState {
        *self.state.read()
    }

    /// Returns the current epoch.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        *self.epoch.read()
    }

    /// Returns the latest finalized height.
    #[must_use]
    pub fn finalized_height(&self) -> u64 {
        *self.finalized_height.read()
    }

    /// Returns the leader for the current epoch.
    #[must_use]
    pub fn current_leader(&self) -> Option<SerializablePublicKey> {
        self.validators
            .read()
            .leader_for_epoch(self.epoch())
            .map(|v| SerializablePublicKey::from_public_key(&v.public_key))
    }

    /// Whether this engine's own validator key is the current epoch's leader.
    #[must_use]
    pub fn is_leader(&self) -> bool {
        let Some(keypair) = &self.keypair else {
            return false;
        };
        let our_pubkey = SerializablePublicKey::from_public_key(&keypair.public_key());
        self.current_leader().as_ref() == Some(&our_pubkey)
    }

    /// Gets a finalized block by height.
    #[must_use]
    pub fn get_block(&self, height: u64) -> Option<FinalizedBlock> {
        self.blocks.read().get(&height).cloned()
    }

    /// Submits a transaction for inclusion: verifies its signature, rejects
    /// it if already committed, adds it to the mempool, and broadcasts it.
    ///
    /// # Errors
    ///
    /// Returns [`ConsensusError::InvalidSignature`] if the transaction's
    /// signature does not verify, or [`ConsensusError::DuplicateTransaction`]
    /// if it was already finalized or is already pending.
    pub fn submit_transaction(&self, tx: Transaction) -> Result<TransactionId> {
        tx.verify_signature()?;

        let id = tx.id();
        if self.committed_tx_ids.read().contains(&id) {
            return Err(ConsensusError::DuplicateTransaction(id.to_hex()));
        }

        let id = self.mempool.add(tx.clone())?;
        let _ = self
            .outbound
            .send(ConsensusMessage::Transaction(TransactionMessage { transaction: tx }));

        Ok(id)
    }

    /// Runs the consensus engine's round loop until the `shutdown` future
    /// resolves.
    pub async fn run<A: ConsensusApplication>(self: &Arc<Self>, app: Arc<A>) {
        self.set_state(EngineState::Active);

        let mut interval = tokio::time::interval(self.config.block_time);
        loop {
            interval.tick().await;
            self.mempool.reap_expired();
            self.expire_pending_for_epoch(self.epoch());
            self.advance_epoch();

            if self.config.consensus_enabled {
                if self.is_leader() {
                    if let Err(err) = self.propose_block(&app).await {
                        tracing::warn!(error = %err, "failed to propose block");
                    }
                }
            } else if let Err(err) = self.propose_and_finalize_locally(&app).await {
                tracing::warn!(error = %err, "failed to finalize block locally");
            }
        }
    }

    /// Handles a received consensus message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message fails validation (bad proposer, bad
    /// signature, invalid block) or if a downstream application call fails.
    pub async fn handle_message<A: ConsensusApplication>(
        &self,
        message: ConsensusMessage,
        app: &Arc<A>,
    ) -> Result<()> {
        match message {
            ConsensusMessage::Propose(propose) => self.handle_propose(propose, app).await,
            ConsensusMessage::Vote(vote) => self.handle_vote(vote, app).await,
            ConsensusMessage::Transaction(TransactionMessage { transaction }) => {
                transaction.verify_signature()?;
                app.verify_transaction(&transaction).await?;
                self.mempool.add(transaction)?;
                Ok(())
            }
            ConsensusMessage::SyncRequest(req) => self.handle_sync_request(&req),
            ConsensusMessage::SyncResponse(resp) => self.handle_sync_response(resp),
        }
    }

    fn handle_sync_request(&self, req: &SyncRequestMessage) -> Result<()> {
        let blocks: Vec<FinalizedBlock> = self
            .blocks
            .read()
            .iter()
            .filter(|(height, _)| **height > req.from_height && **height <= req.to_height)
            .map(|(_, block)| block.clone())
            .collect();
        let responder = self
            .keypair
            .as_ref()
            .map(|kp| SerializablePublicKey::from_public_key(&kp.public_key()))
            .unwrap_or_else(|| SerializablePublicKey::from_hex(String::new()));
        let _ = self
            .outbound
            .send(ConsensusMessage::SyncResponse(SyncResponseMessage { blocks, responder }));
        Ok(())
    }

    fn handle_sync_response(&self, resp: SyncResponseMessage) -> Result<()> {
        let mut blocks = self.blocks.write();
        for finalized in resp.blocks {
            blocks.entry(finalized.height()).or_insert(finalized);
        }
        Ok(())
    }

    async fn propose_block<A: ConsensusApplication>(&self, app: &Arc<A>) -> Result<()> {
        let keypair = self
            .keypair
            .as_ref()
            .ok_or_else(|| ConsensusError::EngineError("not a validator".into()))?;

        let transactions = self.mempool.get_for_proposal(self.config.max_block_size);
        if transactions.is_empty() {
            return Ok(());
        }

        let block = self.build_block(&transactions, app).await?;
        let producer = SerializablePublicKey::from_public_key(&keypair.public_key());
        let signature = SerializableSignature::from_signature(&keypair.sign(block.id().as_bytes()));

        self.pending.write().insert(block.id(), block.clone());

        let _ = self.events.send(ConsensusEvent::BlockProposed {
            height: block.height(),
            producer: producer.clone(),
            tx_count: block.tx_count(),
        });

        tracing::info!(height = block.height(), tx_count = block.tx_count(), block_id = %block.id(), "proposed block");

        let epoch = self.epoch();
        self.cast_vote(epoch, block.id(), Ballot::Yes, app).await?;

        let _ = self.outbound.send(ConsensusMessage::Propose(ProposeMessage {
            epoch,
            block,
            producer,
            signature,
        }));

        Ok(())
    }

    /// Single-node mode: build and finalize a block immediately, without a
    /// vote round.
    async fn propose_and_finalize_locally<A: ConsensusApplication>(&self, app: &Arc<A>) -> Result<()> {
        let transactions = self.mempool.get_for_proposal(self.config.max_block_size);
        if transactions.is_empty() {
            return Ok(());
        }
        let block = self.build_block(&transactions, app).await?;
        self.finalize_block(block, self.epoch(), vec![], app).await
    }

    async fn build_block<A: ConsensusApplication>(
        &self,
        transactions: &[Transaction],
        app: &Arc<A>,
    ) -> Result<Block> {
        let height = app.current_height() + 1;
        let parent = self
            .blocks
            .read()
            .get(&(height - 1))
            .map(FinalizedBlock::id)
            .unwrap_or(BlockId::GENESIS_PARENT);

        let state_root = app.compute_state_root(transactions).await?;
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        let producer = self
            .keypair
            .as_ref()
            .map(|kp| SerializablePublicKey::from_public_key(&kp.public_key()))
            .unwrap_or_else(|| SerializablePublicKey::from_hex(String::new()));

        Ok(Block::new(
            height,
            parent,
            self.epoch(),
            producer,
            timestamp,
            transactions.to_vec(),
            state_root,
        ))
    }

    async fn handle_propose<A: ConsensusApplication>(
        &self,
        propose: ProposeMessage,
        app: &Arc<A>,
    ) -> Result<()> {
        let leader = self.validators.read().leader_for_epoch(propose.epoch).map(|v| {
            SerializablePublicKey::from_public_key(&v.public_key)
        });
        if leader.as_ref() != Some(&propose.producer) {
            return Err(ConsensusError::InvalidBlock(format!(
                "proposer for epoch {} is not the designated leader",
                propose.epoch
            )));
        }

        if !propose.block.verify_tx_root() {
            return Err(ConsensusError::InvalidBlock("transaction root mismatch".into()));
        }

        for tx in &propose.block.transactions {
            tx.verify_signature()?;
            app.verify_transaction(tx).await?;
        }

        let block_id = propose.block.id();
        self.pending.write().insert(block_id, propose.block);

        let ballot = Ballot::Yes;
        self.cast_vote(propose.epoch, block_id, ballot, app).await
    }

    async fn cast_vote<A: ConsensusApplication>(
        &self,
        epoch: u64,
        block_id: BlockId,
        ballot: Ballot,
        app: &Arc<A>,
    ) -> Result<()> {
        let Some(keypair) = &self.keypair else {
            return Ok(());
        };
        if !self.validators.read().contains(&keypair.public_key()) {
            return Ok(());
        }

        let voter = SerializablePublicKey::from_public_key(&keypair.public_key());
        let mut vote = VoteMessage {
            epoch,
            block_id,
            ballot,
            voter,
            signature: SerializableSignature::from_hex(String::new()),
        };
        vote.signature = SerializableSignature::from_signature(&keypair.sign(&vote.signing_data()));

        self.record_and_check_quorum(vote.clone(), app).await?;
        let _ = self.outbound.send(ConsensusMessage::Vote(vote));
        Ok(())
    }

    async fn handle_vote<A: ConsensusApplication>(&self, vote: VoteMessage, app: &Arc<A>) -> Result<()> {
        let public_key = vote
            .voter
            .to_public_key()
            .map_err(|e| ConsensusError::InvalidSignature(e.to_string()))?;
        let signature = vote
            .signature
            .to_signature()
            .map_err(|e| ConsensusError::InvalidSignature(e.to_string()))?;
        public_key
            .verify(&vote.signing_data(), &signature)
            .map_err(|e| ConsensusError::InvalidSignature(e.to_string()))?;

        self.record_and_check_quorum(vote, app).await
    }

    async fn record_and_check_quorum<A: ConsensusApplication>(
        &self,
        vote: VoteMessage,
        app: &Arc<A>,
    ) -> Result<()> {
        let block_id = vote.block_id;
        let epoch = vote.epoch;
        let (yes, no, threshold) = {
            let mut tally = self.tally.write();
            tally.record(vote);
            let threshold = self.validators.read().quorum_threshold();
            (tally.yes_count(&block_id), tally.no_count(&block_id), threshold)
        };

        if yes >= threshold {
            if let Some(block) = self.pending.write().remove(&block_id) {
                let signatures = self.tally.read().yes_votes(&block_id);
                self.tally.write().clear(&block_id);
                self.finalize_block(block, epoch, signatures, app).await?;
            }
        } else if no >= threshold {
            self.pending.write().remove(&block_id);
            self.tally.write().clear(&block_id);
            let _ = self.events.send(ConsensusEvent::ProposalAborted { epoch, block_id });
            tracing::info!(%block_id, epoch, "proposal aborted by quorum no");
        }

        Ok(())
    }

    async fn finalize_block<A: ConsensusApplication>(
        &self,
        block: Block,
        epoch: u64,
        signatures: Vec<(SerializablePublicKey, SerializableSignature)>,
        app: &Arc<A>,
    ) -> Result<()> {
        let height = block.height();
        if self.blocks.read().contains_key(&height) {
            return Err(ConsensusError::InvalidStateTransition(format!(
                "height {height} already finalized"
            )));
        }
        if height != self.finalized_height() + 1 && height != 0 {
            return Err(ConsensusError::InvalidStateTransition(format!(
                "height {height} does not follow finalized height {}",
                self.finalized_height()
            )));
        }

        let block_id = block.id();
        let tx_count = block.tx_count();
        let tx_ids: Vec<TransactionId> = block.transaction_ids().collect();

        let finalized = FinalizedBlock::new(block, epoch, signatures);
        self.blocks.write().insert(height, finalized.clone());
        *self.finalized_height.write() = height;
        self.committed_tx_ids.write().extend(tx_ids.iter().copied());
        self.mempool.remove_batch(&tx_ids);

        app.on_block_finalized(&finalized).await?;

        let _ = self.events.send(ConsensusEvent::BlockFinalized {
            height,
            block_id,
            tx_count,
        });
        for tx_id in tx_ids {
            let _ = self
                .events
                .send(ConsensusEvent::TransactionIncluded { tx_id, block_height: height });
        }

        tracing::info!(height, tx_count, %block_id, "finalized block");
        Ok(())
    }

    fn expire_pending_for_epoch(&self, epoch: u64) {
        let stale: Vec<BlockId> = self
            .pending
            .read()
            .iter()
            .filter(|(_, block)| block.epoch() < epoch)
            .map(|(id, _)| *id)
            .collect();

        for block_id in stale {
            self.pending.write().remove(&block_id);
            self.tally.write().clear(&block_id);
            let _ = self
                .events
                .send(ConsensusEvent::ProposalAborted { epoch, block_id });
        }
    }

    fn advance_epoch(&self) {
        let new_epoch = {
            let mut epoch = self.epoch.write();
            *epoch += 1;
            *epoch
        };

        if let Some(leader) = self.current_leader() {
            let _ = self.events.send(ConsensusEvent::EpochChanged { epoch: new_epoch, leader });
        }
    }

    fn set_state(&self, new_state: EngineState) {
        let old_state = {
            let mut state = self.state.write();
            let old = *state;
            *state = new_state;
            old
        };
        if old_state != new_state {
            let _ = self.events.send(ConsensusEvent::StateChanged { old: old_state, new: new_state });
        }
    }

    /// Stops the engine (state bookkeeping only; callers should drop the
    /// `run` task to actually stop the round loop).
    pub fn stop(&self) {
        self.set_state(EngineState::Stopped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genesis::generate_devnet_genesis;
    use crate::mempool::MempoolConfig;
    use crate::transaction::AgentSpawn;
    use neuromesh_core::AgentId;

    fn test_tx(keypair: &Keypair, priority: u8) -> Transaction {
        let mut tx = Transaction::AgentSpawn {
            payload: AgentSpawn {
                agent_id: AgentId::generate(),
                architecture: vec![],
                target_node: None,
            },
            priority,
            submitter: SerializablePublicKey::from_public_key(&keypair.public_key()),
            signature: SerializableSignature::from_hex(String::new()),
        };
        let sig = keypair.sign(&tx.signable_bytes());
        if let Transaction::AgentSpawn { signature, .. } = &mut tx {
            *signature = SerializableSignature::from_signature(&sig);
        }
        tx
    }

    fn leader_keypair(genesis: &crate::genesis::Genesis, validators: &ValidatorSet) -> Keypair {
        let leader_pubkey = validators.leader_for_epoch(0).unwrap().public_key.clone();
        genesis
            .validators
            .iter()
            .enumerate()
            .find_map(|(i, gv)| {
                let kp = Keypair::from_seed(i as u64);
                (SerializablePublicKey::from_hex(gv.pubkey.clone())
                    .to_public_key()
                    .unwrap()
                    .as_bytes()
                    == leader_pubkey.as_bytes())
                .then_some(kp)
            })
            .expect("one seed must match the computed leader")
    }

    #[test]
    fn engine_refuses_to_start_below_byzantine_floor() {
        // Built directly (not via Genesis::validate, which enforces the
        // same floor) to exercise the engine's own check in isolation.
        let mut validators = ValidatorSet::new();
        validators.add(crate::validator::Validator::new(Keypair::from_seed(0).public_key(), 100));
        validators.add(crate::validator::Validator::new(Keypair::from_seed(1).public_key(), 100));
        let mempool = Arc::new(Mempool::new(MempoolConfig::default()));
        let config = EngineConfig {
            byzantine_tolerance: 1,
            ..Default::default()
        };

        let result = ConsensusEngine::new(config, None, validators, mempool);
        assert!(matches!(result, Err(ConsensusError::InsufficientValidators { .. })));
    }

    #[test]
    fn engine_starts_with_enough_validators() {
        let genesis = generate_devnet_genesis(4);
        let validators = genesis.into_validator_set().unwrap();
        let mempool = Arc::new(Mempool::new(MempoolConfig::default()));
        let config = EngineConfig::default();

        let (engine, _rx) = ConsensusEngine::new(config, None, validators, mempool).unwrap();
        assert_eq!(engine.state(), EngineState::Starting);
        assert_eq!(engine.epoch(), 0);
    }

    #[tokio::test]
    async fn submit_transaction_lands_in_mempool() {
        let genesis = generate_devnet_genesis(4);
        let validators = genesis.into_validator_set().unwrap();
        let mempool = Arc::new(Mempool::new(MempoolConfig::default()));
        let config = EngineConfig::default();

        let keypair = Keypair::from_seed(0);
        let (engine, _rx) = ConsensusEngine::new(config, Some(keypair.clone()), validators, mempool.clone()).unwrap();

        let tx = test_tx(&keypair, 1);
        let id = engine.submit_transaction(tx).unwrap();
        assert!(mempool.contains(&id));
    }

    #[tokio::test]
    async fn single_validator_commits_with_self_vote() {
        let genesis = generate_devnet_genesis(4);
        let validators = genesis.clone().into_validator_set().unwrap();
        let mempool = Arc::new(Mempool::new(MempoolConfig::default()));
        let config = EngineConfig::default();

        let leader_kp = leader_keypair(&genesis, &validators);
        let (engine, _rx) = ConsensusEngine::new(config, Some(leader_kp.clone()), validators, mempool.clone()).unwrap();
        assert!(engine.is_leader());

        let app = Arc::new(NoOpApplication::new());
        engine.submit_transaction(test_tx(&leader_kp, 5)).unwrap();
        engine.propose_block(&app).await.unwrap();

        // A lone validator's own Yes vote cannot reach a 4-validator quorum.
        assert_eq!(engine.finalized_height(), 0);
    }

    #[tokio::test]
    async fn local_mode_finalizes_without_a_vote_round() {
        let genesis = generate_devnet_genesis(4);
        let validators = genesis.into_validator_set().unwrap();
        let mempool = Arc::new(Mempool::new(MempoolConfig::default()));
        let config = EngineConfig {
            consensus_enabled: false,
            ..Default::default()
        };

        let keypair = Keypair::from_seed(0);
        let (engine, _rx) = ConsensusEngine::new(config, Some(keypair.clone()), validators, mempool).unwrap();
        let app = Arc::new(NoOpApplication::new());

        engine.submit_transaction(test_tx(&keypair, 1)).unwrap();
        engine.propose_and_finalize_locally(&app).await.unwrap();

        assert_eq!(engine.finalized_height(), 1);
    }
}
