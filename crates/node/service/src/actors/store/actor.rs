//! [`NodeActor`] implementation for the block storage pipeline.

use super::{BlockFetcher, ChainIndex, ChainStateHandle, PendingBlocks, StoreConfig, metrics};
use crate::{CancellableContext, NodeActor, StoreError};
use alloy_primitives::B256;
use async_trait::async_trait;
use basalt_primitives::{Block, ChainEntry};
use basalt_storage::BlockStore;
use std::{collections::VecDeque, sync::Arc};
use tokio::{
    select,
    time::{MissedTickBehavior, interval, sleep},
};
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{debug, error, info, trace, warn};

/// The actor that advances the stored tip toward the highest valid block.
///
/// Each activation runs the same state machine until no further progress can
/// be made: recognize blocks already durable, drain the pending buffer into
/// size-bounded batches, or drive the block fetcher — all while detecting
/// chain reorganizations beneath the stored cursor. Activations are serialized
/// on a recurring timer; `flush` runs the machine once in non-reorg mode for
/// shutdown.
#[derive(derive_more::Debug)]
pub struct BlockStoreActor {
    /// The durable repository. The actor is its only writer.
    #[debug(skip)]
    store: Arc<dyn BlockStore>,
    /// The best-chain index, owned by the validation engine.
    #[debug(skip)]
    index: Arc<dyn ChainIndex>,
    /// The network block fetcher.
    #[debug(skip)]
    fetcher: Arc<dyn BlockFetcher>,
    /// Buffer of validated, not-yet-persisted blocks.
    #[debug(skip)]
    pending: Arc<PendingBlocks>,
    /// Shared valid/persisted cursors.
    state: ChainStateHandle,
    /// Tuning knobs.
    config: StoreConfig,
    /// The genesis block, used for first-run setup.
    genesis: Block,
    /// The entry of the most recently durably stored block.
    stored_tip: ChainEntry,
    /// The cancellation token, shared between all tasks.
    cancellation: CancellationToken,
}

impl BlockStoreActor {
    /// Creates a new actor. [`Self::initialize`] must run before
    /// [`NodeActor::start`].
    pub fn new(
        store: Arc<dyn BlockStore>,
        index: Arc<dyn ChainIndex>,
        fetcher: Arc<dyn BlockFetcher>,
        pending: Arc<PendingBlocks>,
        state: ChainStateHandle,
        genesis: Block,
        config: StoreConfig,
        cancellation: CancellationToken,
    ) -> Self {
        let stored_tip = ChainEntry::new(genesis.hash(), genesis.header.parent_hash, 0);
        Self { store, index, fetcher, pending, state, config, genesis, stored_tip, cancellation }
    }

    /// Performs first-run genesis setup and startup repair.
    ///
    /// Creates the tip record on an empty repository, validates the
    /// transaction-index configuration, and — when the stored tip is no
    /// longer on the recognized chain — runs the reorg-rollback walk once
    /// before the recurring loop starts.
    pub fn initialize(&mut self) -> Result<(), StoreError> {
        self.store.initialize(&self.genesis)?;
        let tip = self.store.tip()?.ok_or(StoreError::Uninitialized)?;

        self.stored_tip = match self.index.entry_by_hash(&tip) {
            Some(entry) => entry,
            None => {
                warn!(
                    target: "block_store",
                    tip = %tip,
                    "Stored tip not on recognized chain, repairing before startup"
                );
                self.rollback_from(tip)?
            }
        };
        self.state.set_highest_persisted(self.stored_tip);

        info!(
            target: "block_store",
            tip = %self.stored_tip,
            tx_index = self.config.index_transactions,
            "Block store initialized"
        );
        Ok(())
    }

    /// Runs the state machine once in non-reorg mode, draining what the
    /// pending buffer holds. Called on shutdown; never rewinds and never
    /// fetches.
    pub async fn flush(&mut self) -> Result<(), StoreError> {
        debug!(target: "block_store", tip = %self.stored_tip, "Flushing block store");
        self.activation(true).await
    }

    fn is_ibd(&self, highest_valid: u64) -> bool {
        highest_valid.saturating_sub(self.stored_tip.height) > self.config.ibd_threshold
    }

    /// Sleeps for the retry delay. Returns `true` if cancelled mid-sleep.
    async fn pause(&self) -> bool {
        select! {
            _ = self.cancellation.cancelled() => true,
            _ = sleep(self.config.retry_delay) => false,
        }
    }

    /// Advances the in-memory stored tip and the shared persisted cursor.
    ///
    /// Only ever called after the corresponding tip update succeeded.
    fn advance(&mut self, entry: ChainEntry) {
        trace!(target: "block_store", tip = %entry, "Advanced stored tip");
        self.stored_tip = entry;
        self.state.set_highest_persisted(entry);
        metrics::record_height(entry.height);
    }

    /// Commits a forward-ordered batch ending at `tip` and advances cursors.
    fn commit(&mut self, blocks: &[Block], tip: ChainEntry) -> Result<(), StoreError> {
        self.store.put(tip.hash, blocks, self.config.index_transactions)?;
        debug!(
            target: "block_store",
            blocks = blocks.len(),
            tip = %tip,
            "Committed block batch"
        );
        metrics::record_commit(blocks.len());
        self.advance(tip);
        Ok(())
    }

    /// Walks backward from `tip` along stored parent pointers until reaching a
    /// hash the chain index still recognizes, deletes everything above it in
    /// one call, and returns the fork point.
    ///
    /// Walking past genesis without finding a fork point means the repository
    /// or the chain index is corrupt, which is fatal.
    fn rollback_from(&self, tip: B256) -> Result<ChainEntry, StoreError> {
        let mut removed = Vec::new();
        let mut cursor = tip;
        let fork = loop {
            if let Some(entry) = self.index.entry_by_hash(&cursor) {
                break entry;
            }
            let block = self.store.block(&cursor)?.ok_or(StoreError::MissingBlock(cursor))?;
            removed.push(cursor);
            if block.header.parent_hash == B256::ZERO {
                return Err(StoreError::ForkPointNotFound(tip));
            }
            cursor = block.header.parent_hash;
        };

        if !removed.is_empty() {
            warn!(
                target: "block_store",
                depth = removed.len(),
                fork = %fork,
                "Rolling back reorganized blocks"
            );
            self.store.delete(fork.hash, &removed)?;
            metrics::record_rollback(removed.len());
        }
        Ok(fork)
    }

    /// Reacts to a chain rewritten beneath the stored cursor.
    fn rollback(&mut self) -> Result<(), StoreError> {
        let fork = self.rollback_from(self.stored_tip.hash)?;
        self.stored_tip = fork;
        self.state.set_highest_persisted(fork);
        self.pending.prune_stale();
        Ok(())
    }

    /// One activation of the store loop state machine.
    ///
    /// Runs until no further progress can be made, or until cancellation is
    /// observed at a checkpoint. In `flush` mode reorg rollback and network
    /// fetching are disabled and the pending trigger gate is skipped.
    async fn activation(&mut self, flush: bool) -> Result<(), StoreError> {
        loop {
            if !flush && self.cancellation.is_cancelled() {
                return Ok(());
            }

            let highest_valid = self.state.highest_valid_height();
            if self.stored_tip.height >= highest_valid {
                return Ok(());
            }

            let Some(next) = self.index.entry_at(self.stored_tip.height + 1) else {
                return Ok(());
            };

            if next.parent_hash != self.stored_tip.hash {
                if flush {
                    debug!(
                        target: "block_store",
                        tip = %self.stored_tip,
                        "Chain rewritten beneath stored tip during flush, abandoning"
                    );
                    return Ok(());
                }
                self.rollback()?;
                continue;
            }

            // A block already durable never gets rewritten.
            if self.store.contains(&next.hash)? {
                self.store.set_tip(next.hash)?;
                self.advance(next);
                continue;
            }

            // A buffered block always takes priority over re-fetching it.
            if self.pending.contains(&next.hash) {
                if self.drain_pending(next, highest_valid, flush).await? {
                    continue;
                }
                return Ok(());
            }

            if flush {
                return Ok(());
            }

            if !self.fetch_blocks(next, highest_valid).await? {
                return Ok(());
            }
        }
    }

    /// Drains consecutive pending entries starting at `next` into size-bounded
    /// batches.
    ///
    /// Returns `false` when the initial-sync trigger gate defers the drain to
    /// a later activation.
    async fn drain_pending(
        &mut self,
        next: ChainEntry,
        highest_valid: u64,
        flush: bool,
    ) -> Result<bool, StoreError> {
        let ibd = self.is_ibd(highest_valid);
        if ibd && !flush && self.pending.len() < self.config.pending_trigger {
            trace!(
                target: "block_store",
                buffered = self.pending.len(),
                trigger = self.config.pending_trigger,
                "Waiting for pending trigger before draining"
            );
            return Ok(false);
        }

        let mut batch = Vec::new();
        let mut batch_bytes = 0usize;
        let mut last = self.stored_tip;
        let mut target = Some(next);

        loop {
            let Some(entry) = target else { break };
            if entry.height > highest_valid || entry.parent_hash != last.hash {
                break;
            }
            let Some(pending) = self.pending.take(&entry.hash) else { break };

            batch_bytes += pending.block.encoded_size();
            batch.push(pending.block);
            last = entry;

            if batch_bytes >= self.config.batch_size_bytes {
                self.commit(&batch, last)?;
                batch.clear();
                batch_bytes = 0;
                // Throttle write amplification while catching up.
                if ibd && !flush && self.pause().await {
                    return Ok(true);
                }
            }

            target = self.index.entry_at(last.height + 1);
        }

        if !batch.is_empty() {
            self.commit(&batch, last)?;
        }
        Ok(true)
    }

    /// Drives the block fetcher from `next` forward, keeping up to the queue
    /// cap outstanding and committing completed downloads in request order.
    ///
    /// Returns `false` when no progress was made, so the activation ends and
    /// the same target is retried on the next schedule.
    async fn fetch_blocks(
        &mut self,
        next: ChainEntry,
        highest_valid: u64,
    ) -> Result<bool, StoreError> {
        let mut queue: VecDeque<ChainEntry> = VecDeque::new();
        let mut ask = Some(next);
        let mut batch = Vec::new();
        let mut batch_bytes = 0usize;
        let mut last = self.stored_tip;
        let mut committed = false;
        let mut stalls = 0usize;

        loop {
            // Keep the request window full while there is room and the chain
            // keeps providing contiguous targets below the valid cursor.
            while queue.len() < self.config.download_queue_cap {
                let Some(entry) = ask else { break };
                if entry.height > highest_valid || self.pending.contains(&entry.hash) {
                    ask = None;
                    break;
                }
                self.fetcher.request(&entry);
                queue.push_back(entry);
                ask = self
                    .index
                    .entry_at(entry.height + 1)
                    .filter(|n| n.parent_hash == entry.hash);
            }

            let Some(head) = queue.front().copied() else { break };

            if self.cancellation.is_cancelled() {
                break;
            }

            // A reorg may have stranded the queue; completed downloads for
            // abandoned forks are stale data, not errors.
            if self.index.entry_at(head.height).map(|e| e.hash) != Some(head.hash) {
                debug!(
                    target: "block_store",
                    block = %head,
                    "Fetch target no longer on recognized chain, abandoning round"
                );
                break;
            }

            match self.fetcher.poll(&head) {
                Some(bytes) => {
                    let block = match Block::decode(&bytes) {
                        Ok(block) if block.hash() == head.hash => block,
                        Ok(_) | Err(_) => {
                            warn!(
                                target: "block_store",
                                block = %head,
                                "Fetched bytes do not match requested block, re-requesting"
                            );
                            self.fetcher.request(&head);
                            stalls += 1;
                            if stalls > self.config.fetch_stall_limit || self.pause().await {
                                break;
                            }
                            continue;
                        }
                    };

                    stalls = 0;
                    queue.pop_front();
                    batch_bytes += block.encoded_size();
                    batch.push(block);
                    last = head;

                    if batch_bytes >= self.config.batch_size_bytes {
                        self.commit(&batch, last)?;
                        committed = true;
                        batch.clear();
                        batch_bytes = 0;
                    }
                }
                None => {
                    stalls += 1;
                    if stalls > self.config.fetch_stall_limit {
                        debug!(
                            target: "block_store",
                            block = %head,
                            "Fetcher stalled, deferring to next activation"
                        );
                        break;
                    }
                    if self.pause().await {
                        break;
                    }
                }
            }
        }

        if !batch.is_empty() {
            self.commit(&batch, last)?;
            committed = true;
        }
        Ok(committed)
    }
}

#[async_trait]
impl NodeActor for BlockStoreActor {
    type Error = StoreError;
    type StartData = ();

    /// Start the recurring activation loop.
    ///
    /// After the startup delay the state machine runs once per interval.
    /// Transient errors are logged and retried on the next activation; fatal
    /// invariant violations terminate the actor. On cancellation a final
    /// non-reorg flush drains what the pending buffer holds.
    async fn start(mut self, _: Self::StartData) -> Result<(), Self::Error> {
        let cancel = self.cancellation.clone();

        select! {
            _ = cancel.cancelled() => return Ok(()),
            _ = sleep(self.config.startup_delay) => {}
        }

        let mut ticker = interval(self.config.activation_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            target: "block_store",
            interval = ?self.config.activation_interval,
            "Starting block store actor"
        );

        loop {
            select! {
                _ = cancel.cancelled() => {
                    info!(
                        target: "block_store",
                        "Received shutdown signal, flushing pending blocks"
                    );
                    return self.flush().await;
                }
                _ = ticker.tick() => {
                    if let Err(err) = self.activation(false).await {
                        if err.is_fatal() {
                            error!(
                                target: "block_store",
                                %err,
                                "Unrecoverable block store error, stopping"
                            );
                            return Err(err);
                        }
                        warn!(
                            target: "block_store",
                            %err,
                            "Store activation failed, will retry"
                        );
                    }
                }
            }
        }
    }
}

impl CancellableContext for BlockStoreActor {
    fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancellation.cancelled()
    }
}
