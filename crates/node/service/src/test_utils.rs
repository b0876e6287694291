//! Shared fakes for block-store actor tests.

use crate::{BlockFetcher, ChainIndex};
use alloy_primitives::B256;
use basalt_primitives::{Block, BlockHeader, ChainEntry, Transaction};
use bytes::Bytes;
use basalt_storage::{BlockStore, MemoryBlockStore, StorageError};
use dashmap::DashMap;
use std::sync::{
    Mutex, PoisonError, RwLock,
    atomic::{AtomicUsize, Ordering},
};

fn make_block(parent_hash: B256, height: u64, seed: u64) -> Block {
    let nonce = (seed << 32) | height;
    Block {
        header: BlockHeader {
            parent_hash,
            state_root: B256::ZERO,
            transactions_root: B256::ZERO,
            timestamp: height * 600,
            nonce,
        },
        transactions: vec![Transaction::new(nonce.to_be_bytes().to_vec())],
    }
}

/// A contiguous chain of blocks starting at a genesis at height 0.
pub(crate) struct TestChain {
    blocks: Vec<Block>,
}

impl TestChain {
    /// Builds a chain of `len` blocks (genesis included). `seed` makes chains
    /// with the same shape but distinct hashes.
    pub(crate) fn new(len: usize, seed: u64) -> Self {
        let mut blocks = Vec::with_capacity(len);
        let mut parent = B256::ZERO;
        for height in 0..len as u64 {
            let block = make_block(parent, height, seed);
            parent = block.hash();
            blocks.push(block);
        }
        Self { blocks }
    }

    /// Returns a chain sharing heights `0..fork_height` with `self`, with
    /// `total_len` blocks overall and a different `seed` above the fork.
    pub(crate) fn fork_at(&self, fork_height: u64, seed: u64, total_len: usize) -> Self {
        let mut blocks: Vec<Block> = self.blocks[..fork_height as usize].to_vec();
        let mut parent = blocks.last().map(|b| b.hash()).unwrap_or(B256::ZERO);
        for height in fork_height..total_len as u64 {
            let block = make_block(parent, height, seed);
            parent = block.hash();
            blocks.push(block);
        }
        Self { blocks }
    }

    pub(crate) fn block(&self, height: u64) -> &Block {
        &self.blocks[height as usize]
    }

    pub(crate) fn blocks(&self, range: std::ops::RangeInclusive<u64>) -> Vec<Block> {
        range.map(|h| self.block(h).clone()).collect()
    }

    pub(crate) fn entry(&self, height: u64) -> ChainEntry {
        let block = self.block(height);
        ChainEntry::new(block.hash(), block.header.parent_hash, height)
    }

    pub(crate) fn tip_height(&self) -> u64 {
        self.blocks.len() as u64 - 1
    }

    pub(crate) fn genesis(&self) -> &Block {
        &self.blocks[0]
    }
}

/// A [`ChainIndex`] over a swappable [`TestChain`], so tests can grow or
/// reorganize the recognized chain mid-run.
pub(crate) struct TestChainIndex {
    entries: RwLock<Vec<ChainEntry>>,
}

impl TestChainIndex {
    pub(crate) fn new(chain: &TestChain) -> Self {
        let index = Self { entries: RwLock::new(Vec::new()) };
        index.set_chain(chain);
        index
    }

    /// Replaces the recognized chain.
    pub(crate) fn set_chain(&self, chain: &TestChain) {
        let entries = (0..=chain.tip_height()).map(|h| chain.entry(h)).collect();
        *self.entries.write().unwrap_or_else(PoisonError::into_inner) = entries;
    }
}

impl ChainIndex for TestChainIndex {
    fn entry_at(&self, height: u64) -> Option<ChainEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(height as usize)
            .copied()
    }

    fn entry_by_hash(&self, hash: &B256) -> Option<ChainEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|entry| entry.hash == *hash)
            .copied()
    }
}

/// A [`BlockFetcher`] serving from a preloaded set of block bytes, tracking
/// request order and the high-water mark of in-flight requests.
#[derive(Default)]
pub(crate) struct TestFetcher {
    available: DashMap<B256, Bytes>,
    requests: Mutex<Vec<B256>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl TestFetcher {
    /// Makes a block's bytes available for download.
    pub(crate) fn make_available(&self, block: &Block) {
        self.available.insert(block.hash(), Bytes::from(block.encoded()));
    }

    /// Makes arbitrary bytes available under a hash, for corruption tests.
    pub(crate) fn make_available_raw(&self, hash: B256, bytes: Bytes) {
        self.available.insert(hash, bytes);
    }

    /// All requests issued, in order, duplicates included.
    pub(crate) fn requests(&self) -> Vec<B256> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// The largest number of requests that were in flight at once.
    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl BlockFetcher for TestFetcher {
    fn request(&self, entry: &ChainEntry) {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).push(entry.hash);
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);
    }

    fn poll(&self, entry: &ChainEntry) -> Option<Bytes> {
        let (_, bytes) = self.available.remove(&entry.hash)?;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Some(bytes)
    }
}

/// A [`BlockStore`] delegating to [`MemoryBlockStore`] while recording the
/// shape of every `put` batch, so tests can assert batching decisions.
#[derive(Debug)]
pub(crate) struct RecordingStore {
    inner: MemoryBlockStore,
    puts: Mutex<Vec<(usize, usize)>>,
}

impl RecordingStore {
    pub(crate) fn new(index_transactions: bool) -> Self {
        Self { inner: MemoryBlockStore::new(index_transactions), puts: Mutex::new(Vec::new()) }
    }

    /// `(block count, serialized bytes)` per `put` call, in commit order.
    pub(crate) fn put_batches(&self) -> Vec<(usize, usize)> {
        self.puts.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn fail_next_write(&self) {
        self.inner.fail_next_write();
    }
}

impl BlockStore for RecordingStore {
    fn initialize(&self, genesis: &Block) -> Result<(), StorageError> {
        self.inner.initialize(genesis)
    }

    fn put(
        &self,
        next_tip: B256,
        blocks: &[Block],
        index_transactions: bool,
    ) -> Result<(), StorageError> {
        self.inner.put(next_tip, blocks, index_transactions)?;
        let bytes = blocks.iter().map(Block::encoded_size).sum();
        self.puts.lock().unwrap_or_else(PoisonError::into_inner).push((blocks.len(), bytes));
        Ok(())
    }

    fn block(&self, hash: &B256) -> Result<Option<Block>, StorageError> {
        self.inner.block(hash)
    }

    fn contains(&self, hash: &B256) -> Result<bool, StorageError> {
        self.inner.contains(hash)
    }

    fn transaction_owner(&self, tx_hash: &B256) -> Result<Option<B256>, StorageError> {
        self.inner.transaction_owner(tx_hash)
    }

    fn delete(&self, new_tip: B256, hashes: &[B256]) -> Result<(), StorageError> {
        self.inner.delete(new_tip, hashes)
    }

    fn set_tip(&self, hash: B256) -> Result<(), StorageError> {
        self.inner.set_tip(hash)
    }

    fn tip(&self) -> Result<Option<B256>, StorageError> {
        self.inner.tip()
    }
}
