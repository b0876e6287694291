//! In-memory [`BlockStore`] used by tests of components layered on storage.

use crate::{BlockStore, StorageError};
use alloy_primitives::B256;
use basalt_primitives::Block;
use std::{
    collections::HashMap,
    sync::{
        PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
        atomic::{AtomicBool, Ordering},
    },
};

#[derive(Debug, Default)]
struct Inner {
    blocks: HashMap<B256, Vec<u8>>,
    tx_index: HashMap<B256, B256>,
    tip: Option<B256>,
    tx_index_marker: Option<bool>,
}

/// An in-memory [`BlockStore`] with the same semantics as the RocksDB-backed
/// store: atomic batches, idempotent inserts, and the transaction-index
/// configuration check.
///
/// [`Self::fail_next_write`] arms a one-shot injected failure so callers can
/// exercise their transient-error handling; the failed batch leaves the store
/// untouched, matching the durability contract.
#[derive(Debug, Default)]
pub struct MemoryBlockStore {
    inner: RwLock<Inner>,
    index_transactions: bool,
    fail_next: AtomicBool,
}

impl MemoryBlockStore {
    /// Creates an empty store with the given transaction-index setting.
    pub fn new(index_transactions: bool) -> Self {
        Self { index_transactions, ..Self::default() }
    }

    /// Arms a one-shot failure: the next mutating call returns a database
    /// error without applying its batch.
    pub fn fail_next_write(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Returns the number of stored blocks.
    pub fn block_count(&self) -> usize {
        self.read().blocks.len()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StorageError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StorageError::Database("injected write failure".to_string()));
        }
        Ok(self.inner.write().unwrap_or_else(PoisonError::into_inner))
    }
}

impl BlockStore for MemoryBlockStore {
    fn initialize(&self, genesis: &Block) -> Result<(), StorageError> {
        let mut inner = self.write()?;

        let Some(tip) = inner.tip else {
            let genesis_hash = genesis.hash();
            inner.blocks.insert(genesis_hash, genesis.encoded());
            inner.tip = Some(genesis_hash);
            inner.tx_index_marker = Some(self.index_transactions);
            return Ok(());
        };

        let stored = inner.tx_index_marker.unwrap_or(false);
        if stored != self.index_transactions {
            if tip != genesis.hash() {
                return Err(StorageError::TxIndexMismatch {
                    stored,
                    configured: self.index_transactions,
                });
            }
            inner.tx_index_marker = Some(self.index_transactions);
        }
        Ok(())
    }

    fn put(
        &self,
        next_tip: B256,
        blocks: &[Block],
        index_transactions: bool,
    ) -> Result<(), StorageError> {
        if index_transactions != self.index_transactions {
            return Err(StorageError::TxIndexMismatch {
                stored: self.index_transactions,
                configured: index_transactions,
            });
        }

        let mut inner = self.write()?;
        for block in blocks {
            let hash = block.hash();
            if inner.blocks.contains_key(&hash) {
                continue;
            }
            inner.blocks.insert(hash, block.encoded());
            if self.index_transactions {
                for tx in &block.transactions {
                    inner.tx_index.insert(tx.hash(), hash);
                }
            }
        }
        inner.tip = Some(next_tip);
        Ok(())
    }

    fn block(&self, hash: &B256) -> Result<Option<Block>, StorageError> {
        let inner = self.read();
        let Some(raw) = inner.blocks.get(hash) else { return Ok(None) };
        Ok(Some(Block::decode(raw)?))
    }

    fn contains(&self, hash: &B256) -> Result<bool, StorageError> {
        Ok(self.read().blocks.contains_key(hash))
    }

    fn transaction_owner(&self, tx_hash: &B256) -> Result<Option<B256>, StorageError> {
        Ok(self.read().tx_index.get(tx_hash).copied())
    }

    fn delete(&self, new_tip: B256, hashes: &[B256]) -> Result<(), StorageError> {
        let mut inner = self.write()?;

        // Decode up front so a corrupt record aborts before any mutation.
        let mut removed_txs = Vec::new();
        if self.index_transactions {
            for hash in hashes {
                if let Some(raw) = inner.blocks.get(hash) {
                    let block = Block::decode(raw)?;
                    removed_txs.extend(block.transactions.iter().map(|tx| tx.hash()));
                }
            }
        }

        for hash in hashes {
            inner.blocks.remove(hash);
        }
        for tx_hash in &removed_txs {
            inner.tx_index.remove(tx_hash);
        }
        inner.tip = Some(new_tip);
        Ok(())
    }

    fn set_tip(&self, hash: B256) -> Result<(), StorageError> {
        self.write()?.tip = Some(hash);
        Ok(())
    }

    fn tip(&self) -> Result<Option<B256>, StorageError> {
        Ok(self.read().tip)
    }
}
