//! RocksDB-backed [`BlockStore`] implementation.

use crate::{BlockStore, StorageError};
use alloy_primitives::B256;
use basalt_primitives::Block;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, DBCompressionType, Options, WriteBatch};
use std::{
    path::Path,
    sync::{Mutex, MutexGuard, PoisonError},
};
use tracing::{debug, info};

/// Column family for full blocks, keyed by block hash.
const CF_BLOCKS: &str = "blocks";
/// Column family for the transaction index, `tx hash → owning block hash`.
const CF_TX_INDEX: &str = "tx_index";
/// Column family for singleton metadata records.
const CF_META: &str = "meta";

/// Metadata key for the stored-tip record.
const TIP_KEY: &[u8] = b"tip";
/// Metadata key for the transaction-index marker.
const TX_INDEX_KEY: &[u8] = b"tx_index";

/// A [`BlockStore`] backed by a RocksDB database.
///
/// Blocks, the transaction index, and metadata live in separate column
/// families. Every mutating call builds a [`WriteBatch`] and commits it in one
/// write, serialized behind an internal mutex so there is a single logical
/// writer at a time.
#[derive(Debug)]
pub struct RocksBlockStore {
    db: DB,
    index_transactions: bool,
    write_lock: Mutex<()>,
}

impl RocksBlockStore {
    /// Creates or opens a database at the given path.
    ///
    /// `index_transactions` controls whether [`BlockStore::put`] maintains the
    /// transaction index; the setting is validated against the store contents
    /// by [`BlockStore::initialize`].
    pub fn open(path: &Path, index_transactions: bool) -> Result<Self, StorageError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_compression_type(DBCompressionType::Snappy);

        let cfs = [CF_BLOCKS, CF_TX_INDEX, CF_META]
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()));
        let db = DB::open_cf_descriptors(&opts, path, cfs)?;

        Ok(Self { db, index_transactions, write_lock: Mutex::new(()) })
    }

    fn cf(&self, name: &'static str) -> Result<&ColumnFamily, StorageError> {
        self.db.cf_handle(name).ok_or(StorageError::ColumnFamily(name))
    }

    fn writer(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_tx_index_marker(&self) -> Result<Option<bool>, StorageError> {
        let meta = self.cf(CF_META)?;
        Ok(self.db.get_pinned_cf(meta, TX_INDEX_KEY)?.map(|raw| raw.as_ref() == [1]))
    }
}

impl BlockStore for RocksBlockStore {
    fn initialize(&self, genesis: &Block) -> Result<(), StorageError> {
        let _guard = self.writer();

        let Some(tip) = self.tip()? else {
            let genesis_hash = genesis.hash();
            let mut batch = WriteBatch::default();
            batch.put_cf(self.cf(CF_BLOCKS)?, genesis_hash, genesis.encoded());
            batch.put_cf(self.cf(CF_META)?, TIP_KEY, genesis_hash);
            batch.put_cf(self.cf(CF_META)?, TX_INDEX_KEY, [self.index_transactions as u8]);
            self.db.write(batch)?;
            info!(
                target: "block_store",
                genesis = %genesis_hash,
                tx_index = self.index_transactions,
                "Initialized fresh block store"
            );
            return Ok(());
        };

        let stored = self.read_tx_index_marker()?.unwrap_or(false);
        if stored != self.index_transactions {
            if tip != genesis.hash() {
                return Err(StorageError::TxIndexMismatch {
                    stored,
                    configured: self.index_transactions,
                });
            }
            // Nothing beyond genesis has been indexed, so the marker can
            // simply be rewritten.
            self.db.put_cf(self.cf(CF_META)?, TX_INDEX_KEY, [self.index_transactions as u8])?;
            info!(
                target: "block_store",
                tx_index = self.index_transactions,
                "Rewrote transaction-index marker on genesis-only store"
            );
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

        let _guard = self.writer();
        let blocks_cf = self.cf(CF_BLOCKS)?;
        let tx_cf = self.cf(CF_TX_INDEX)?;

        let mut batch = WriteBatch::default();
        let mut inserted = 0usize;
        for block in blocks {
            let hash = block.hash();
            if self.db.get_pinned_cf(blocks_cf, hash)?.is_some() {
                debug!(target: "block_store", block = %hash, "Skipping re-insert of stored block");
                continue;
            }
            batch.put_cf(blocks_cf, hash, block.encoded());
            if self.index_transactions {
                for tx in &block.transactions {
                    batch.put_cf(tx_cf, tx.hash(), hash);
                }
            }
            inserted += 1;
        }
        batch.put_cf(self.cf(CF_META)?, TIP_KEY, next_tip);
        self.db.write(batch)?;

        debug!(
            target: "block_store",
            inserted,
            batch_len = blocks.len(),
            tip = %next_tip,
            "Committed block batch"
        );
        Ok(())
    }

    fn block(&self, hash: &B256) -> Result<Option<Block>, StorageError> {
        let Some(raw) = self.db.get_pinned_cf(self.cf(CF_BLOCKS)?, hash)? else {
            return Ok(None);
        };
        Ok(Some(Block::decode(raw.as_ref())?))
    }

    fn contains(&self, hash: &B256) -> Result<bool, StorageError> {
        Ok(self.db.get_pinned_cf(self.cf(CF_BLOCKS)?, hash)?.is_some())
    }

    fn transaction_owner(&self, tx_hash: &B256) -> Result<Option<B256>, StorageError> {
        let Some(raw) = self.db.get_pinned_cf(self.cf(CF_TX_INDEX)?, tx_hash)? else {
            return Ok(None);
        };
        let owner = B256::try_from(raw.as_ref())
            .map_err(|_| StorageError::Corrupt("transaction-index value length".to_string()))?;
        Ok(Some(owner))
    }

    fn delete(&self, new_tip: B256, hashes: &[B256]) -> Result<(), StorageError> {
        let _guard = self.writer();
        let blocks_cf = self.cf(CF_BLOCKS)?;
        let tx_cf = self.cf(CF_TX_INDEX)?;

        let mut batch = WriteBatch::default();
        for hash in hashes {
            if self.index_transactions {
                if let Some(block) = self.block(hash)? {
                    for tx in &block.transactions {
                        batch.delete_cf(tx_cf, tx.hash());
                    }
                }
            }
            batch.delete_cf(blocks_cf, hash);
        }
        batch.put_cf(self.cf(CF_META)?, TIP_KEY, new_tip);
        self.db.write(batch)?;

        info!(
            target: "block_store",
            removed = hashes.len(),
            tip = %new_tip,
            "Rolled back block store"
        );
        Ok(())
    }

    fn set_tip(&self, hash: B256) -> Result<(), StorageError> {
        let _guard = self.writer();
        self.db.put_cf(self.cf(CF_META)?, TIP_KEY, hash)?;
        Ok(())
    }

    fn tip(&self) -> Result<Option<B256>, StorageError> {
        let Some(raw) = self.db.get_pinned_cf(self.cf(CF_META)?, TIP_KEY)? else {
            return Ok(None);
        };
        let tip = B256::try_from(raw.as_ref())
            .map_err(|_| StorageError::Corrupt("tip record length".to_string()))?;
        Ok(Some(tip))
    }
}
