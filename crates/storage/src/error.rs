use thiserror::Error;

/// Errors that may occur while interacting with block storage.
///
/// This enum is used across all implementations of the [`BlockStore`] trait.
///
/// [`BlockStore`]: crate::BlockStore
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying database reported an error. The batch that triggered it
    /// was not applied.
    #[error("database error: {0}")]
    Database(String),

    /// A stored record failed to decode.
    #[error("RLP decoding error: {0}")]
    Decode(#[from] alloy_rlp::Error),

    /// A stored record has an unexpected shape.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// A required column family is missing from the database handle.
    #[error("missing column family: {0}")]
    ColumnFamily(&'static str),

    /// The transaction-index setting does not match the store contents.
    ///
    /// Toggling the index against a store that has advanced past genesis would
    /// silently produce an incomplete index, so it is rejected outright.
    #[error("transaction index configured as {configured} but store was built with {stored}")]
    TxIndexMismatch {
        /// The setting the store was built with.
        stored: bool,
        /// The setting requested by the current run.
        configured: bool,
    },
}

impl From<rocksdb::Error> for StorageError {
    fn from(err: rocksdb::Error) -> Self {
        Self::Database(err.to_string())
    }
}
