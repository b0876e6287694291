//! [`NodeActor`] services for the node.
//!
//! The only actor implemented here is the block store actor; consensus,
//! networking, and mempool actors live in their own services and interact with
//! storage exclusively through the [`ChainIndex`], [`BlockFetcher`], and
//! [`PendingBlocks`] seams.

mod traits;
pub use traits::{CancellableContext, NodeActor};

mod store;
pub use store::{
    BlockFetcher, BlockStoreActor, ChainIndex, ChainStateHandle, Metrics, PendingBlocks,
    PendingEntry, StoreConfig, StoreError,
};
