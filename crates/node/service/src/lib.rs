//! Block storage pipeline service for the basalt node.
//!
//! The pipeline bridges validated chain headers to durable storage: validated
//! blocks arrive through the [`PendingBlocks`] buffer or are pulled on demand
//! through a [`BlockFetcher`], and the [`BlockStoreActor`] drains both paths
//! into atomic repository batches while tracking chain reorganizations.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod actors;
pub use actors::{
    BlockFetcher, BlockStoreActor, CancellableContext, ChainIndex, ChainStateHandle, Metrics,
    NodeActor, PendingBlocks, PendingEntry, StoreConfig, StoreError,
};

#[cfg(test)]
mod test_utils;
