//! Core block, transaction, and chain-entry types shared across the basalt node.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod block;
pub use block::{Block, BlockHeader, Transaction};

mod entry;
pub use entry::ChainEntry;
