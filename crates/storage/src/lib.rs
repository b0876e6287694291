//! Durable block storage for the basalt node.
//!
//! The [`BlockStore`] trait is the single seam between the storage pipeline and
//! its persistence backend. [`RocksBlockStore`] is the production
//! implementation; [`MemoryBlockStore`] mirrors its semantics in memory for
//! tests of components layered on top.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod error;
pub use error::StorageError;

mod traits;
pub use traits::BlockStore;

mod rocks;
pub use rocks::RocksBlockStore;

mod mem;
pub use mem::MemoryBlockStore;
