//! The block store actor and its supporting structures.

mod actor;
pub use actor::BlockStoreActor;

mod config;
pub use config::StoreConfig;

mod error;
pub use error::StoreError;

mod chain_state;
pub use chain_state::ChainStateHandle;

mod pending;
pub use pending::{PendingBlocks, PendingEntry};

mod traits;
pub use traits::{BlockFetcher, ChainIndex};

mod metrics;
pub use metrics::Metrics;
