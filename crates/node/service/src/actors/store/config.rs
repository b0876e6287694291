//! Configuration for the block store actor.

use std::time::Duration;

/// Tuning knobs for the block store actor.
///
/// The defaults reproduce steady-state behavior on a mainnet-sized chain;
/// tests shrink them to exercise batching and throttling decisions.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Interval between recurring activations of the store loop.
    pub activation_interval: Duration,
    /// Delay before the first activation after startup.
    pub startup_delay: Duration,
    /// Upper bound on the serialized size of a single repository batch.
    ///
    /// A batch may overshoot by at most the size of the block that crossed
    /// the threshold.
    pub batch_size_bytes: usize,
    /// Minimum number of buffered pending blocks required before the pending
    /// drain path commits during initial sync. Skipped in flush mode.
    pub pending_trigger: usize,
    /// Maximum number of outstanding block-fetch requests.
    pub download_queue_cap: usize,
    /// Pause between size-bounded commits during initial sync, and between
    /// polls of an unavailable fetch target.
    pub retry_delay: Duration,
    /// Number of consecutive empty polls of the head-of-queue fetch target
    /// tolerated before the round is abandoned and retried on the next
    /// activation.
    pub fetch_stall_limit: usize,
    /// How far behind the highest-valid height the stored tip must be for the
    /// loop to consider itself in initial sync.
    pub ibd_threshold: u64,
    /// Whether the repository maintains the transaction index.
    pub index_transactions: bool,
}

impl StoreConfig {
    /// Default activation interval.
    pub const DEFAULT_ACTIVATION_INTERVAL: Duration = Duration::from_secs(1);
    /// Default startup delay.
    pub const DEFAULT_STARTUP_DELAY: Duration = Duration::from_secs(1);
    /// Default batch size bound in bytes.
    pub const DEFAULT_BATCH_SIZE_BYTES: usize = 5_000_000;
    /// Default pending-drain trigger count during initial sync.
    pub const DEFAULT_PENDING_TRIGGER: usize = 5;
    /// Default cap on outstanding fetch requests.
    pub const DEFAULT_DOWNLOAD_QUEUE_CAP: usize = 1_000;
    /// Default retry pause.
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);
    /// Default fetch stall limit.
    pub const DEFAULT_FETCH_STALL_LIMIT: usize = 100;
    /// Default initial-sync distance, roughly a day of ten-minute blocks.
    pub const DEFAULT_IBD_THRESHOLD: u64 = 144;
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            activation_interval: Self::DEFAULT_ACTIVATION_INTERVAL,
            startup_delay: Self::DEFAULT_STARTUP_DELAY,
            batch_size_bytes: Self::DEFAULT_BATCH_SIZE_BYTES,
            pending_trigger: Self::DEFAULT_PENDING_TRIGGER,
            download_queue_cap: Self::DEFAULT_DOWNLOAD_QUEUE_CAP,
            retry_delay: Self::DEFAULT_RETRY_DELAY,
            fetch_stall_limit: Self::DEFAULT_FETCH_STALL_LIMIT,
            ibd_threshold: Self::DEFAULT_IBD_THRESHOLD,
            index_transactions: false,
        }
    }
}
