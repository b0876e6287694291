//! Metric names and recording helpers for the block store actor.

/// Container for block-store metric names.
#[derive(Debug, Clone, Copy)]
pub struct Metrics;

impl Metrics {
    /// Gauge: height of the most recently persisted block.
    pub const STORED_HEIGHT: &'static str = "basalt_store_height";
    /// Counter: total batches committed to the repository.
    pub const BATCHES_COMMITTED: &'static str = "basalt_store_batches_total";
    /// Counter: total blocks written to the repository.
    pub const BLOCKS_STORED: &'static str = "basalt_store_blocks_total";
    /// Counter: total blocks removed by reorg rollback.
    pub const BLOCKS_ROLLED_BACK: &'static str = "basalt_store_rollback_blocks_total";
    /// Gauge: depth of the most recent reorg rollback.
    pub const REORG_DEPTH: &'static str = "basalt_store_reorg_depth";
    /// Gauge: current pending-buffer occupancy.
    pub const PENDING_BLOCKS: &'static str = "basalt_store_pending_blocks";
}

/// Records the stored-height gauge after the cursor advances.
pub(super) fn record_height(height: u64) {
    metrics::gauge!(Metrics::STORED_HEIGHT).set(height as f64);
}

/// Records one repository commit of `blocks` blocks.
pub(super) fn record_commit(blocks: usize) {
    metrics::counter!(Metrics::BATCHES_COMMITTED).increment(1);
    metrics::counter!(Metrics::BLOCKS_STORED).increment(blocks as u64);
}

/// Records a reorg rollback of `depth` blocks.
pub(super) fn record_rollback(depth: usize) {
    metrics::gauge!(Metrics::REORG_DEPTH).set(depth as f64);
    metrics::counter!(Metrics::BLOCKS_ROLLED_BACK).increment(depth as u64);
}

/// Records the current pending-buffer occupancy.
pub(super) fn record_pending(len: usize) {
    metrics::gauge!(Metrics::PENDING_BLOCKS).set(len as f64);
}
