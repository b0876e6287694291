//! Contains the node CLI.

use crate::chain::{IdleFetcher, StaticChainIndex, dev_genesis};
use anyhow::Result;
use basalt_node_service::{
    BlockStoreActor, ChainStateHandle, NodeActor, PendingBlocks, StoreConfig,
};
use basalt_primitives::ChainEntry;
use basalt_storage::RocksBlockStore;
use clap::{ArgAction, Parser};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::{path::PathBuf, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// The basalt node CLI.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about = "Basalt full node", long_about = None)]
pub(crate) struct Cli {
    /// Verbosity level (0-2)
    #[arg(long, short, action = ArgAction::Count)]
    pub v: u8,
    /// Data directory for the block store.
    #[arg(long, default_value = ".basalt", env = "BASALT_DATADIR")]
    pub datadir: PathBuf,
    /// Maintain the transaction index (`tx hash → owning block hash`).
    #[arg(long, env = "BASALT_TXINDEX")]
    pub txindex: bool,
    /// Upper bound on the serialized size of one repository batch, in bytes.
    #[arg(long, default_value_t = StoreConfig::DEFAULT_BATCH_SIZE_BYTES)]
    pub batch_size: usize,
    /// Cap on outstanding block-fetch requests.
    #[arg(long, default_value_t = StoreConfig::DEFAULT_DOWNLOAD_QUEUE_CAP)]
    pub download_queue_cap: usize,
    /// Port for the Prometheus metrics listener.
    #[arg(long, default_value_t = 9090)]
    pub metrics_port: u16,
}

impl Cli {
    /// Runs the CLI.
    pub(crate) fn run(self) -> Result<()> {
        self.init_stack()?;
        tokio::runtime::Builder::new_multi_thread().enable_all().build()?.block_on(self.start())
    }

    /// Initialize the tracing stack and Prometheus metrics recorder.
    fn init_stack(&self) -> Result<()> {
        let default_level = match self.v {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        tracing_subscriber::fmt().with_env_filter(filter).init();

        PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], self.metrics_port))
            .install()?;
        Ok(())
    }

    /// Starts the node and runs until ctrl-c.
    async fn start(self) -> Result<()> {
        let genesis = dev_genesis();
        let store = Arc::new(RocksBlockStore::open(&self.datadir.join("blocks"), self.txindex)?);
        let index = Arc::new(StaticChainIndex::new(&genesis));
        let fetcher = Arc::new(IdleFetcher);
        let state = ChainStateHandle::new(ChainEntry::new(
            genesis.hash(),
            genesis.header.parent_hash,
            0,
        ));
        let pending = Arc::new(PendingBlocks::new(index.clone(), state.clone()));

        let config = StoreConfig {
            batch_size_bytes: self.batch_size,
            download_queue_cap: self.download_queue_cap,
            index_transactions: self.txindex,
            ..Default::default()
        };

        let cancellation = CancellationToken::new();
        let mut actor = BlockStoreActor::new(
            store,
            index,
            fetcher,
            pending,
            state,
            genesis,
            config,
            cancellation.clone(),
        );
        actor.initialize()?;

        info!(target: "basalt_node", datadir = %self.datadir.display(), "Starting basalt node");
        let store_task = tokio::spawn(actor.start(()));

        tokio::signal::ctrl_c().await?;
        info!(target: "basalt_node", "Shutdown signal received, flushing block store");
        cancellation.cancel();
        store_task.await??;

        Ok(())
    }
}
