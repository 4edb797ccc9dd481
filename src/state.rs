use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::search::vector::ChunkIndex;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub index: Arc<ChunkIndex>,
    pub http_client: reqwest::Client,
}

impl AppState {
    /// Load the chunk index named in `config` and build the shared HTTP client.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let index = ChunkIndex::load(&config.index_path, &config.metadata_path)?;
        Self::with_index(config, index)
    }

    pub fn with_index(config: Config, index: ChunkIndex) -> anyhow::Result<Self> {
        // Per-call timeouts are set on each LLM request.
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            config: Arc::new(config),
            index: Arc::new(index),
            http_client,
        })
    }
}
