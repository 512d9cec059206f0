//! Shared application state.

use crate::config::Config;
use outreach_core::PipelineStore;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub store: Arc<PipelineStore>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> outreach_core::Result<Self> {
        let store = Arc::new(PipelineStore::open(&config.db_path)?);
        Ok(Self { store, config })
    }
}
