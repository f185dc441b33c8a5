use std::sync::Arc;

use crate::{
    config::Config,
    services::downstream::{Downstream, HttpDownstream},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub downstream: Arc<dyn Downstream>,
}

impl AppState {
    pub fn new(config: Config, downstream: Arc<dyn Downstream>) -> Self {
        Self {
            config: Arc::new(config),
            downstream,
        }
    }

    /// State backed by the reqwest client, using the configured fetch policy
    pub fn from_config(config: Config) -> Self {
        let downstream = HttpDownstream::new(config.fetch_policy());
        Self::new(config, Arc::new(downstream))
    }
}
