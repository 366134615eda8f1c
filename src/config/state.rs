// Application state module
// Shared by every connection task

use std::sync::Arc;

use super::types::Config;
use crate::asset::FileEnvironment;

/// Application state
pub struct AppState {
    pub config: Config,
    pub environment: Arc<FileEnvironment>,
    /// Mount prefix, normalized once at startup
    pub prefix: String,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let environment = FileEnvironment::new(&config.assets.root, &config.assets.version);
        Self {
            config: config.clone(),
            environment: Arc::new(environment),
            prefix: config.mount_prefix(),
        }
    }
}
