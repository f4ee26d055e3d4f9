// Application state module
// Shared by every connection for the life of the process

use super::types::Config;
use crate::store::SharedIssueStore;

/// Application state
pub struct AppState {
    pub config: Config,
    pub store: SharedIssueStore,
}

impl AppState {
    pub fn new(config: Config, store: SharedIssueStore) -> Self {
        Self { config, store }
    }
}
