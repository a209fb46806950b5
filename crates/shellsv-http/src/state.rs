use std::sync::Arc;

use shellsv_log::LogStore;
use shellsv_supervisor::Supervisor;

/// Shared handle threaded through every handler via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub supervisor: Arc<Supervisor>,
    pub log_store: Arc<LogStore>,
}

impl AppState {
    pub fn new(supervisor: Arc<Supervisor>) -> Self {
        let log_store = supervisor.log_store();
        Self {
            supervisor,
            log_store,
        }
    }
}
