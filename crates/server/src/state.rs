use std::sync::Arc;
use tonegrab_core::{Config, JobEvents, JobManager, SanitizedConfig};

use crate::api::WsBroadcaster;
use crate::board::JobBoard;

/// Shared application state
pub struct AppState {
    config: Config,
    manager: Arc<JobManager>,
    ws_broadcaster: WsBroadcaster,
    board: Arc<JobBoard>,
}

impl AppState {
    pub fn new(config: Config, manager: Arc<JobManager>, ws_broadcaster: WsBroadcaster) -> Self {
        let board = Arc::new(JobBoard::new(ws_broadcaster.clone()));
        Self {
            config,
            manager,
            ws_broadcaster,
            board,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn manager(&self) -> &Arc<JobManager> {
        &self.manager
    }

    pub fn ws_broadcaster(&self) -> &WsBroadcaster {
        &self.ws_broadcaster
    }

    pub fn board(&self) -> &JobBoard {
        &self.board
    }

    /// Event sink handed to every job the API starts.
    pub fn events(&self) -> Arc<dyn JobEvents> {
        Arc::clone(&self.board) as Arc<dyn JobEvents>
    }
}
