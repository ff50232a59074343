//! Application state

use crate::service::ReasonerWorker;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// The reasoning worker behind this server
    pub worker: Arc<ReasonerWorker>,
}

impl AppState {
    /// Create new application state
    pub fn new(worker: Arc<ReasonerWorker>) -> Self {
        Self { worker }
    }
}
