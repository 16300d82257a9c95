use std::sync::Arc;
use std::time::Instant;

use langdrill_core::engine::DrillEngine;

#[derive(Clone)]
pub struct AppState {
    engine: Arc<DrillEngine>,
    started_at: Instant,
}

impl AppState {
    pub fn new(engine: Arc<DrillEngine>) -> Self {
        Self {
            engine,
            started_at: Instant::now(),
        }
    }

    pub fn engine(&self) -> &DrillEngine {
        &self.engine
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
