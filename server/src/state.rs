use std::time::Instant;

use vidscribe::JobService;

/// Shared by every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub service: JobService,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(service: JobService) -> Self {
        Self {
            service,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
