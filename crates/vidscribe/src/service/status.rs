use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::db::DatabaseError;
use crate::job::{Job, JobId, JobStore};

/// Read side of the job store, plus retention.
#[derive(Clone)]
pub struct StatusQueryService {
    store: JobStore,
}

impl StatusQueryService {
    pub fn new(store: JobStore) -> Self {
        Self { store }
    }

    /// Current snapshot of a job; `None` when unknown or swept.
    pub fn get_status(&self, job_id: &JobId) -> Result<Option<Job>, DatabaseError> {
        let job = self.store.get_by_id(job_id)?;
        if job.is_none() {
            debug!(job_id = %job_id, "Status requested for unknown job");
        }
        Ok(job)
    }

    /// Deletes every job created more than `max_age` ago, whatever its
    /// status. Pipelines still running for a swept job keep going; their
    /// writes match no row.
    pub fn sweep_expired(&self, max_age: Duration) -> Result<usize, DatabaseError> {
        let cutoff = Utc::now() - max_age;
        let deleted = self.store.delete_older_than(cutoff)?;
        if deleted > 0 {
            info!(deleted, cutoff = %cutoff, "Swept expired jobs");
        }
        Ok(deleted)
    }

    /// Sweeps every `interval` until the returned task is aborted.
    ///
    /// The first sweep happens one interval from now; callers sweep at
    /// startup themselves.
    pub fn spawn_sweeper(&self, max_age: Duration, interval: StdDuration) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = this.sweep_expired(max_age) {
                    warn!(error = %e, "Periodic job sweep failed");
                }
            }
        })
    }
}
