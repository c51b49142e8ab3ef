//! Job records: domain types, durable store and transition policy.

pub mod model;
pub mod store;
pub mod transition;

pub use model::{Job, JobId, JobResult, JobStatus, JobStep};
pub use store::{JobCounts, JobStore};
pub use transition::{JobUpdate, TransitionError, TransitionPolicy};
