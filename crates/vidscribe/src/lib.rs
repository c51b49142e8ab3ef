pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod job;
pub mod pipeline;
pub mod sanitize;
pub mod secrets;
pub mod service;
pub mod storage;
pub mod telemetry;

pub use config::{load_config, load_config_from_str, Config};
pub use db::{Database, DatabaseError};
pub use error::{ConfigError, Result, StorageError, ValidationError, VidscribeError};
pub use ingest::VideoUpload;
pub use job::{
    Job, JobCounts, JobId, JobResult, JobStatus, JobStep, JobStore, JobUpdate, TransitionError,
    TransitionPolicy,
};
pub use pipeline::{
    AudioExtractor, Capabilities, Orchestrator, PipelineError, TextGenerator, Transcriber,
};
pub use secrets::{resolve_secret, SecretError};
pub use service::{JobService, StatusQueryService, SubmitReceipt};
pub use telemetry::{init_logging, LogFormat};
