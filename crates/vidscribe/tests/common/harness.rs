//! Test harness for isolated job pipeline tests.
//!
//! `TestHarness` wires a [`JobService`] to temporary upload and audio
//! directories, a job store (in memory unless asked otherwise) and the fakes
//! from [`super::fakes`].

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use vidscribe::pipeline::Stage;
use vidscribe::storage::ArtifactStore;
use vidscribe::{Capabilities, Job, JobId, JobService, JobStore, TransitionPolicy, VideoUpload};

use super::fakes::{FakeExtractor, FakeGenerator, FakeTranscriber, Gate};

const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HarnessBuilder {
    gated: bool,
    fail_at: Option<Stage>,
    reset_progress_on_failure: bool,
    file_database: bool,
}

impl HarnessBuilder {
    /// Every stage waits for [`TestHarness::open`] before running.
    pub fn gated(mut self) -> Self {
        self.gated = true;
        self
    }

    pub fn fail_at(mut self, stage: Stage) -> Self {
        self.fail_at = Some(stage);
        self
    }

    pub fn reset_progress_on_failure(mut self, reset: bool) -> Self {
        self.reset_progress_on_failure = reset;
        self
    }

    /// Uses `jobs.db` inside the temp directory instead of memory.
    pub fn file_database(mut self) -> Self {
        self.file_database = true;
        self
    }

    pub fn build(self) -> TestHarness {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let upload_dir = temp_dir.path().join("uploads");
        let audio_dir = temp_dir.path().join("temp");
        let database_path = temp_dir.path().join("jobs.db");

        let store = if self.file_database {
            JobStore::open(&database_path).expect("Failed to open job store")
        } else {
            JobStore::open_in_memory().expect("Failed to open job store")
        };

        let gate = || if self.gated { Some(Gate::new()) } else { None };

        let extractor = Arc::new(FakeExtractor {
            audio_dir: audio_dir.clone(),
            gate: gate(),
            failure: (self.fail_at == Some(Stage::ExtractAudio))
                .then(|| "moov atom not found".to_string()),
        });
        let transcriber = Arc::new(FakeTranscriber {
            upload_dir: upload_dir.clone(),
            gate: gate(),
            failure: (self.fail_at == Some(Stage::Transcribe)).then_some(429),
            uploads_at_start: Mutex::new(Vec::new()),
        });
        let generator = Arc::new(FakeGenerator {
            gate: gate(),
            failure: self.fail_at == Some(Stage::Generate),
        });

        let service = JobService::new(
            store.clone(),
            TransitionPolicy::new(self.reset_progress_on_failure),
            ArtifactStore::new(&upload_dir, &audio_dir),
            Capabilities::new(extractor.clone(), transcriber.clone(), generator.clone()),
        );

        TestHarness {
            temp_dir,
            upload_dir,
            audio_dir,
            database_path,
            store,
            service,
            extractor,
            transcriber,
            generator,
        }
    }
}

pub struct TestHarness {
    temp_dir: TempDir,
    pub upload_dir: PathBuf,
    pub audio_dir: PathBuf,
    pub database_path: PathBuf,
    pub store: JobStore,
    pub service: JobService,
    pub extractor: Arc<FakeExtractor>,
    pub transcriber: Arc<FakeTranscriber>,
    pub generator: Arc<FakeGenerator>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> HarnessBuilder {
        HarnessBuilder {
            gated: false,
            fail_at: None,
            reset_progress_on_failure: true,
            file_database: false,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn upload(&self, filename: &str) -> VideoUpload {
        VideoUpload::new(
            Some(filename.to_string()),
            Some("video/mp4".to_string()),
            b"\x00\x00\x00\x18ftypmp42".to_vec(),
        )
    }

    /// Submits an mp4 and returns its job id.
    pub async fn submit(&self, filename: &str) -> JobId {
        self.service
            .submit(Some(self.upload(filename)))
            .await
            .expect("submit failed")
            .job_id
    }

    /// Writes a video straight into the upload directory.
    pub fn stored_video(&self, filename: &str) -> PathBuf {
        std::fs::create_dir_all(&self.upload_dir).expect("Failed to create upload dir");
        let path = self.upload_dir.join(filename);
        std::fs::write(&path, b"video").expect("Failed to write video");
        path
    }

    /// Lets the given stage run once.
    pub fn open(&self, stage: Stage) {
        let gate = match stage {
            Stage::ExtractAudio => &self.extractor.gate,
            Stage::Transcribe => &self.transcriber.gate,
            Stage::Generate => &self.generator.gate,
        };
        gate.as_ref().expect("harness is not gated").open();
    }

    pub fn job(&self, id: &JobId) -> Option<Job> {
        self.service.poll(id).expect("poll failed")
    }

    /// Polls until `predicate` holds, panicking after a few seconds.
    pub async fn wait_for<F>(&self, id: &JobId, predicate: F) -> Job
    where
        F: Fn(&Job) -> bool,
    {
        let poll = async {
            loop {
                if let Some(job) = self.job(id) {
                    if predicate(&job) {
                        return job;
                    }
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        match tokio::time::timeout(WAIT_TIMEOUT, poll).await {
            Ok(job) => job,
            Err(_) => panic!("timed out waiting on job {}: {:?}", id, self.job(id)),
        }
    }

    pub async fn wait_until_finished(&self, id: &JobId) -> Job {
        self.wait_for(id, Job::is_finished).await
    }

    pub fn files_in(dir: &Path) -> Vec<PathBuf> {
        match std::fs::read_dir(dir) {
            Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn uploads(&self) -> Vec<PathBuf> {
        Self::files_in(&self.upload_dir)
    }

    pub fn audio_files(&self) -> Vec<PathBuf> {
        Self::files_in(&self.audio_dir)
    }
}
