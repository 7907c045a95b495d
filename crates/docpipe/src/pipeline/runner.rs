use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::future::join_all;
use futures_util::FutureExt;
use log::{error, info, warn};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{info_span, Instrument};

use crate::config::Concurrency;
use crate::error::ProcessError;
use crate::ingest::Ingestor;
use crate::processor::{ExtractOptions, TextExtractor};
use crate::store::{FileStage, JobStatus, JobUpdate, StateStore};

use super::config::PipelineConfig;
use super::error::{summarize_failures, FileFailure, PipelineError};

/// Job error recorded when a run dies outside per-file handling.
pub const JOB_PANIC_MESSAGE: &str = "Internal error: pipeline job aborted unexpectedly";

/// Final state of one batch job.
#[derive(Debug, Clone)]
pub struct JobSummary {
    pub job_id: String,
    pub status: JobStatus,
    pub processed: usize,
    pub total: usize,
    /// Every per-file failure in file order, not only the summarized ones.
    pub failures: Vec<FileFailure>,
}

/// Drives a batch of files through extraction and ingestion, keeping the
/// state store current after every step.
pub struct Pipeline {
    config: Arc<PipelineConfig>,
    store: Arc<StateStore>,
    extractor: Arc<TextExtractor>,
    ingestor: Arc<dyn Ingestor>,
}

impl Pipeline {
    pub fn new(
        config: Arc<PipelineConfig>,
        store: Arc<StateStore>,
        extractor: Arc<TextExtractor>,
        ingestor: Arc<dyn Ingestor>,
    ) -> Self {
        Self {
            config,
            store,
            extractor,
            ingestor,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the job on its own task. A panic anywhere in the run leaves the
    /// job `failed` instead of stuck at `processing`.
    pub fn spawn(
        self: &Arc<Self>,
        job_id: String,
        files: Vec<PathBuf>,
        force: bool,
    ) -> JoinHandle<Option<JobSummary>> {
        let pipeline = Arc::clone(self);

        tokio::spawn(async move {
            let outcome = AssertUnwindSafe(pipeline.run(&job_id, files, force))
                .catch_unwind()
                .await;

            match outcome {
                Ok(summary) => Some(summary),
                Err(panic) => {
                    error!("Job {} panicked: {}", job_id, panic_message(&*panic));
                    pipeline.store.update_job(
                        &job_id,
                        JobUpdate::new()
                            .status(JobStatus::Failed)
                            .error(JOB_PANIC_MESSAGE),
                    );
                    None
                }
            }
        })
    }

    /// Processes `files` in the given order and returns once the job is terminal.
    pub async fn run(&self, job_id: &str, files: Vec<PathBuf>, force: bool) -> JobSummary {
        let span = info_span!("pipeline", job_id = %job_id, files = files.len(), force);
        self.run_job(job_id, files, force).instrument(span).await
    }

    async fn run_job(&self, job_id: &str, files: Vec<PathBuf>, force: bool) -> JobSummary {
        let total = files.len();
        self.store.update_job(
            job_id,
            JobUpdate::new()
                .status(JobStatus::Processing)
                .total(total)
                .processed(0),
        );
        info!("Job {} started: {} files", job_id, total);

        let outcomes = match self.config.concurrency {
            Concurrency::Sequential => self.run_sequential(job_id, &files, force).await,
            Concurrency::Parallel => self.run_parallel(job_id, &files, force).await,
        };

        let failures: Vec<FileFailure> = outcomes.into_iter().filter_map(Result::err).collect();

        let update = match summarize_failures(&failures, self.config.error_summary_limit) {
            Some(summary) => JobUpdate::new().status(JobStatus::Failed).error(summary),
            None => JobUpdate::new().status(JobStatus::Completed),
        };
        let record = self.store.update_job(job_id, update);

        if failures.is_empty() {
            info!("Job {} completed: {}", job_id, record.progress());
        } else {
            warn!(
                "Job {} finished with {} failed files: {}",
                job_id,
                failures.len(),
                record.progress()
            );
        }

        JobSummary {
            job_id: job_id.to_string(),
            status: record.status,
            processed: record.processed_count,
            total: record.total_count,
            failures,
        }
    }

    async fn run_sequential(
        &self,
        job_id: &str,
        files: &[PathBuf],
        force: bool,
    ) -> Vec<Result<(), FileFailure>> {
        let mut outcomes = Vec::with_capacity(files.len());

        for (index, path) in files.iter().enumerate() {
            let outcome = self.process_file(path, force).await;
            self.store
                .update_job(job_id, JobUpdate::new().processed(index + 1));
            outcomes.push(outcome);
        }

        outcomes
    }

    /// Up to `worker_count` files in flight. Outcomes come back in file order.
    async fn run_parallel(
        &self,
        job_id: &str,
        files: &[PathBuf],
        force: bool,
    ) -> Vec<Result<(), FileFailure>> {
        let semaphore = Semaphore::new(self.config.worker_count);
        let processed = AtomicUsize::new(0);
        let semaphore = &semaphore;
        let processed = &processed;

        let file_futures = files.iter().map(|path| async move {
            let _permit = semaphore.acquire().await;
            let outcome = self.process_file(path, force).await;

            let done = processed.fetch_add(1, Ordering::SeqCst) + 1;
            self.store.update_job(job_id, JobUpdate::new().processed(done));
            outcome
        });

        join_all(file_futures).await
    }

    async fn process_file(&self, path: &Path, force: bool) -> Result<(), FileFailure> {
        let name = display_name(path);
        let span = info_span!("file", file = %name);

        async {
            self.store.set_file_stage(&name, FileStage::Processing, None);

            match self.extract_and_ingest(path, &name, force).await {
                Ok(()) => Ok(()),
                Err(e) => {
                    let message = e.to_string();
                    warn!("Failed to process {}: {}", name, message);
                    self.store
                        .set_file_stage(&name, FileStage::Failed, Some(message.clone()));
                    Err(FileFailure::new(&name, message))
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn extract_and_ingest(
        &self,
        path: &Path,
        name: &str,
        force: bool,
    ) -> Result<(), PipelineError> {
        let extractor = Arc::clone(&self.extractor);
        let options = ExtractOptions::cached(self.config.output_directory.clone(), force);
        let source = path.to_path_buf();

        // Extraction blocks on file I/O, rendering and OCR
        let text = tokio::task::spawn_blocking(move || extractor.extract(&source, &options))
            .await
            .map_err(|e| ProcessError::TaskFailed(e.to_string()))??;

        self.store.set_file_stage(name, FileStage::OcrComplete, None);

        self.ingestor
            .ingest(&text, name)
            .instrument(info_span!("ingest"))
            .await?;

        self.store.set_file_stage(name, FileStage::Indexed, None);
        info!("Indexed {} ({} chars)", name, text.chars().count());
        Ok(())
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
