use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, error, info, warn};

use crate::error::WorkerError;
use crate::pipeline::runner::panic_message;
use crate::processor::{artifact_path, ExtractOptions, TextExtractor};
use crate::worker::job::{ExtractionJob, ExtractionOutcome, ExtractionResult, PreprocessReport};

/// Fixed set of threads running extraction only, writing one artifact per file.
pub struct ExtractionPool {
    job_sender: Sender<ExtractionJob>,
    result_receiver: Receiver<ExtractionResult>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

#[derive(Clone)]
struct WorkerContext {
    extractor: Arc<TextExtractor>,
    output_directory: PathBuf,
    force: bool,
}

impl ExtractionPool {
    /// `worker_count` of zero is treated as one.
    pub fn new(
        extractor: Arc<TextExtractor>,
        output_directory: PathBuf,
        force: bool,
        worker_count: usize,
    ) -> Self {
        let worker_count = worker_count.max(1);
        let (job_sender, job_receiver) = bounded::<ExtractionJob>(worker_count * 2);
        let (result_sender, result_receiver) = bounded::<ExtractionResult>(worker_count * 2);
        let shutdown = Arc::new(AtomicBool::new(false));
        let context = WorkerContext {
            extractor,
            output_directory,
            force,
        };

        let workers = (0..worker_count)
            .map(|worker_id| {
                let job_rx = job_receiver.clone();
                let result_tx = result_sender.clone();
                let shutdown_flag = Arc::clone(&shutdown);
                let worker_context = context.clone();

                thread::spawn(move || {
                    run_worker(worker_id, job_rx, result_tx, shutdown_flag, worker_context);
                })
            })
            .collect();

        info!("Started {} extraction workers", worker_count);

        Self {
            job_sender,
            result_receiver,
            workers,
            shutdown,
        }
    }

    pub fn submit(&self, job: ExtractionJob) -> Result<(), WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(WorkerError::ChannelClosed);
        }

        self.job_sender
            .send(job)
            .map_err(|_| WorkerError::ChannelClosed)
    }

    pub fn try_recv_result(&self) -> Option<ExtractionResult> {
        self.result_receiver.try_recv().ok()
    }

    pub fn recv_result(&self) -> Option<ExtractionResult> {
        self.result_receiver.recv().ok()
    }

    pub fn shutdown(&self) {
        info!("Shutting down extraction pool...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    pub fn wait(self) {
        // Closing the job channel lets idle workers exit
        drop(self.job_sender);
        drop(self.result_receiver);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All extraction workers have stopped");
    }

    /// Extracts every file, collecting results as they arrive. Per-file
    /// failures are logged and tallied, never propagated.
    pub fn run_all(self, files: Vec<PathBuf>) -> Result<PreprocessReport, WorkerError> {
        let expected = files.len();
        let mut report = PreprocessReport::default();

        // Results are drained while submitting so the bounded channels never stall
        let mut pending = files.into_iter().map(ExtractionJob::new).peekable();
        while report.total() < expected {
            if let Some(job) = pending.peek().cloned() {
                match self.job_sender.try_send(job) {
                    Ok(()) => {
                        pending.next();
                        continue;
                    }
                    Err(crossbeam_channel::TrySendError::Full(_)) => {}
                    Err(crossbeam_channel::TrySendError::Disconnected(_)) => {
                        return Err(WorkerError::ChannelClosed);
                    }
                }
            }

            match self.result_receiver.recv_timeout(Duration::from_millis(50)) {
                Ok(result) => report.record(&result),
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                    return Err(WorkerError::ChannelClosed);
                }
            }
        }

        self.wait();
        Ok(report)
    }
}

fn process_job(job: &ExtractionJob, context: &WorkerContext) -> ExtractionOutcome {
    let filename = job.filename();

    if !context.force && artifact_path(&context.output_directory, &job.source_path).exists() {
        debug!("Artifact exists, skipping {}", filename);
        return ExtractionOutcome::Skipped;
    }

    let options = ExtractOptions::cached(context.output_directory.clone(), context.force);
    match context.extractor.extract(&job.source_path, &options) {
        Ok(text) => ExtractionOutcome::Written {
            chars: text.chars().count(),
        },
        Err(e) => {
            error!("Failed to process {}: {}", filename, e);
            ExtractionOutcome::Failed(e.to_string())
        }
    }
}

/// A panicking extraction becomes a failed outcome so the worker keeps
/// serving and `run_all` still receives one result per job.
fn run_guarded(job: &ExtractionJob, context: &WorkerContext) -> ExtractionOutcome {
    match panic::catch_unwind(AssertUnwindSafe(|| process_job(job, context))) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = format!("extraction panicked: {}", panic_message(&*payload));
            error!("Failed to process {}: {}", job.filename(), message);
            ExtractionOutcome::Failed(message)
        }
    }
}

fn run_worker(
    worker_id: usize,
    job_receiver: Receiver<ExtractionJob>,
    result_sender: Sender<ExtractionResult>,
    shutdown: Arc<AtomicBool>,
    context: WorkerContext,
) {
    debug!("Worker {} started", worker_id);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Worker {} received shutdown signal", worker_id);
            break;
        }

        match job_receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(job) => {
                debug!("Worker {} extracting {}", worker_id, job.filename());
                let outcome = run_guarded(&job, &context);

                if result_sender.send(ExtractionResult::new(&job, outcome)).is_err() {
                    warn!("Worker {} result channel closed", worker_id);
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Worker {} job channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}
