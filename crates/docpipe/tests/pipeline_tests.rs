//! Batch orchestration: failure isolation, progress and job polling.

mod common;

use std::path::PathBuf;
use std::sync::Arc;

use common::*;
use docpipe::config::Concurrency;
use docpipe::ingest::NoopIngestor;
use docpipe::pipeline::{Pipeline, PipelineConfig};
use docpipe::store::{FileStage, JobStatus, StateStore, StoreEvent};

fn pipeline(harness: &TestHarness, concurrency: Concurrency, store: Arc<StateStore>) -> Pipeline {
    let config = PipelineConfig::from_config(&harness.config(concurrency));
    Pipeline::new(
        Arc::new(config),
        store,
        Arc::clone(&harness.extractor),
        Arc::new(NoopIngestor),
    )
}

/// Five scans where the third one cannot be read by OCR.
fn five_files_third_broken(harness: &TestHarness) -> Vec<PathBuf> {
    harness.ocr.fail_on(b"unreadable");
    ["1.png", "2.png", "3.png", "4.png", "5.png"]
        .iter()
        .map(|name| {
            let content: &[u8] = if *name == "3.png" { b"unreadable" } else { name.as_bytes() };
            harness.add_file(name, content)
        })
        .collect()
}

async fn assert_third_file_isolated(concurrency: Concurrency) {
    let harness = TestHarness::new();
    let store = Arc::new(StateStore::new());
    let pipeline = pipeline(&harness, concurrency, Arc::clone(&store));
    let files = five_files_third_broken(&harness);
    let job_id = store.create_job(files.len());

    pipeline.run(&job_id, files, false).await;

    let job = store.get_job(&job_id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.processed_count, 5);
    assert_eq!(job.total_count, 5);
    assert_eq!(
        job.error.as_deref(),
        Some("3.png: OCR failed: unreadable image")
    );

    let failed = store.get_file("3.png").unwrap();
    assert_eq!(failed.stage, FileStage::Failed);
    assert!(!failed.error.unwrap_or_default().is_empty());

    for name in ["1.png", "2.png", "4.png", "5.png"] {
        assert_eq!(store.get_file(name).unwrap().stage, FileStage::Indexed, "{}", name);
        assert!(store.get_file(name).unwrap().error.is_none());
    }
    assert!(!harness.artifact("3").exists());
    assert!(harness.artifact("4").exists());
}

#[tokio::test]
async fn test_failing_file_does_not_abort_batch() {
    assert_third_file_isolated(Concurrency::Sequential).await;
}

#[tokio::test]
async fn test_failing_file_does_not_abort_parallel_batch() {
    assert_third_file_isolated(Concurrency::Parallel).await;
}

#[tokio::test]
async fn test_error_summary_keeps_first_five() {
    let harness = TestHarness::new();
    harness.ocr.fail_on(b"bad");
    let store = Arc::new(StateStore::new());
    let pipeline = pipeline(&harness, Concurrency::Sequential, Arc::clone(&store));

    let files: Vec<PathBuf> = (1..=7)
        .map(|i| harness.add_file(&format!("f{}.png", i), b"bad"))
        .collect();
    let job_id = store.create_job(files.len());

    let summary = pipeline.run(&job_id, files, false).await;

    let error = store.get_job(&job_id).unwrap().error.unwrap();
    assert_eq!(error.split("; ").count(), 5);
    assert!(error.starts_with("f1.png: "));
    assert!(error.contains("f5.png: "));
    assert!(!error.contains("f6.png"));
    assert_eq!(summary.failures.len(), 7);
    assert_eq!(store.get_file("f7.png").unwrap().stage, FileStage::Failed);
}

#[tokio::test]
async fn test_progress_strictly_increases() {
    let harness = TestHarness::new();
    let store = Arc::new(StateStore::new());
    let pipeline = pipeline(&harness, Concurrency::Sequential, Arc::clone(&store));
    let files: Vec<PathBuf> = ["a.png", "b.png", "c.png"]
        .iter()
        .map(|n| harness.add_file(n, n.as_bytes()))
        .collect();
    let job_id = store.create_job(files.len());
    let mut events = store.subscribe();

    pipeline.run(&job_id, files, false).await;

    let mut counts = Vec::new();
    let mut statuses = Vec::new();
    let mut stages = Vec::new();
    while let Ok(event) = events.try_recv() {
        match event {
            StoreEvent::Job(job) => {
                counts.push(job.processed_count);
                statuses.push(job.status);
            }
            StoreEvent::File(file) if file.name == "b.png" => stages.push(file.stage),
            StoreEvent::File(_) => {}
        }
    }

    let mut deduped = counts.clone();
    deduped.dedup();
    assert_eq!(deduped, vec![0, 1, 2, 3]);
    assert_eq!(statuses.first(), Some(&JobStatus::Processing));
    assert_eq!(statuses.last(), Some(&JobStatus::Completed));
    assert_eq!(
        stages,
        vec![FileStage::Processing, FileStage::OcrComplete, FileStage::Indexed]
    );
}

#[tokio::test]
async fn test_force_reprocess_rewrites_artifacts() {
    let harness = TestHarness::new();
    let store = Arc::new(StateStore::new());
    let pipeline = pipeline(&harness, Concurrency::Sequential, Arc::clone(&store));
    let path = harness.add_file("a.png", b"words");

    let first = store.create_job(1);
    pipeline.run(&first, vec![path.clone()], false).await;
    let second = store.create_job(1);
    pipeline.run(&second, vec![path.clone()], false).await;
    assert_eq!(harness.ocr.calls(), 1);

    let third = store.create_job(1);
    pipeline.run(&third, vec![path], true).await;
    assert_eq!(harness.ocr.calls(), 2);
    assert_eq!(store.get_job(&third).unwrap().status, JobStatus::Completed);
}

#[tokio::test]
async fn test_fresh_job_polls_as_queued() {
    let harness = TestHarness::new();
    let service = harness.service();
    let job_id = service.store().create_job(4);

    let status = service.status(&job_id).unwrap();
    assert_eq!(status.status, "queued");
    assert_eq!(status.progress, "0/4 files");
    assert!(status.error.is_none());

    let job = service.store().get_job(&job_id).unwrap();
    assert_eq!(job.processed_count, 0);
    assert_eq!(job.total_count, 4);
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let harness = TestHarness::new();
    let service = harness.service();

    let err = service.status("does-not-exist").unwrap_err();

    assert!(matches!(err, docpipe::ServiceError::UnknownJob(_)));
    assert!(err.to_string().contains("server restart"));
}
