//! Isolated environment for integration tests.
//!
//! Each harness owns a temp directory with `data/` and `output/`, a
//! `TextExtractor` wired to counting fakes, and can build a full
//! `DocumentService` on top of them.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use docpipe::config::{Concurrency, Config, ExtractionConfig};
use docpipe::ingest::{Ingestor, NoopIngestor};
use docpipe::processor::TextExtractor;
use docpipe::retrieval::Retriever;
use docpipe::service::DocumentService;
use docpipe::store::JobRecord;

use super::fakes::{CountingOcr, FakeRenderer};

pub struct TestHarness {
    temp_dir: TempDir,
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub ocr: Arc<CountingOcr>,
    pub renderer: Arc<FakeRenderer>,
    pub extractor: Arc<TextExtractor>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_renderer(FakeRenderer::default())
    }

    pub fn with_renderer(renderer: FakeRenderer) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let data_dir = temp_dir.path().join("data");
        let output_dir = temp_dir.path().join("output");
        std::fs::create_dir_all(&data_dir).expect("Failed to create data dir");

        let ocr = Arc::new(CountingOcr::new());
        let renderer = Arc::new(renderer);
        let extractor = Arc::new(TextExtractor::with_engines(
            &ExtractionConfig::default(),
            ocr.clone(),
            renderer.clone(),
        ));

        Self {
            temp_dir,
            data_dir,
            output_dir,
            ocr,
            renderer,
            extractor,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes a document into the data directory.
    pub fn add_file(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.data_dir.join(name);
        std::fs::write(&path, bytes).expect("Failed to write input file");
        path
    }

    pub fn artifact(&self, stem: &str) -> PathBuf {
        self.output_dir.join(format!("{}.txt", stem))
    }

    pub fn config(&self, concurrency: Concurrency) -> Config {
        let mut config = Config::default();
        config.data_directory = self.data_dir.to_string_lossy().into_owned();
        config.output_directory = self.output_dir.to_string_lossy().into_owned();
        config.pipeline.concurrency = concurrency;
        config.pipeline.worker_count = 2;
        config
    }

    pub fn service(&self) -> DocumentService {
        self.service_with(Arc::new(NoopIngestor), None)
    }

    pub fn service_with(
        &self,
        ingestor: Arc<dyn Ingestor>,
        retriever: Option<Arc<dyn Retriever>>,
    ) -> DocumentService {
        DocumentService::new(
            self.config(Concurrency::Sequential),
            Arc::clone(&self.extractor),
            ingestor,
            retriever,
        )
    }
}

/// Polls until the job is terminal, failing the test after a few seconds.
pub async fn wait_for_job(service: &DocumentService, job_id: &str) -> JobRecord {
    for _ in 0..500 {
        if let Some(job) = service.store().get_job(job_id) {
            if job.is_finished() {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} did not finish in time", job_id);
}
