//! Caller-facing operations: upload, listing, deletion, batch start, status
//! polling and question answering.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::config::{Config, MAX_TOP_K};
use crate::error::{DocpipeError, ServiceError};
use crate::ingest::{HttpIngestor, Ingestor, NoopIngestor};
use crate::pipeline::{JobSummary, Pipeline, PipelineConfig};
use crate::processor::{artifact_path, is_supported, remove_artifact, TextExtractor};
use crate::retrieval::{HttpRetriever, Retriever};
use crate::sanitize::{is_plain_filename, sanitize_filename};
use crate::store::{FileRecord, FileStage, StateStore};
use crate::worker::DirectoryScanner;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadResponse {
    pub filename: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileInfo {
    pub name: String,
    pub stage: FileStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<FileRecord> for FileInfo {
    fn from(record: FileRecord) -> Self {
        Self {
            name: record.name,
            stage: record.stage,
            error: record.error,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListFilesResponse {
    pub files: Vec<FileInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeleteResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessResponse {
    pub task_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    pub status: String,
    pub progress: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<serde_json::Value>,
}

/// A started batch job: the caller-visible response plus the task running it.
pub struct StartedJob {
    pub response: ProcessResponse,
    pub handle: JoinHandle<Option<JobSummary>>,
}

pub struct DocumentService {
    config: Arc<Config>,
    store: Arc<StateStore>,
    extractor: Arc<TextExtractor>,
    pipeline: Arc<Pipeline>,
    retriever: Option<Arc<dyn Retriever>>,
}

impl DocumentService {
    pub fn new(
        config: Config,
        extractor: Arc<TextExtractor>,
        ingestor: Arc<dyn Ingestor>,
        retriever: Option<Arc<dyn Retriever>>,
    ) -> Self {
        let store = Arc::new(StateStore::new());
        let pipeline = Pipeline::new(
            Arc::new(PipelineConfig::from_config(&config)),
            Arc::clone(&store),
            Arc::clone(&extractor),
            ingestor,
        );

        Self {
            config: Arc::new(config),
            store,
            extractor,
            pipeline: Arc::new(pipeline),
            retriever,
        }
    }

    /// Production wiring: Tesseract/poppler extraction, HTTP collaborators
    /// where endpoints are configured.
    pub fn from_config(config: Config) -> Result<Self, DocpipeError> {
        let extractor = Arc::new(TextExtractor::new(&config.extraction));

        let ingestor: Arc<dyn Ingestor> = match HttpIngestor::from_config(&config.ingestion)? {
            Some(http) => {
                info!("Ingesting into {}", http.endpoint());
                Arc::new(http)
            }
            None => {
                info!("No ingestion endpoint configured; extracted text is only cached");
                Arc::new(NoopIngestor)
            }
        };

        let retriever = HttpRetriever::from_config(&config.retrieval)?
            .map(|r| Arc::new(r) as Arc<dyn Retriever>);

        Ok(Self::new(config, extractor, ingestor, retriever))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    pub fn extractor(&self) -> &Arc<TextExtractor> {
        &self.extractor
    }

    fn data_dir(&self) -> PathBuf {
        self.config.data_dir()
    }

    fn output_dir(&self) -> PathBuf {
        self.config.output_dir()
    }

    /// Stores bytes under a sanitized name and records the file as `uploaded`.
    pub async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<UploadResponse, ServiceError> {
        let safe_name = sanitize_filename(filename);
        if !is_supported(Path::new(&safe_name)) {
            return Err(ServiceError::UnsupportedType(safe_name));
        }

        let data_dir = self.data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .map_err(|e| io_error(&data_dir, e))?;

        let dest = data_dir.join(&safe_name);
        tokio::fs::write(&dest, bytes)
            .await
            .map_err(|e| io_error(&dest, e))?;

        self.store.set_file_stage(&safe_name, FileStage::Uploaded, None);
        info!("Uploaded {}", safe_name);

        Ok(UploadResponse {
            filename: safe_name,
            status: FileStage::Uploaded.to_string(),
        })
    }

    /// Reconciles with the data directory, then lists every known file.
    pub async fn list_documents(&self) -> Result<ListFilesResponse, ServiceError> {
        let data_dir = self.data_dir();
        if tokio::fs::try_exists(&data_dir).await.unwrap_or(false) {
            let names = tokio::task::spawn_blocking(move || DirectoryScanner::new(data_dir).file_names())
                .await
                .map_err(|e| ServiceError::Task(e.to_string()))??;
            self.store.sync_from_storage(&names);
        }

        let mut files: Vec<FileInfo> = self.store.list_files().into_iter().map(FileInfo::from).collect();
        files.sort_by_key(|f| f.name.to_lowercase());

        Ok(ListFilesResponse { files })
    }

    /// Removes the raw file and its artifact, and marks the record `deleted`.
    pub async fn delete_document(&self, name: &str) -> Result<DeleteResponse, ServiceError> {
        if !is_plain_filename(name) {
            return Err(ServiceError::InvalidFilename(name.to_string()));
        }

        let raw_path = self.data_dir().join(name);
        remove_if_exists(&raw_path).await?;

        let artifact = artifact_path(&self.output_dir(), Path::new(name));
        let removed = tokio::task::spawn_blocking(move || remove_artifact(&artifact))
            .await
            .map_err(|e| ServiceError::Task(e.to_string()))??;
        if removed {
            debug!("Removed extracted text for {}", name);
        }

        self.store.delete_file_record(name);
        info!("Deleted {}", name);

        Ok(DeleteResponse {
            message: "Deleted".to_string(),
        })
    }

    /// Freezes the current file list, creates the job and runs it in the
    /// background. Returns as soon as the job is registered.
    pub async fn start_processing(&self, force: bool) -> Result<ProcessResponse, ServiceError> {
        Ok(self.start_job(force).await?.response)
    }

    /// Like [`start_processing`](Self::start_processing) but hands back the task handle.
    pub async fn start_job(&self, force: bool) -> Result<StartedJob, ServiceError> {
        let data_dir = self.data_dir();
        let output_dir = self.output_dir();
        for dir in [&data_dir, &output_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| io_error(dir, e))?;
        }

        let files = tokio::task::spawn_blocking(move || DirectoryScanner::new(data_dir).scan())
            .await
            .map_err(|e| ServiceError::Task(e.to_string()))??;

        let task_id = self.store.create_job(files.len());
        debug!("Job {} frozen with {} files", task_id, files.len());

        let handle = self.pipeline.spawn(task_id.clone(), files, force);

        Ok(StartedJob {
            response: ProcessResponse {
                task_id,
                message: "Processing started".to_string(),
            },
            handle,
        })
    }

    pub fn status(&self, job_id: &str) -> Result<StatusResponse, ServiceError> {
        let job = self
            .store
            .get_job(job_id)
            .ok_or_else(|| ServiceError::UnknownJob(job_id.to_string()))?;

        Ok(StatusResponse {
            status: job.status.to_string(),
            progress: job.progress(),
            error: job.error,
        })
    }

    /// Answers a question over the ingested corpus. `top_k` defaults to the
    /// configured value and must lie in `1..=50`.
    pub async fn query(&self, query: &str, top_k: Option<usize>) -> Result<QueryResponse, ServiceError> {
        if query.trim().is_empty() {
            return Err(ServiceError::InvalidQuery("query must not be empty".to_string()));
        }

        let top_k = top_k.unwrap_or(self.config.retrieval.default_top_k);
        if !(1..=MAX_TOP_K).contains(&top_k) {
            return Err(ServiceError::InvalidQuery(format!(
                "top_k must be between 1 and {}, got {}",
                MAX_TOP_K, top_k
            )));
        }

        let retriever = self
            .retriever
            .as_ref()
            .ok_or(ServiceError::RetrievalUnavailable)?;

        let answer = retriever.ask(query, top_k).await?;
        Ok(QueryResponse {
            answer: answer.answer,
            sources: answer.sources,
        })
    }
}

fn io_error(path: &Path, source: std::io::Error) -> ServiceError {
    ServiceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

async fn remove_if_exists(path: &Path) -> Result<(), ServiceError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_error(path, e)),
    }
}
