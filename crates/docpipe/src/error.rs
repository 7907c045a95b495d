use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocpipeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Processing error: {0}")]
    Process(#[from] ProcessError),

    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Failed to read document '{path}': {source}")]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to process PDF: {0}")]
    PdfProcessing(String),

    #[error("Failed to process DOCX: {0}")]
    DocxProcessing(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("Failed to render PDF page: {0}")]
    RenderFailed(String),

    #[error("Failed to write extracted text to '{path}': {source}")]
    WriteArtifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Extraction task failed: {0}")]
    TaskFailed(String),
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Ingestion request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Ingestion rejected '{filename}' with status {status}: {body}")]
    Rejected {
        filename: String,
        status: u16,
        body: String,
    },

    #[error("Ingestion failed: {0}")]
    Failed(String),
}

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Retrieval request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Retrieval backend returned status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Unknown task_id '{0}' (server restart clears in-memory status)")]
    UnknownJob(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("No retrieval backend configured")]
    RetrievalUnavailable,

    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list documents: {0}")]
    Scan(#[from] WorkerError),

    #[error("Failed to remove extracted text: {0}")]
    Artifact(#[from] ProcessError),

    #[error("Background task failed: {0}")]
    Task(String),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,

    #[error("Directory scan failed for '{path}': {source}")]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

pub type Result<T> = std::result::Result<T, DocpipeError>;
