pub mod config;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod processor;
pub mod retrieval;
pub mod sanitize;
pub mod service;
pub mod store;
pub mod worker;

pub use config::{load_config, Concurrency, Config};
pub use error::{
    ConfigError, DocpipeError, IngestError, ProcessError, Result, RetrievalError, ServiceError,
    WorkerError,
};
pub use ingest::{HttpIngestor, IngestOutcome, Ingestor, NoopIngestor};
pub use pipeline::{JobSummary, Pipeline, PipelineConfig};
pub use processor::{
    DocumentFormat, ExtractOptions, OcrEngine, PageRenderer, TextExtractor, SUPPORTED_EXTENSIONS,
};
pub use retrieval::{Answer, HttpRetriever, Retriever};
pub use service::DocumentService;
pub use store::{FileRecord, FileStage, JobRecord, JobStatus, JobUpdate, StateStore, StoreEvent};
pub use worker::{DirectoryScanner, ExtractionPool, PreprocessReport};
