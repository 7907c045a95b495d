pub mod loader;
pub mod schema;

pub use loader::{
    apply_env_overrides, default_config_path, load_config, load_config_from_str, validate_config,
    MAX_TOP_K,
};
pub use schema::{
    Concurrency, Config, ExtractionConfig, IngestionConfig, OcrConfig, PipelineSettings,
    RetrievalConfig,
};
