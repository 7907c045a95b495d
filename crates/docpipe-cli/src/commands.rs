//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result, WrapErr};
use log::{info, warn};

use docpipe::config::{apply_env_overrides, default_config_path, load_config, Config};
use docpipe::processor::{ExtractOptions, TextExtractor};
use docpipe::service::DocumentService;
use docpipe::worker::{DirectoryScanner, ExtractionPool};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docpipe: document text extraction with digital-vs-OCR detection.
#[derive(Parser)]
#[command(
    name = "docpipe",
    version,
    about = "Extract text from PDFs, scans and Word documents and hand it to an ingestion backend.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Path to a JSON config file (defaults to the platform config dir).
    #[arg(short, long, global = true, env = "DOCPIPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Extract every document in the data directory in parallel, skipping
    /// ones that already have a text artifact.
    Preprocess {
        /// Re-extract even when an artifact exists.
        #[arg(long)]
        force: bool,
    },

    /// Extract one document and print its text.
    Extract {
        file: PathBuf,

        /// Also cache the text in the output directory.
        #[arg(long)]
        write: bool,

        /// Ignore a cached artifact.
        #[arg(long)]
        force: bool,
    },

    /// Run a batch job over the data directory and wait for it to finish.
    Process {
        #[arg(long)]
        force: bool,

        /// List the files the job would process without running it.
        #[arg(long)]
        dry_run: bool,
    },

    /// List known documents and their stages.
    List,

    /// Delete a document and its extracted text.
    Delete { name: String },

    /// Ask a question against the ingested corpus.
    Ask {
        query: String,

        #[arg(long)]
        top_k: Option<usize>,
    },
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

pub(crate) fn init_tracing(cli: &Cli) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match cli.verbose {
        0 => "docpipe=info",
        1 => "docpipe=debug",
        _ => "docpipe=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            let subscriber = fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Json => {
            let subscriber = fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    // The library logs through `log`; route those records into tracing
    tracing_log::LogTracer::init()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Command::Preprocess { force } => preprocess(config, force).await,
        Command::Extract { file, write, force } => extract(config, &file, write, force).await,
        Command::Process { force, dry_run } => process(config, force, dry_run).await,
        Command::List => list(config).await,
        Command::Delete { name } => delete(config, &name).await,
        Command::Ask { query, top_k } => ask(config, &query, top_k).await,
    }
}

/// Explicit path, then the platform default if present, then built-in defaults.
fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    let config = match explicit {
        Some(path) => load_config(path)
            .wrap_err_with(|| format!("Failed to load config from {}", path.display()))?,
        None => match default_config_path().filter(|p| p.is_file()) {
            Some(path) => {
                info!("Using config {}", path.display());
                load_config(&path)?
            }
            None => Config::default(),
        },
    };

    Ok(apply_env_overrides(config)?)
}

async fn preprocess(config: Config, force: bool) -> Result<()> {
    let data_dir = config.data_dir();
    if !data_dir.is_dir() {
        return Err(eyre!("Input directory {} does not exist", data_dir.display()));
    }

    let output_dir = config.output_dir();
    std::fs::create_dir_all(&output_dir)
        .wrap_err_with(|| format!("Failed to create {}", output_dir.display()))?;

    let files = DirectoryScanner::new(&data_dir).scan()?;
    if files.is_empty() {
        warn!("No files found to process");
        return Ok(());
    }

    let extractor = Arc::new(TextExtractor::new(&config.extraction));
    let worker_count = config.pipeline.worker_count;

    let report = tokio::task::spawn_blocking(move || {
        ExtractionPool::new(extractor, output_dir, force, worker_count).run_all(files)
    })
    .await??;

    info!(
        "Preprocessing done: {} written, {} skipped, {} failed",
        report.written,
        report.skipped,
        report.failed.len()
    );
    for (name, message) in &report.failed {
        warn!("{}: {}", name, message);
    }

    Ok(())
}

async fn extract(config: Config, file: &Path, write: bool, force: bool) -> Result<()> {
    let extractor = TextExtractor::new(&config.extraction);
    let options = ExtractOptions {
        output_dir: write.then(|| config.output_dir()),
        write_output: write,
        force,
    };
    let file = file.to_path_buf();

    let text = tokio::task::spawn_blocking(move || extractor.extract(&file, &options)).await??;
    println!("{}", text);
    Ok(())
}

async fn process(config: Config, force: bool, dry_run: bool) -> Result<()> {
    if dry_run {
        let files = DirectoryScanner::new(config.data_dir()).scan()?;
        for file in &files {
            println!("{}", file.display());
        }
        println!("{} files would be processed", files.len());
        return Ok(());
    }

    let service = DocumentService::from_config(config)?;
    let started = service.start_processing(force).await?;
    info!("Started job {}", started.task_id);

    loop {
        tokio::time::sleep(POLL_INTERVAL).await;
        let status = service.status(&started.task_id)?;
        info!("Job {}: {} ({})", started.task_id, status.status, status.progress);

        match status.status.as_str() {
            "completed" => {
                println!("{}", serde_json::to_string_pretty(&status)?);
                return Ok(());
            }
            "failed" => {
                println!("{}", serde_json::to_string_pretty(&status)?);
                return Err(eyre!(
                    "Job {} failed: {}",
                    started.task_id,
                    status.error.unwrap_or_default()
                ));
            }
            _ => {}
        }
    }
}

async fn list(config: Config) -> Result<()> {
    let service = DocumentService::from_config(config)?;
    let listing = service.list_documents().await?;
    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}

async fn delete(config: Config, name: &str) -> Result<()> {
    let service = DocumentService::from_config(config)?;
    let response = service.delete_document(name).await?;
    println!("{}", response.message);
    Ok(())
}

async fn ask(config: Config, query: &str, top_k: Option<usize>) -> Result<()> {
    let service = DocumentService::from_config(config)?;
    let response = service.query(query, top_k).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
