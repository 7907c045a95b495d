pub mod artifact;
pub mod docx;
pub mod image;
pub mod ocr;
pub mod pdf;
pub mod render;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};

use crate::config::ExtractionConfig;
use crate::error::ProcessError;
use crate::sanitize::redact_path;

pub use artifact::{artifact_path, read_artifact, remove_artifact, write_artifact};
pub use ocr::{OcrEngine, TesseractOcr};
pub use pdf::{TextLayerAssessment, DIGITAL_PAGE_SEPARATOR, OCR_PAGE_BREAK};
pub use render::{PageRenderer, PopplerRenderer};

/// Extensions accepted for upload and batch processing, lowercase, without dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg", "tiff", "docx"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Pdf,
    Image,
    Docx,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "png" | "jpg" | "jpeg" | "tiff" => Some(Self::Image),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// True when the name carries one of [`SUPPORTED_EXTENSIONS`].
pub fn is_supported(path: &Path) -> bool {
    DocumentFormat::from_path(path).is_some()
}

pub trait DocumentProcessor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String, ProcessError>;
    fn supports(&self, format: DocumentFormat) -> bool;
}

/// Where (and whether) extracted text is cached.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub output_dir: Option<PathBuf>,
    pub write_output: bool,
    pub force: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            output_dir: None,
            write_output: true,
            force: false,
        }
    }
}

impl ExtractOptions {
    pub fn cached(output_dir: impl Into<PathBuf>, force: bool) -> Self {
        Self {
            output_dir: Some(output_dir.into()),
            write_output: true,
            force,
        }
    }

    /// Artifact location when caching is active.
    fn artifact_for(&self, source: &Path) -> Option<PathBuf> {
        match &self.output_dir {
            Some(dir) if self.write_output => Some(artifact_path(dir, source)),
            _ => None,
        }
    }
}

/// Routes a document to the processor for its format and maintains the
/// artifact cache around it.
pub struct TextExtractor {
    processors: Vec<Box<dyn DocumentProcessor>>,
}

impl TextExtractor {
    /// Production engines: Tesseract for OCR, poppler for page rendering.
    pub fn new(config: &ExtractionConfig) -> Self {
        Self::with_engines(
            config,
            Arc::new(TesseractOcr::new(&config.ocr)),
            Arc::new(PopplerRenderer::new()),
        )
    }

    pub fn with_engines(
        config: &ExtractionConfig,
        ocr: Arc<dyn OcrEngine>,
        renderer: Arc<dyn PageRenderer>,
    ) -> Self {
        let processors: Vec<Box<dyn DocumentProcessor>> = vec![
            Box::new(pdf::PdfProcessor::new(config, ocr.clone(), renderer)),
            Box::new(image::ImageProcessor::new(ocr)),
            Box::new(docx::DocxProcessor::new()),
        ];

        Self { processors }
    }

    pub fn extract(&self, path: &Path, options: &ExtractOptions) -> Result<String, ProcessError> {
        let filename = redact_path(path);
        let _span = tracing::info_span!("extract", file = %filename, force = options.force).entered();

        if !path.is_file() {
            return Err(ProcessError::NotFound(path.to_path_buf()));
        }

        let format = DocumentFormat::from_path(path).ok_or_else(|| {
            let ext = path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default();
            ProcessError::UnsupportedType(ext)
        })?;

        let artifact = options.artifact_for(path);
        if let Some(artifact) = &artifact {
            if !options.force {
                if let Some(cached) = read_artifact(artifact)? {
                    debug!("Using cached text for {}", filename);
                    return Ok(cached);
                }
            }
        }

        let processor = self
            .processors
            .iter()
            .find(|p| p.supports(format))
            .ok_or_else(|| ProcessError::UnsupportedType(format!("{:?}", format)))?;

        let text = processor.extract(path)?;

        if let Some(artifact) = &artifact {
            write_artifact(artifact, &text)?;
            info!("Saved extracted text for {} ({} chars)", filename, text.chars().count());
        }

        Ok(text)
    }
}
