use std::path::Path;
use std::sync::Arc;

use log::{info, warn};

use crate::config::ExtractionConfig;
use crate::error::ProcessError;
use crate::processor::ocr::OcrEngine;
use crate::processor::render::PageRenderer;
use crate::processor::{DocumentFormat, DocumentProcessor};
use crate::sanitize::redact_path;

/// Separator between per-page embedded text when the text layer is trusted.
pub const DIGITAL_PAGE_SEPARATOR: &str = "\n\n";

/// Separator between per-page OCR output.
pub const OCR_PAGE_BREAK: &str = "\n\n--- PAGE BREAK ---\n\n";

/// How much of a PDF carries a usable text layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLayerAssessment {
    pub total_pages: usize,
    pub digital_pages: usize,
    /// `digital_pages / total_pages`, 0 for an empty document.
    pub confidence: f64,
}

impl TextLayerAssessment {
    /// Scores per-page embedded text. A page is digital when its stripped
    /// text is longer than `min_chars_per_page` characters.
    pub fn assess<S: AsRef<str>>(pages: &[S], min_chars_per_page: usize) -> Self {
        let total_pages = pages.len();
        let digital_pages = pages
            .iter()
            .filter(|page| page.as_ref().trim().chars().count() > min_chars_per_page)
            .count();
        let confidence = if total_pages == 0 {
            0.0
        } else {
            digital_pages as f64 / total_pages as f64
        };

        Self {
            total_pages,
            digital_pages,
            confidence,
        }
    }

    /// The whole document is taken from its text layer only above the threshold.
    pub fn is_digital(&self, threshold: f64) -> bool {
        self.confidence > threshold
    }
}

/// Decides per document between the embedded text layer and full OCR.
///
/// The decision is all-or-nothing: embedded and OCR text are never mixed
/// within one document.
pub struct PdfProcessor {
    ocr: Arc<dyn OcrEngine>,
    renderer: Arc<dyn PageRenderer>,
    min_chars_per_page: usize,
    confidence_threshold: f64,
    dpi: u32,
}

impl PdfProcessor {
    pub fn new(
        config: &ExtractionConfig,
        ocr: Arc<dyn OcrEngine>,
        renderer: Arc<dyn PageRenderer>,
    ) -> Self {
        Self {
            ocr,
            renderer,
            min_chars_per_page: config.min_chars_per_page,
            confidence_threshold: config.digital_confidence_threshold,
            dpi: config.ocr.dpi,
        }
    }

    fn ocr_pages(&self, pdf_bytes: &[u8], page_count: usize) -> Result<String, ProcessError> {
        let _span = tracing::info_span!("processor.pdf_ocr", pages = page_count).entered();

        let mut texts = Vec::with_capacity(page_count);
        for page in 1..=page_count {
            let page = u32::try_from(page)
                .map_err(|_| ProcessError::PdfProcessing("Page number overflow".to_string()))?;
            let image = self.renderer.render_page(pdf_bytes, page, self.dpi)?;
            texts.push(self.ocr.recognize(&image)?);
        }

        Ok(texts.join(OCR_PAGE_BREAK))
    }
}

impl DocumentProcessor for PdfProcessor {
    fn extract(&self, path: &Path) -> Result<String, ProcessError> {
        let _span = tracing::info_span!("processor.pdf").entered();
        let filename = redact_path(path);

        let pdf_bytes = std::fs::read(path).map_err(|e| ProcessError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;

        let page_count = match read_text_layer(&pdf_bytes) {
            Ok(pages) => {
                if pages.is_empty() {
                    return Ok(String::new());
                }

                let assessment = TextLayerAssessment::assess(&pages, self.min_chars_per_page);
                if assessment.is_digital(self.confidence_threshold) {
                    info!(
                        "Skipping OCR (digital confidence {:.0}%): {}",
                        assessment.confidence * 100.0,
                        filename
                    );
                    return Ok(pages.join(DIGITAL_PAGE_SEPARATOR));
                }

                info!(
                    "Low embedded text ({:.0}%), running OCR: {}",
                    assessment.confidence * 100.0,
                    filename
                );
                pages.len()
            }
            Err(reason) => {
                // Unparseable text layer degrades into the OCR path
                warn!("Digital check failed for {}: {}", filename, reason);
                self.renderer.page_count(&pdf_bytes)?
            }
        };

        self.ocr_pages(&pdf_bytes, page_count)
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Pdf)
    }
}

/// Embedded text of every page, in page order.
fn read_text_layer(pdf_bytes: &[u8]) -> Result<Vec<String>, String> {
    let doc = lopdf::Document::load_mem(pdf_bytes).map_err(|e| e.to_string())?;

    doc.get_pages()
        .keys()
        .map(|&page_num| {
            doc.extract_text(&[page_num])
                .map_err(|e| format!("page {}: {}", page_num, e))
        })
        .collect()
}
