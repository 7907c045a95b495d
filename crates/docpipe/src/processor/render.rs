use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::ProcessError;

/// Rasterizes PDF pages for OCR.
pub trait PageRenderer: Send + Sync {
    /// Number of pages, for documents the PDF parser could not open.
    fn page_count(&self, pdf_bytes: &[u8]) -> Result<usize, ProcessError>;

    /// Renders one 1-based page to PNG bytes at the given resolution.
    fn render_page(&self, pdf_bytes: &[u8], page: u32, dpi: u32) -> Result<Vec<u8>, ProcessError>;
}

/// Renders through the poppler command line tools (`pdfinfo`, `pdftoppm`).
#[derive(Debug, Default, Clone, Copy)]
pub struct PopplerRenderer;

impl PopplerRenderer {
    pub fn new() -> Self {
        Self
    }
}

/// Temp file removed on drop.
struct ScratchFile(PathBuf);

impl ScratchFile {
    fn write(prefix: &str, bytes: &[u8]) -> Result<Self, ProcessError> {
        let path =
            std::env::temp_dir().join(format!("docpipe_{}_{}.pdf", prefix, uuid::Uuid::new_v4()));
        std::fs::write(&path, bytes)
            .map_err(|e| ProcessError::RenderFailed(format!("Failed to write temp PDF: {}", e)))?;
        Ok(Self(path))
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

impl PageRenderer for PopplerRenderer {
    fn page_count(&self, pdf_bytes: &[u8]) -> Result<usize, ProcessError> {
        let pdf = ScratchFile::write("pagecount", pdf_bytes)?;

        let output = Command::new("pdfinfo")
            .arg(pdf.path())
            .output()
            .map_err(|e| {
                ProcessError::RenderFailed(format!(
                    "Failed to run pdfinfo: {}. Make sure poppler-utils is installed.",
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(ProcessError::RenderFailed(format!(
                "pdfinfo failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        parse_pdfinfo_pages(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            ProcessError::RenderFailed("pdfinfo did not report a page count".to_string())
        })
    }

    fn render_page(&self, pdf_bytes: &[u8], page: u32, dpi: u32) -> Result<Vec<u8>, ProcessError> {
        let pdf = ScratchFile::write("render", pdf_bytes)?;
        let output_prefix =
            std::env::temp_dir().join(format!("docpipe_page_{}", uuid::Uuid::new_v4()));

        let page_arg = page.to_string();
        let output = Command::new("pdftoppm")
            .args(["-png", "-r", &dpi.to_string(), "-f", &page_arg, "-l", &page_arg])
            .arg(pdf.path())
            .arg(&output_prefix)
            .output()
            .map_err(|e| {
                ProcessError::RenderFailed(format!(
                    "Failed to run pdftoppm: {}. Make sure poppler-utils is installed.",
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(ProcessError::RenderFailed(format!(
                "pdftoppm failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        // pdftoppm zero-pads the page suffix depending on the document's page count
        let prefix = output_prefix.display();
        let candidates = [
            format!("{}-{}.png", prefix, page),
            format!("{}-{:02}.png", prefix, page),
            format!("{}-{:03}.png", prefix, page),
            format!("{}-{:04}.png", prefix, page),
        ];
        let image_path = candidates
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
            .ok_or_else(|| {
                ProcessError::RenderFailed(format!("Rendered image for page {} not found", page))
            })?;

        let image_data = std::fs::read(&image_path);
        let _ = std::fs::remove_file(&image_path);

        image_data.map_err(|e| {
            ProcessError::RenderFailed(format!("Failed to read rendered image: {}", e))
        })
    }
}

fn parse_pdfinfo_pages(stdout: &str) -> Option<usize> {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|count| count.trim().parse::<usize>().ok())
}
