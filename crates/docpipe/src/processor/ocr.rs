use std::io::Cursor;

use crate::config::OcrConfig;
use crate::error::ProcessError;

/// Text recognition over a single rendered page or scanned image.
///
/// Implementations receive encoded image bytes (PNG, JPEG, TIFF).
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image_data: &[u8]) -> Result<String, ProcessError>;
}

/// Tesseract-backed OCR through leptess.
pub struct TesseractOcr {
    languages: String,
    page_segmentation_mode: u32,
}

impl TesseractOcr {
    pub fn new(config: &OcrConfig) -> Self {
        let languages = if config.languages.is_empty() {
            "eng".to_string()
        } else {
            config.languages.join("+")
        };

        Self {
            languages,
            page_segmentation_mode: config.page_segmentation_mode,
        }
    }

    pub fn languages(&self) -> &str {
        &self.languages
    }

    /// Decodes any supported image format and re-encodes it as PNG for Tesseract.
    fn normalize_to_png(image_data: &[u8]) -> Result<Vec<u8>, ProcessError> {
        let img = image::load_from_memory(image_data)
            .map_err(|e| ProcessError::OcrFailed(format!("Failed to load image: {}", e)))?;

        let mut png_data = Vec::new();
        img.write_to(&mut Cursor::new(&mut png_data), image::ImageFormat::Png)
            .map_err(|e| ProcessError::OcrFailed(format!("Failed to convert image: {}", e)))?;

        Ok(png_data)
    }
}

impl OcrEngine for TesseractOcr {
    #[cfg(feature = "tesseract")]
    fn recognize(&self, image_data: &[u8]) -> Result<String, ProcessError> {
        let _span = tracing::info_span!("processor.ocr").entered();

        let png_data = Self::normalize_to_png(image_data)?;

        let mut lt = leptess::LepTess::new(None, &self.languages).map_err(|e| {
            ProcessError::OcrFailed(format!("Failed to initialize Tesseract: {}", e))
        })?;

        lt.set_variable(
            leptess::Variable::TesseditPagesegMode,
            &self.page_segmentation_mode.to_string(),
        )
        .map_err(|e| ProcessError::OcrFailed(format!("Failed to set page segmentation: {}", e)))?;

        lt.set_image_from_mem(&png_data)
            .map_err(|e| ProcessError::OcrFailed(format!("Failed to set image for OCR: {}", e)))?;

        lt.get_utf8_text()
            .map_err(|e| ProcessError::OcrFailed(format!("OCR failed: {}", e)))
    }

    #[cfg(not(feature = "tesseract"))]
    fn recognize(&self, image_data: &[u8]) -> Result<String, ProcessError> {
        let _span = tracing::info_span!("processor.ocr").entered();

        Self::normalize_to_png(image_data)?;
        Err(ProcessError::OcrFailed(format!(
            "docpipe was built without the `tesseract` feature (languages: {}, psm: {})",
            self.languages, self.page_segmentation_mode
        )))
    }
}
