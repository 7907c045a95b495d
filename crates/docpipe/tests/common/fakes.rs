//! Counting stand-ins for the OCR engine and page renderer.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use docpipe::error::ProcessError;
use docpipe::processor::{OcrEngine, PageRenderer};

/// Echoes its input bytes as text and counts calls. Inputs listed in
/// `fail_on` produce an OCR error.
#[derive(Default)]
pub struct CountingOcr {
    calls: AtomicUsize,
    fail_on: Mutex<Vec<Vec<u8>>>,
}

impl CountingOcr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_on(&self, image_data: &[u8]) {
        self.fail_on.lock().unwrap().push(image_data.to_vec());
    }
}

impl OcrEngine for CountingOcr {
    fn recognize(&self, image_data: &[u8]) -> Result<String, ProcessError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.lock().unwrap().iter().any(|f| f == image_data) {
            return Err(ProcessError::OcrFailed("unreadable image".to_string()));
        }
        Ok(String::from_utf8_lossy(image_data).into_owned())
    }
}

/// Renders page N as the bytes `"page-N"`. `page_count` reports a fixed
/// value, used only when the PDF structure cannot be parsed.
pub struct FakeRenderer {
    renders: AtomicUsize,
    fallback_pages: usize,
}

impl FakeRenderer {
    pub fn new(fallback_pages: usize) -> Self {
        Self {
            renders: AtomicUsize::new(0),
            fallback_pages,
        }
    }

    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

impl Default for FakeRenderer {
    fn default() -> Self {
        Self::new(0)
    }
}

impl PageRenderer for FakeRenderer {
    fn page_count(&self, _pdf_bytes: &[u8]) -> Result<usize, ProcessError> {
        Ok(self.fallback_pages)
    }

    fn render_page(&self, _pdf_bytes: &[u8], page: u32, _dpi: u32) -> Result<Vec<u8>, ProcessError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        Ok(format!("page-{}", page).into_bytes())
    }
}

/// Expected OCR output for `pages` pages rendered by [`FakeRenderer`].
pub fn fake_ocr_text(pages: usize) -> String {
    (1..=pages)
        .map(|p| format!("page-{}", p))
        .collect::<Vec<_>>()
        .join(docpipe::processor::OCR_PAGE_BREAK)
}
