use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ProcessError;
use crate::processor::{DocumentFormat, DocumentProcessor};

/// Emits the body paragraphs of a DOCX file, one per line.
pub struct DocxProcessor;

impl DocxProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentProcessor for DocxProcessor {
    fn extract(&self, path: &Path) -> Result<String, ProcessError> {
        let _span = tracing::info_span!("processor.docx").entered();

        let file = std::fs::File::open(path).map_err(|e| ProcessError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut archive = zip::ZipArchive::new(file)
            .map_err(|e| ProcessError::DocxProcessing(format!("Failed to open DOCX: {}", e)))?;

        let mut document_xml = archive
            .by_name("word/document.xml")
            .map_err(|e| ProcessError::DocxProcessing(format!("Failed to find document.xml: {}", e)))?;

        let mut xml_content = String::new();
        document_xml
            .read_to_string(&mut xml_content)
            .map_err(|e| ProcessError::DocxProcessing(format!("Failed to read document.xml: {}", e)))?;

        parse_docx_xml(&xml_content)
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Docx)
    }
}

/// Tracks where the reader is inside `word/document.xml`.
#[derive(Default)]
struct ParagraphCollector {
    paragraphs: Vec<String>,
    current: String,
    paragraph_depth: usize,
    table_depth: usize,
    run_depth: usize,
    in_text: bool,
}

impl ParagraphCollector {
    /// Only top-level body paragraphs count; table cells and text boxes do not.
    fn collecting(&self) -> bool {
        self.table_depth == 0 && self.paragraph_depth == 1
    }

    fn push_str(&mut self, s: &str) {
        if self.collecting() && self.in_text {
            self.current.push_str(s);
        }
    }

    fn push_run_char(&mut self, c: char) {
        if self.collecting() && self.run_depth > 0 {
            self.current.push(c);
        }
    }

    fn open(&mut self, name: &[u8]) {
        match name {
            b"tbl" => self.table_depth += 1,
            b"p" => {
                self.paragraph_depth += 1;
                if self.collecting() {
                    self.current.clear();
                }
            }
            b"r" => self.run_depth += 1,
            b"t" => self.in_text = true,
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"tbl" => self.table_depth = self.table_depth.saturating_sub(1),
            b"p" => {
                if self.collecting() {
                    self.paragraphs.push(std::mem::take(&mut self.current));
                }
                self.paragraph_depth = self.paragraph_depth.saturating_sub(1);
            }
            b"r" => self.run_depth = self.run_depth.saturating_sub(1),
            b"t" => self.in_text = false,
            _ => {}
        }
    }

    fn empty(&mut self, name: &[u8]) {
        match name {
            b"p" => {
                if self.table_depth == 0 && self.paragraph_depth == 0 {
                    self.paragraphs.push(String::new());
                }
            }
            b"tab" => self.push_run_char('\t'),
            b"br" | b"cr" => self.push_run_char('\n'),
            _ => {}
        }
    }
}

fn parse_docx_xml(xml: &str) -> Result<String, ProcessError> {
    let mut reader = Reader::from_str(xml);
    let mut collector = ParagraphCollector::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => collector.open(e.local_name().as_ref()),
            Ok(Event::End(ref e)) => collector.close(e.local_name().as_ref()),
            Ok(Event::Empty(ref e)) => collector.empty(e.local_name().as_ref()),
            Ok(Event::Text(ref e)) => {
                let decoded = String::from_utf8_lossy(e);
                collector.push_str(&decoded);
            }
            Ok(Event::GeneralRef(ref e)) => {
                let name = String::from_utf8_lossy(e);
                if let Some(resolved) = resolve_entity(&name) {
                    collector.push_str(&resolved);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ProcessError::DocxProcessing(format!(
                    "XML parsing error: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(collector.paragraphs.join("\n"))
}

/// Resolves `&name;` references: the five predefined entities and numeric character refs.
fn resolve_entity(name: &str) -> Option<String> {
    if let Some(numeric) = name.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }

    quick_xml::escape::resolve_predefined_entity(name).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        )
    }

    #[test]
    fn test_supports_docx_format() {
        let processor = DocxProcessor::new();
        assert!(processor.supports(DocumentFormat::Docx));
        assert!(!processor.supports(DocumentFormat::Pdf));
        assert!(!processor.supports(DocumentFormat::Image));
    }

    #[test]
    fn test_paragraphs_joined_by_newline() {
        let xml = wrap(
            "<w:p><w:r><w:t>Hello</w:t></w:r><w:r><w:t xml:space=\"preserve\"> World</w:t></w:r></w:p>\
             <w:p><w:r><w:t>Second paragraph</w:t></w:r></w:p>",
        );
        assert_eq!(parse_docx_xml(&xml).unwrap(), "Hello World\nSecond paragraph");
    }

    #[test]
    fn test_empty_paragraphs_kept() {
        let xml = wrap("<w:p><w:r><w:t>A</w:t></w:r></w:p><w:p/><w:p></w:p><w:p><w:r><w:t>B</w:t></w:r></w:p>");
        assert_eq!(parse_docx_xml(&xml).unwrap(), "A\n\n\nB");
    }

    #[test]
    fn test_tabs_and_breaks_inside_runs() {
        let xml = wrap(
            "<w:p><w:pPr><w:tabs><w:tab w:val=\"left\" w:pos=\"720\"/></w:tabs></w:pPr>\
             <w:r><w:t>Name</w:t><w:tab/><w:t>Value</w:t><w:br/><w:t>Next</w:t></w:r></w:p>",
        );
        assert_eq!(parse_docx_xml(&xml).unwrap(), "Name\tValue\nNext");
    }

    #[test]
    fn test_table_paragraphs_skipped() {
        let xml = wrap(
            "<w:p><w:r><w:t>Before</w:t></w:r></w:p>\
             <w:tbl><w:tr><w:tc><w:p><w:r><w:t>Cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>\
             <w:p><w:r><w:t>After</w:t></w:r></w:p>",
        );
        assert_eq!(parse_docx_xml(&xml).unwrap(), "Before\nAfter");
    }

    #[test]
    fn test_entities_resolved() {
        let xml = wrap("<w:p><w:r><w:t>R&amp;D &lt;draft&gt; &#169;</w:t></w:r></w:p>");
        assert_eq!(parse_docx_xml(&xml).unwrap(), "R&D <draft> ©");
    }

    #[test]
    fn test_resolve_entity() {
        assert_eq!(resolve_entity("amp").as_deref(), Some("&"));
        assert_eq!(resolve_entity("#x41").as_deref(), Some("A"));
        assert_eq!(resolve_entity("#66").as_deref(), Some("B"));
        assert_eq!(resolve_entity("nbsp"), None);
    }

    #[test]
    fn test_invalid_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.docx");
        std::fs::write(&path, b"not a zip").unwrap();

        let result = DocxProcessor::new().extract(&path);
        assert!(matches!(result, Err(ProcessError::DocxProcessing(_))));
    }
}
