//! Synthetic documents built in memory.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use lopdf::dictionary;
use lopdf::{Document, Object, Stream};

/// A sentence comfortably above the 50-character digital threshold.
pub fn digital_page_text(page: usize) -> String {
    format!(
        "Quarterly report page {} covering revenue, expenses and outlook for all regions",
        page
    )
}

/// Builds a PDF with one page per entry. `Some(text)` pages carry a text
/// layer, `None` pages have an empty content stream (like a bare scan).
pub fn build_pdf(pages: &[Option<String>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let content = match page {
            Some(text) => format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", text),
            None => String::new(),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! {
                    "F1" => font_id,
                },
            },
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("Failed to serialize PDF");
    buf
}

/// `digital` text pages followed by `scanned` empty pages.
pub fn build_mixed_pdf(digital: usize, scanned: usize) -> Vec<u8> {
    let mut pages: Vec<Option<String>> = (1..=digital).map(|i| Some(digital_page_text(i))).collect();
    pages.extend((0..scanned).map(|_| None));
    build_pdf(&pages)
}

/// Pages whose only text is a page number, as in a scan with a stamped footer.
pub fn build_page_number_pdf(pages: usize) -> Vec<u8> {
    let pages: Vec<Option<String>> = (1..=pages).map(|i| Some(i.to_string())).collect();
    build_pdf(&pages)
}

/// What lopdf reads back from each page, in page order.
pub fn embedded_page_texts(pdf_bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(pdf_bytes).expect("Failed to load PDF");
    doc.get_pages()
        .keys()
        .map(|&page| doc.extract_text(&[page]).expect("Failed to extract page text"))
        .collect()
}

/// Minimal DOCX with one body paragraph per entry.
pub fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| {
            let escaped = p
                .replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;");
            format!(
                "<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
                escaped
            )
        })
        .collect();
    let document_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );

    let mut buf = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buf);
        let options = zip::write::SimpleFileOptions::default();

        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(
            br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#,
        )
        .unwrap();

        zip.start_file("word/document.xml", options).unwrap();
        zip.write_all(document_xml.as_bytes()).unwrap();

        zip.finish().unwrap();
    }
    buf.into_inner()
}

/// A small valid PNG.
pub fn build_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(8, 8, image::Rgb([255, 255, 255]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("Failed to encode PNG");
    buf.into_inner()
}
