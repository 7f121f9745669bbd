//! Contract text extraction.
//!
//! Supports two formats: PDF (page text via `lopdf`) and plain UTF-8 text.
//! Extension matching is case-insensitive on the uploaded filename.

use huurwijzer_core::DocumentError;
use lopdf::Document;

/// Extract the text of an uploaded contract.
///
/// Dispatches on the filename extension: `.pdf` runs page-by-page text
/// extraction, `.txt` decodes the bytes as UTF-8, anything else is rejected
/// up front without touching the bytes.
pub fn extract_text(filename: &str, bytes: &[u8]) -> Result<String, DocumentError> {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".pdf") {
        extract_pdf(bytes)
    } else if lower.ends_with(".txt") {
        extract_txt(bytes)
    } else {
        Err(DocumentError::UnsupportedFileType(filename.to_string()))
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, DocumentError> {
    let doc = Document::load_mem(bytes).map_err(|e| DocumentError::Extraction(e.to_string()))?;

    let mut pages: Vec<String> = Vec::new();
    for (page_number, _) in doc.get_pages() {
        let text = doc
            .extract_text(&[page_number])
            .map_err(|e| DocumentError::Extraction(format!("page {page_number}: {e}")))?;
        pages.push(text);
    }

    Ok(pages.join("\n"))
}

fn extract_txt(bytes: &[u8]) -> Result<String, DocumentError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| DocumentError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    fn sample_pdf(text: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().unwrap(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn txt_decodes_utf8() {
        let text = extract_text("contract.txt", "Huurcontract voor Amsterdam".as_bytes()).unwrap();
        assert_eq!(text, "Huurcontract voor Amsterdam");
    }

    #[test]
    fn txt_rejects_invalid_utf8() {
        let err = extract_text("contract.txt", &[0xff, 0xfe, 0x41]).unwrap_err();
        assert_eq!(err.kind(), "decode_error");
    }

    #[test]
    fn pdf_extracts_page_text() {
        let bytes = sample_pdf("Monthly rent: 1400 euro");
        let text = extract_text("contract.pdf", &bytes).unwrap();
        assert!(text.contains("Monthly rent: 1400 euro"));
    }

    #[test]
    fn malformed_pdf_is_extraction_error() {
        let err = extract_text("contract.pdf", b"not a pdf at all").unwrap_err();
        assert_eq!(err.kind(), "extraction_error");
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        assert!(extract_text("CONTRACT.TXT", b"ok").is_ok());
        let bytes = sample_pdf("hello");
        assert!(extract_text("Contract.PDF", &bytes).is_ok());
    }

    #[test]
    fn unknown_extension_rejected_without_reading_bytes() {
        let err = extract_text("contract.docx", b"PK\x03\x04").unwrap_err();
        assert_eq!(err.kind(), "unsupported_file_type");
        assert!(err.to_string().contains("contract.docx"));
    }
}
