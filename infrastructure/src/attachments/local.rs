//! Attachment extraction for text files and PDFs.

use draftsmith_application::ports::attachment_extractor::{AttachmentExtractor, ExtractError};
use lopdf::Document;

/// Extensions accepted as attachments
pub const SUPPORTED_EXTENSIONS: [&str; 7] = ["txt", "md", "py", "json", "csv", "m", "pdf"];

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Decodes attachments from disk.
///
/// Text files are tried as UTF-8 first (a leading BOM is dropped); anything
/// else is read as Latin-1, which maps every byte to a character. Text files
/// containing NUL bytes are treated as binary. PDFs go through `lopdf` and
/// yield the text of every page in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalAttachmentExtractor;

impl LocalAttachmentExtractor {
    pub fn new() -> Self {
        Self
    }

    fn decode(bytes: &[u8]) -> Result<String, ExtractError> {
        if bytes.contains(&0) {
            return Err(ExtractError::Decode(
                "file contains NUL bytes and looks binary".to_string(),
            ));
        }

        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        match std::str::from_utf8(bytes) {
            Ok(text) => Ok(text.to_string()),
            Err(_) => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }

    fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
        let document = Document::load_mem(bytes)
            .map_err(|e| ExtractError::Decode(format!("unreadable PDF: {}", e)))?;
        let pages: Vec<u32> = document.get_pages().keys().copied().collect();
        let text = document
            .extract_text(&pages)
            .map_err(|e| ExtractError::Decode(format!("PDF text extraction failed: {}", e)))?;

        // Scanned documents have pages but no text layer
        if text.trim().is_empty() {
            return Err(ExtractError::Decode(
                "PDF contains no extractable text".to_string(),
            ));
        }
        Ok(text)
    }
}

impl AttachmentExtractor for LocalAttachmentExtractor {
    fn extract_text(&self, bytes: &[u8], extension: &str) -> Result<String, ExtractError> {
        if !self.supports(extension) {
            return Err(ExtractError::UnsupportedFormat(extension.to_lowercase()));
        }
        if extension.eq_ignore_ascii_case("pdf") {
            return Self::extract_pdf(bytes);
        }
        Self::decode(bytes)
    }

    fn supports(&self, extension: &str) -> bool {
        SUPPORTED_EXTENSIONS
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    /// One-page PDF showing `line` in Courier
    fn fixture_pdf(line: &str) -> Vec<u8> {
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
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(line)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_utf8_with_bom() {
        let extractor = LocalAttachmentExtractor::new();
        let text = extractor
            .extract_text(b"\xEF\xBB\xBFcaf\xC3\xA9", "TXT")
            .unwrap();
        assert_eq!(text, "café");
    }

    #[test]
    fn test_latin1_fallback() {
        let extractor = LocalAttachmentExtractor::new();
        let text = extractor.extract_text(b"caf\xE9", "md").unwrap();
        assert_eq!(text, "café");
    }

    #[test]
    fn test_nul_bytes_rejected() {
        let extractor = LocalAttachmentExtractor::new();
        let err = extractor.extract_text(b"ab\0cd", "csv").unwrap_err();
        assert!(matches!(err, ExtractError::Decode(_)));
    }

    #[test]
    fn test_pdf_text_extracted() {
        let extractor = LocalAttachmentExtractor::new();
        let bytes = fixture_pdf("Quarterly revenue grew");
        let text = extractor.extract_text(&bytes, "PDF").unwrap();
        assert!(text.contains("Quarterly revenue grew"), "got {:?}", text);
    }

    #[test]
    fn test_broken_pdf_is_a_decode_error() {
        let extractor = LocalAttachmentExtractor::new();
        let err = extractor.extract_text(b"%PDF-1.7\n", "pdf").unwrap_err();
        assert!(matches!(err, ExtractError::Decode(_)));
    }

    #[test]
    fn test_unsupported_formats() {
        let extractor = LocalAttachmentExtractor::new();
        assert!(extractor.supports("pdf"));
        assert!(extractor.supports("M"));
        assert!(!extractor.supports("docx"));
        assert_eq!(
            extractor.extract_text(b"PK\x03\x04", "DOCX").unwrap_err(),
            ExtractError::UnsupportedFormat("docx".to_string())
        );
    }
}
