//! Turning uploaded documents into plain text.
//!
//! The [`TextExtractor`] trait is the contract the ingestion pipeline needs:
//! given a typed document payload, return its text or say why it cannot.
//! [`DefaultExtractor`] handles plain text, PDF with the `pdf` feature, and
//! DOCX with the `docx` feature. Other formats can be supported by plugging in
//! another implementation.

use std::fmt;
use std::path::Path;

use crate::error::{RagError, Result};

/// The declared type of an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// Paginated binary documents (`.pdf`).
    Pdf,
    /// Structured word-processor markup (`.docx`).
    Docx,
    /// Plain text (`.txt`, `.md`, `.markdown`).
    PlainText,
    /// Anything else, carrying the lowercase extension (possibly empty).
    Other(String),
}

impl DocumentKind {
    /// Classify a file name by its extension, case-insensitively.
    pub fn from_file_name(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "txt" | "md" | "markdown" => Self::PlainText,
            _ => Self::Other(ext),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdf => f.write_str("pdf"),
            Self::Docx => f.write_str("docx"),
            Self::PlainText => f.write_str("text"),
            Self::Other(ext) if ext.is_empty() => f.write_str("unknown"),
            Self::Other(ext) => f.write_str(ext),
        }
    }
}

/// Raw document bytes plus the name and type they were uploaded with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPayload {
    /// Source name, used to derive record ids.
    pub name: String,
    /// Declared document type.
    pub kind: DocumentKind,
    /// The file contents.
    pub bytes: Vec<u8>,
}

impl DocumentPayload {
    /// Create a payload whose kind is inferred from `name`.
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        let kind = DocumentKind::from_file_name(&name);
        Self { name, kind, bytes: bytes.into() }
    }

    /// Read a file from disk, naming the payload after the file name.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ExtractionError`] if the file cannot be read.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| path.display().to_string());
        let bytes = std::fs::read(path)
            .map_err(|e| RagError::ExtractionError { name: name.clone(), message: e.to_string() })?;
        Ok(Self::new(name, bytes))
    }
}

/// Extracts plain text from a document payload.
pub trait TextExtractor: Send + Sync {
    /// Return the document's text.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::UnsupportedDocument`] for types this extractor does
    /// not handle and [`RagError::ExtractionError`] when the contents are unreadable.
    fn extract(&self, document: &DocumentPayload) -> Result<String>;
}

/// Extractor for plain text, PDF (`pdf` feature), and DOCX (`docx` feature).
///
/// DOCX text is the document body's paragraphs joined with `\n`; headers,
/// footers, and comments are not read.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExtractor;

impl DefaultExtractor {
    fn unsupported(document: &DocumentPayload) -> RagError {
        RagError::UnsupportedDocument {
            name: document.name.clone(),
            kind: document.kind.to_string(),
        }
    }

    #[cfg(feature = "pdf")]
    fn extract_pdf(document: &DocumentPayload) -> Result<String> {
        pdf_extract::extract_text_from_mem(&document.bytes).map_err(|e| RagError::ExtractionError {
            name: document.name.clone(),
            message: e.to_string(),
        })
    }

    #[cfg(not(feature = "pdf"))]
    fn extract_pdf(document: &DocumentPayload) -> Result<String> {
        Err(Self::unsupported(document))
    }

    #[cfg(feature = "docx")]
    fn extract_docx(document: &DocumentPayload) -> Result<String> {
        use std::io::{Cursor, Read};

        let unreadable = |message: String| RagError::ExtractionError {
            name: document.name.clone(),
            message,
        };
        let mut archive = zip::ZipArchive::new(Cursor::new(document.bytes.as_slice()))
            .map_err(|e| unreadable(e.to_string()))?;
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .map_err(|e| unreadable(e.to_string()))?
            .read_to_string(&mut xml)
            .map_err(|e| unreadable(e.to_string()))?;
        docx_paragraphs(&xml).map_err(unreadable)
    }

    #[cfg(not(feature = "docx"))]
    fn extract_docx(document: &DocumentPayload) -> Result<String> {
        Err(Self::unsupported(document))
    }
}

/// Paragraph text of a WordprocessingML body, one line per `w:p`.
#[cfg(feature = "docx")]
fn docx_paragraphs(xml: &str) -> std::result::Result<String, String> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" => current.push('\n'),
                b"w:p" => paragraphs.push(String::new()),
                _ => {}
            },
            Event::Text(text) if in_text => {
                current.push_str(&text.unescape().map_err(|e| e.to_string())?);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(paragraphs.join("\n"))
}

impl TextExtractor for DefaultExtractor {
    fn extract(&self, document: &DocumentPayload) -> Result<String> {
        match document.kind {
            DocumentKind::PlainText => String::from_utf8(document.bytes.clone()).map_err(|e| {
                RagError::ExtractionError { name: document.name.clone(), message: e.to_string() }
            }),
            DocumentKind::Pdf => Self::extract_pdf(document),
            DocumentKind::Docx => Self::extract_docx(document),
            DocumentKind::Other(_) => Err(Self::unsupported(document)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_extension() {
        assert_eq!(DocumentKind::from_file_name("a.PDF"), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_file_name("report.docx"), DocumentKind::Docx);
        assert_eq!(DocumentKind::from_file_name("notes.txt"), DocumentKind::PlainText);
        assert_eq!(DocumentKind::from_file_name("README.md"), DocumentKind::PlainText);
        assert_eq!(DocumentKind::from_file_name("data.csv"), DocumentKind::Other("csv".into()));
        assert_eq!(DocumentKind::from_file_name("Makefile"), DocumentKind::Other(String::new()));
    }

    #[test]
    fn extracts_utf8_text() {
        let doc = DocumentPayload::new("notes.txt", "hello world");
        assert_eq!(DefaultExtractor.extract(&doc).unwrap(), "hello world");
    }

    #[test]
    fn invalid_utf8_is_an_extraction_error() {
        let doc = DocumentPayload::new("notes.txt", vec![0xffu8, 0xfe, 0x00]);
        assert!(matches!(DefaultExtractor.extract(&doc), Err(RagError::ExtractionError { .. })));
    }

    #[test]
    fn unknown_types_are_unsupported() {
        let doc = DocumentPayload::new("sheet.xlsx", vec![1u8, 2, 3]);
        let err = DefaultExtractor.extract(&doc).unwrap_err();
        assert!(matches!(err, RagError::UnsupportedDocument { ref kind, .. } if kind == "xlsx"));
    }

    #[cfg(not(feature = "docx"))]
    #[test]
    fn docx_needs_the_docx_feature() {
        let doc = DocumentPayload::new("memo.docx", vec![0x50u8, 0x4b]);
        assert!(matches!(
            DefaultExtractor.extract(&doc),
            Err(RagError::UnsupportedDocument { .. })
        ));
    }

    #[cfg(feature = "docx")]
    fn docx(body: &str) -> Vec<u8> {
        use std::io::{Cursor, Write};

        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[cfg(feature = "docx")]
    #[test]
    fn docx_paragraphs_are_joined_by_newlines() {
        let body = concat!(
            r#"<w:p><w:r><w:t>Quarterly </w:t></w:r><w:r><w:t>report</w:t></w:r></w:p>"#,
            r#"<w:p/>"#,
            r#"<w:p><w:r><w:t xml:space="preserve">Costs &amp; revenue</w:t><w:tab/>"#,
            r#"<w:t>rose.</w:t></w:r></w:p>"#,
        );
        let doc = DocumentPayload::new("memo.docx", docx(body));

        let text = DefaultExtractor.extract(&doc).unwrap();

        assert_eq!(text, "Quarterly report\n\nCosts & revenue\trose.");
    }

    #[cfg(feature = "docx")]
    #[test]
    fn docx_that_is_not_a_zip_is_an_extraction_error() {
        let doc = DocumentPayload::new("memo.docx", b"PK\x03\x04 truncated".to_vec());
        assert!(matches!(DefaultExtractor.extract(&doc), Err(RagError::ExtractionError { .. })));
    }

    #[cfg(not(feature = "pdf"))]
    #[test]
    fn pdf_needs_the_pdf_feature() {
        let doc = DocumentPayload::new("paper.pdf", b"%PDF-1.4".to_vec());
        assert!(matches!(
            DefaultExtractor.extract(&doc),
            Err(RagError::UnsupportedDocument { .. })
        ));
    }

    #[test]
    fn reads_payload_from_disk() {
        let path = std::env::temp_dir().join(format!("ragdoc-extract-{}.txt", std::process::id()));
        std::fs::write(&path, "on disk").unwrap();
        let doc = DocumentPayload::from_path(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(doc.kind, DocumentKind::PlainText);
        assert_eq!(doc.bytes, b"on disk");
    }
}
