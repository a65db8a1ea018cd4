//! Plain-text extraction from uploaded documents

use pulldown_cmark::{Event, Parser, TagEnd};
use quick_xml::events::Event as XmlEvent;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{debug, info};

use crate::core::errors::ExtractionError;

/// Default upload ceiling (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Cap on the decompressed size of a docx body
const MAX_DOCX_XML_BYTES: u64 = 64 * 1024 * 1024;

/// Turns a file on disk into text
pub trait DocumentExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String, ExtractionError>;
}

/// Extractor for `.txt`, `.md`, `.docx` and `.pdf` files
#[derive(Debug, Clone)]
pub struct FileExtractor {
    max_bytes: u64,
}

impl Default for FileExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES)
    }
}

impl FileExtractor {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, ExtractionError> {
        let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ExtractionError::NotFound {
                path: path.display().to_string(),
            },
            _ => ExtractionError::IoError(e),
        })?;

        if metadata.len() > self.max_bytes {
            return Err(ExtractionError::TooLarge {
                size: metadata.len(),
                max: self.max_bytes,
            });
        }

        Ok(std::fs::read(path)?)
    }
}

impl DocumentExtractor for FileExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        // Reject before reading anything
        if !matches!(ext.as_str(), "txt" | "text" | "md" | "markdown" | "docx" | "pdf") {
            return Err(ExtractionError::UnsupportedFormat {
                format: if ext.is_empty() { "unknown".to_string() } else { ext },
            });
        }

        let bytes = self.read_bytes(path)?;
        let text = match ext.as_str() {
            "docx" => docx_to_text(&bytes)?,
            "pdf" => pdf_to_text(&bytes)?,
            "md" | "markdown" => markdown_to_text(&utf8(bytes)?),
            _ => utf8(bytes)?,
        };

        info!(format = %ext, chars = text.chars().count(), "document extracted");
        Ok(normalize_newlines(&text))
    }
}

fn utf8(bytes: Vec<u8>) -> Result<String, ExtractionError> {
    String::from_utf8(bytes).map_err(|_| ExtractionError::Encoding)
}

/// Convert CRLF and lone CR line endings to LF
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Render markdown to plain text, one line per block
pub fn markdown_to_text(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());

    for event in Parser::new(markdown) {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak => out.push(' '),
            Event::HardBreak => out.push('\n'),
            Event::End(TagEnd::Paragraph)
            | Event::End(TagEnd::Heading(_))
            | Event::End(TagEnd::Item)
            | Event::End(TagEnd::CodeBlock)
            | Event::End(TagEnd::TableRow) => out.push('\n'),
            _ => {}
        }
    }

    out.trim_end().to_string()
}

/// Pull the text runs out of `word/document.xml`, one line per paragraph
pub fn docx_to_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let entry = archive.by_name("word/document.xml")?;

    if entry.size() > MAX_DOCX_XML_BYTES {
        return Err(ExtractionError::TooLarge {
            size: entry.size(),
            max: MAX_DOCX_XML_BYTES,
        });
    }

    let mut xml = String::new();
    entry
        .take(MAX_DOCX_XML_BYTES)
        .read_to_string(&mut xml)
        .map_err(|_| ExtractionError::Encoding)?;

    let mut reader = Reader::from_str(&xml);
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(XmlEvent::Start(e)) if e.name().as_ref() == b"w:t" => in_text = true,
            Ok(XmlEvent::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => out.push('\n'),
                _ => {}
            },
            Ok(XmlEvent::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => out.push('\t'),
                b"w:br" => out.push('\n'),
                _ => {}
            },
            Ok(XmlEvent::Text(e)) if in_text => {
                let text = e.unescape().map_err(|err| ExtractionError::Archive {
                    message: err.to_string(),
                })?;
                out.push_str(&text);
            }
            Ok(XmlEvent::Eof) => break,
            Err(e) => {
                return Err(ExtractionError::Archive {
                    message: format!("invalid document.xml: {}", e),
                })
            }
            _ => {}
        }
    }

    debug!(chars = out.len(), "docx body parsed");
    Ok(out.trim_end().to_string())
}

/// Text of every page in order. Scanned PDFs without a text layer are
/// reported as unreadable.
pub fn pdf_to_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let document = lopdf::Document::load_mem(bytes)?;
    let pages: Vec<u32> = document.get_pages().keys().copied().collect();
    if pages.is_empty() {
        return Err(ExtractionError::Archive {
            message: "PDF has no pages".to_string(),
        });
    }

    let text = document.extract_text(&pages)?;
    if text.trim().is_empty() {
        return Err(ExtractionError::Archive {
            message: "PDF has no extractable text".to_string(),
        });
    }

    debug!(pages = pages.len(), chars = text.len(), "pdf body parsed");
    Ok(text.trim_end().to_string())
}
