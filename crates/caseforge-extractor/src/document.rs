//! Text extraction from uploaded requirement documents

use crate::error::DocumentError;
use pulldown_cmark::{Event, Parser, TagEnd};
use quick_xml::events::Event as XmlEvent;
use quick_xml::Reader;
use std::path::Path;
use tracing::{debug, warn};

/// Supported upload formats, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Portable Document Format
    Pdf,
    /// Word document
    Docx,
    /// XML document
    Xml,
    /// Markdown
    Markdown,
    /// Plain UTF-8 text
    Text,
}

impl DocumentKind {
    /// Detect the kind from a file name (case-insensitive extension)
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let extension = Path::new(file_name)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();

        match extension.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "xml" => Some(Self::Xml),
            "md" | "markdown" => Some(Self::Markdown),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Extract plain text from an uploaded file
pub fn extract_document(file_name: &str, bytes: &[u8]) -> Result<String, DocumentError> {
    let kind = DocumentKind::from_file_name(file_name)
        .ok_or_else(|| DocumentError::Unsupported(file_name.to_string()))?;

    debug!("Extracting {:?} document '{}' ({} bytes)", kind, file_name, bytes.len());

    match kind {
        DocumentKind::Pdf => extract_pdf(bytes),
        DocumentKind::Docx => extract_docx(bytes),
        DocumentKind::Xml => extract_xml(bytes),
        DocumentKind::Markdown => Ok(extract_markdown(&String::from_utf8(bytes.to_vec())?)),
        DocumentKind::Text => Ok(String::from_utf8(bytes.to_vec())?),
    }
}

/// Like [`extract_document`], but a failure becomes an explanatory string instead of an error
pub fn extract_or_explain(file_name: &str, bytes: &[u8]) -> String {
    extract_document(file_name, bytes).unwrap_or_else(|e| {
        warn!("Could not extract text from '{}': {}", file_name, e);
        e.to_string()
    })
}

fn extract_pdf(bytes: &[u8]) -> Result<String, DocumentError> {
    let document =
        lopdf::Document::load_mem(bytes).map_err(|e| DocumentError::Pdf(e.to_string()))?;

    let mut pages = Vec::new();
    for page_number in document.get_pages().keys() {
        match document.extract_text(&[*page_number]) {
            Ok(text) if !text.trim().is_empty() => pages.push(text.trim().to_string()),
            Ok(_) => {}
            Err(e) => debug!("Skipping PDF page {}: {}", page_number, e),
        }
    }

    Ok(pages.join("\n"))
}

fn extract_docx(bytes: &[u8]) -> Result<String, DocumentError> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| DocumentError::Docx(e.to_string()))?;

    let mut lines = Vec::new();
    for child in &docx.document.children {
        match child {
            docx_rs::DocumentChild::Paragraph(paragraph) => push_line(&mut lines, paragraph_text(paragraph)),
            docx_rs::DocumentChild::Table(table) => table_lines(table, &mut lines),
            _ => {}
        }
    }

    Ok(lines.join("\n"))
}

fn push_line(lines: &mut Vec<String>, text: String) {
    if !text.trim().is_empty() {
        lines.push(text);
    }
}

fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
    let mut buffer = String::new();
    for child in &paragraph.children {
        match child {
            docx_rs::ParagraphChild::Run(run) => run_text(run, &mut buffer),
            docx_rs::ParagraphChild::Hyperlink(link) => {
                for link_child in &link.children {
                    if let docx_rs::ParagraphChild::Run(run) = link_child {
                        run_text(run, &mut buffer);
                    }
                }
            }
            _ => {}
        }
    }
    buffer
}

fn run_text(run: &docx_rs::Run, buffer: &mut String) {
    for child in &run.children {
        match child {
            docx_rs::RunChild::Text(text) => buffer.push_str(&text.text),
            docx_rs::RunChild::Tab(_) => buffer.push('\t'),
            docx_rs::RunChild::Break(_) => buffer.push('\n'),
            _ => {}
        }
    }
}

/// One line per table row, cells separated by " | "
fn table_lines(table: &docx_rs::Table, lines: &mut Vec<String>) {
    for row in &table.rows {
        let docx_rs::TableChild::TableRow(row) = row;
        let cells: Vec<String> = row
            .cells
            .iter()
            .map(|cell| {
                let docx_rs::TableRowChild::TableCell(cell) = cell;
                cell.children
                    .iter()
                    .filter_map(|content| match content {
                        docx_rs::TableCellContent::Paragraph(p) => Some(paragraph_text(p)),
                        _ => None,
                    })
                    .filter(|text| !text.trim().is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|text| !text.is_empty())
            .collect();
        push_line(lines, cells.join(" | "));
    }
}

/// Text nodes joined by single spaces
fn extract_xml(bytes: &[u8]) -> Result<String, DocumentError> {
    let text = std::str::from_utf8(bytes).map_err(|e| DocumentError::Xml(e.to_string()))?;
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut parts = Vec::new();
    loop {
        match reader.read_event() {
            Ok(XmlEvent::Text(e)) => {
                let value = e.unescape().map_err(|e| DocumentError::Xml(e.to_string()))?;
                if !value.trim().is_empty() {
                    parts.push(value.trim().to_string());
                }
            }
            Ok(XmlEvent::CData(e)) => {
                let value = String::from_utf8_lossy(&e.into_inner()).trim().to_string();
                if !value.is_empty() {
                    parts.push(value);
                }
            }
            Ok(XmlEvent::Eof) => break,
            Err(e) => {
                return Err(DocumentError::Xml(format!(
                    "error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(parts.join(" "))
}

/// Rendered text of a Markdown document, one line per block
fn extract_markdown(source: &str) -> String {
    let mut out = String::new();

    for event in Parser::new(source) {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak | Event::HardBreak => out.push(' '),
            Event::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item | TagEnd::CodeBlock) => {
                if !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }

    out.trim_end().to_string()
}
