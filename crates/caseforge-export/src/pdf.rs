//! Landscape A4 table rendered with lopdf
//!
//! Helvetica 8pt with word-wrapped cells; rows never split across pages and the header
//! row repeats on every page.

use crate::{cell_value, header_title, ExportError, EXPORT_HEADERS};
use caseforge_domain::TestCaseRecord;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

const PAGE_WIDTH: f32 = 842.0;
const PAGE_HEIGHT: f32 = 595.0;
const MARGIN: f32 = 22.0;
const FONT_SIZE: f32 = 8.0;
const LINE_HEIGHT: f32 = 10.0;
const CELL_PADDING: f32 = 3.0;

/// Average Helvetica glyph width at 8pt, used to estimate wrapping
const CHAR_WIDTH: f32 = 4.2;

const COLUMN_WIDTHS: [f32; 8] = [56.0, 70.0, 140.0, 56.0, 56.0, 140.0, 140.0, 140.0];

pub(crate) fn write_pdf(records: &[TestCaseRecord]) -> Result<Vec<u8>, ExportError> {
    let header: Vec<String> = EXPORT_HEADERS.iter().map(|h| header_title(h)).collect();
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| EXPORT_HEADERS.iter().map(|h| cell_value(record, h)).collect())
        .collect();

    let mut pages = Vec::new();
    let mut page = PageBuilder::new(&header);

    for row in &rows {
        let lines = wrap_row(row);
        if !page.fits(&lines) && page.has_rows {
            pages.push(page.finish());
            page = PageBuilder::new(&header);
        }
        page.draw_row(&lines);
    }
    pages.push(page.finish());

    assemble(pages)
}

struct PageBuilder {
    operations: Vec<Operation>,
    cursor_y: f32,
    has_rows: bool,
}

impl PageBuilder {
    fn new(header: &[String]) -> Self {
        let mut page = Self {
            operations: Vec::new(),
            cursor_y: PAGE_HEIGHT - MARGIN,
            has_rows: false,
        };
        page.draw_row(&wrap_row(header));
        page.has_rows = false;
        page
    }

    fn fits(&self, lines: &[Vec<String>]) -> bool {
        self.cursor_y - row_height(lines) >= MARGIN
    }

    fn draw_row(&mut self, lines: &[Vec<String>]) {
        let height = row_height(lines);
        let top = self.cursor_y;
        let mut x = MARGIN;

        for (width, cell) in COLUMN_WIDTHS.iter().zip(lines) {
            self.operations.push(Operation::new(
                "re",
                vec![x.into(), (top - height).into(), (*width).into(), height.into()],
            ));
            self.operations.push(Operation::new("S", vec![]));

            for (i, line) in cell.iter().enumerate() {
                let baseline = top - CELL_PADDING - FONT_SIZE - i as f32 * LINE_HEIGHT;
                self.operations.push(Operation::new("BT", vec![]));
                self.operations
                    .push(Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]));
                self.operations.push(Operation::new(
                    "Td",
                    vec![(x + CELL_PADDING).into(), baseline.into()],
                ));
                self.operations.push(Operation::new(
                    "Tj",
                    vec![Object::String(latin1(line), StringFormat::Literal)],
                ));
                self.operations.push(Operation::new("ET", vec![]));
            }
            x += width;
        }

        self.cursor_y -= height;
        self.has_rows = true;
    }

    fn finish(self) -> Vec<Operation> {
        self.operations
    }
}

fn row_height(lines: &[Vec<String>]) -> f32 {
    let max_lines = lines.iter().map(Vec::len).max().unwrap_or(1).max(1);
    max_lines as f32 * LINE_HEIGHT + 2.0 * CELL_PADDING
}

fn wrap_row(cells: &[String]) -> Vec<Vec<String>> {
    cells
        .iter()
        .zip(COLUMN_WIDTHS)
        .map(|(cell, width)| {
            let max_chars = ((width - 2.0 * CELL_PADDING) / CHAR_WIDTH).floor() as usize;
            wrap_text(cell, max_chars.max(1))
        })
        .collect()
}

/// Greedy word wrap honouring explicit newlines; words longer than a line are split
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                lines.push(word.drain(..max_chars).collect());
            }
            let word: String = word.into_iter().collect();
            if word.is_empty() {
                continue;
            }

            let needed = line.chars().count() + 1 + word.chars().count();
            if !line.is_empty() && needed > max_chars {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        lines.push(line);
    }

    lines
}

/// WinAnsi-compatible bytes; characters outside Latin-1 become '?'
fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

fn assemble(pages: Vec<Vec<Operation>>) -> Result<Vec<u8>, ExportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for operations in pages {
        let content = Content { operations }
            .encode()
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
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
            "Resources" => resources_id,
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    Ok(buffer)
}
