/*!
 * PDF adapters over `lopdf`.
 *
 * `PdfReader` extracts per-page text and detects raster images.
 * `PdfWriter` lays out plain text blocks on A4 pages with the base-14
 * Helvetica fonts, which only cover printable ASCII here.
 */

use std::path::Path;

use log::debug;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

use crate::document::reader::{DocumentHandle, DocumentReader};
use crate::document::writer::{DocumentBuilder, DocumentWriter, FontStyle};
use crate::errors::DocumentError;

/// A4 width in points
const PAGE_WIDTH: f32 = 595.0;
/// A4 height in points
const PAGE_HEIGHT: f32 = 842.0;
/// 15 mm in points
const MARGIN: f32 = 42.5;
/// Extra space after each block, in points
const BLOCK_SPACING: f32 = 6.0;

/// Reader for PDF files
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfReader;

/// An opened PDF
pub struct PdfHandle {
    document: Document,
    // @field: (page number, page object id), ascending
    pages: Vec<(u32, ObjectId)>,
}

impl DocumentReader for PdfReader {
    fn open(&self, path: &Path) -> Result<Box<dyn DocumentHandle>, DocumentError> {
        let document = Document::load(path).map_err(|e| DocumentError::Open {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let pages: Vec<(u32, ObjectId)> = document.get_pages().into_iter().collect();
        debug!("Opened {:?} with {} pages", path, pages.len());
        Ok(Box::new(PdfHandle { document, pages }))
    }
}

impl PdfHandle {
    fn page(&self, index: usize) -> Result<(u32, ObjectId), DocumentError> {
        self.pages.get(index).copied().ok_or_else(|| DocumentError::Extraction {
            page: index,
            message: format!("page index out of range (document has {} pages)", self.pages.len()),
        })
    }
}

impl DocumentHandle for PdfHandle {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn extract_text(&self, index: usize) -> Result<String, DocumentError> {
        let (number, _) = self.page(index)?;
        self.document
            .extract_text(&[number])
            .map_err(|e| DocumentError::Extraction { page: index, message: e.to_string() })
    }

    fn has_raster_content(&self, index: usize) -> bool {
        match self.page(index) {
            Ok((_, id)) => self
                .document
                .get_page_images(id)
                .map(|images| !images.is_empty())
                .unwrap_or(false),
            Err(_) => false,
        }
    }
}

/// Writer producing PDF files
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfWriter;

impl DocumentWriter for PdfWriter {
    fn new_document(&self) -> Box<dyn DocumentBuilder> {
        Box::new(PdfBuilder::new())
    }
}

/// Layout state of a PDF being built
#[derive(Debug, Default)]
pub struct PdfBuilder {
    pages: Vec<Vec<Operation>>,
    style: FontStyle,
    // @field: baseline of the next line, from the page bottom
    cursor_y: f32,
}

impl PdfBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    fn font(style: FontStyle) -> (&'static str, f32) {
        match style {
            FontStyle::Title => ("F2", 18.0),
            FontStyle::Heading => ("F2", 14.0),
            FontStyle::Body => ("F1", 11.0),
        }
    }

    fn start_page(&mut self) {
        self.pages.push(Vec::new());
        self.cursor_y = PAGE_HEIGHT - MARGIN;
    }

    fn emit_line(&mut self, line: &str, font: &'static str, size: f32) {
        let line_height = size * 1.4;
        if self.pages.is_empty() || self.cursor_y - line_height < MARGIN {
            self.start_page();
        }
        self.cursor_y -= line_height;

        if line.is_empty() {
            return;
        }
        let y = self.cursor_y;
        if let Some(ops) = self.pages.last_mut() {
            ops.push(Operation::new("BT", vec![]));
            ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
            ops.push(Operation::new("Td", vec![MARGIN.into(), y.into()]));
            ops.push(Operation::new("Tj", vec![Object::string_literal(line)]));
            ops.push(Operation::new("ET", vec![]));
        }
    }
}

/// Approximate Helvetica advance width in em units
fn char_width(c: char) -> f32 {
    match c {
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '!' | '|' | 'I' => 0.28,
        ' ' | 'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '-' => 0.33,
        'm' | 'w' | 'M' | 'W' | '@' => 0.85,
        'A'..='Z' => 0.68,
        _ => 0.56,
    }
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().map(char_width).sum::<f32>() * size
}

/// Greedy word wrap of one line to `max_width` points
fn wrap_line(line: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in line.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if text_width(&candidate, size) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        // A single word wider than the line is cut by characters
        for c in word.chars() {
            if !current.is_empty() && text_width(&current, size) + char_width(c) * size > max_width {
                lines.push(std::mem::take(&mut current));
            }
            current.push(c);
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

impl DocumentBuilder for PdfBuilder {
    fn add_page(&mut self) -> Result<(), DocumentError> {
        self.start_page();
        Ok(())
    }

    fn set_font(&mut self, style: FontStyle) {
        self.style = style;
    }

    fn write_block(&mut self, text: &str) -> Result<(), DocumentError> {
        if let Some(bad) = text.chars().find(|c| !matches!(c, ' '..='~' | '\n' | '\r' | '\t')) {
            return Err(DocumentError::UnsupportedGlyph(bad as u32));
        }

        let (font, size) = Self::font(self.style);
        let max_width = PAGE_WIDTH - 2.0 * MARGIN;
        for line in text.lines() {
            for wrapped in wrap_line(line, size, max_width) {
                self.emit_line(&wrapped, font, size);
            }
        }
        self.cursor_y -= BLOCK_SPACING;
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn save(&mut self, path: &Path) -> Result<(), DocumentError> {
        if self.pages.is_empty() {
            return Err(DocumentError::Render("document has no pages".into()));
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for operations in &self.pages {
            let content = Content { operations: operations.clone() };
            let bytes = content
                .encode()
                .map_err(|e| DocumentError::Render(e.to_string()))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, bytes));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Resources" => resources_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let media_box: Vec<Object> = vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()];
        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => media_box,
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        doc.save(path).map_err(|e| DocumentError::Save {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!("Saved {} pages to {:?}", self.pages.len(), path);
        Ok(())
    }
}
