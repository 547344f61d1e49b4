use std::path::Path;

use crate::errors::DocumentError;

/// Font selection for subsequent blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontStyle {
    /// Large bold title
    Title,
    /// Bold section header
    Heading,
    /// Regular body text
    #[default]
    Body,
}

/// Creates output documents
pub trait DocumentWriter: Send + Sync {
    /// Start a new, empty document
    fn new_document(&self) -> Box<dyn DocumentBuilder>;
}

/// Incrementally built output document
pub trait DocumentBuilder {
    /// Start a new page; later blocks are written onto it
    fn add_page(&mut self) -> Result<(), DocumentError>;

    /// Font used by later blocks
    fn set_font(&mut self, style: FontStyle);

    /// Write a block of text, wrapping lines and breaking pages as needed
    ///
    /// A block containing a character the renderer cannot draw is rejected
    /// as a whole with `DocumentError::UnsupportedGlyph`; nothing of it is
    /// written.
    fn write_block(&mut self, text: &str) -> Result<(), DocumentError>;

    /// Pages produced so far
    fn page_count(&self) -> usize;

    /// Write the document to `path`
    fn save(&mut self, path: &Path) -> Result<(), DocumentError>;
}
