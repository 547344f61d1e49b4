use std::path::Path;

use crate::errors::DocumentError;

/// Opens input documents
pub trait DocumentReader: Send + Sync {
    /// Open the document at `path`
    fn open(&self, path: &Path) -> Result<Box<dyn DocumentHandle>, DocumentError>;
}

/// An opened, read-only input document
///
/// Page indices are 0-based.
pub trait DocumentHandle: Send {
    /// Number of pages in the document
    fn page_count(&self) -> usize;

    /// Extract the text of one page
    fn extract_text(&self, index: usize) -> Result<String, DocumentError>;

    /// Whether the page carries raster images
    fn has_raster_content(&self, index: usize) -> bool;
}
