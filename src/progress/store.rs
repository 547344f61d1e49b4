/*!
 * Progress persistence.
 *
 * The record is a pretty-printed JSON file replaced atomically on every
 * flush. Partial outputs are one UTF-8 file per page, also written
 * atomically, and are read back independently of the record.
 */

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::{debug, info, warn};

use crate::errors::PersistenceError;
use crate::file_utils::FileManager;
use crate::progress::layout::StateLayout;
use crate::progress::record::ProgressRecord;

/// Store for one document's progress record and partial outputs
#[derive(Debug, Clone)]
pub struct ProgressStore {
    layout: StateLayout,
}

fn io_error(path: &Path, source: std::io::Error) -> PersistenceError {
    PersistenceError::Io { path: path.to_path_buf(), source }
}

impl ProgressStore {
    pub fn new(layout: StateLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &StateLayout {
        &self.layout
    }

    // =========================================================================
    // Progress record
    // =========================================================================

    /// Read the stored record, if any, without validating it against a document
    pub fn load(&self) -> Result<Option<ProgressRecord>, PersistenceError> {
        let path = self.layout.progress_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path, e)),
        };

        let record: ProgressRecord = serde_json::from_str(&content).map_err(|e| PersistenceError::Serialize {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(Some(record))
    }

    /// Return the stored record for this document, or a fresh one
    ///
    /// A stored record must match the document id, page count and source
    /// hash, and must satisfy its set invariants.
    pub fn load_or_create(
        &self,
        document_id: &str,
        total_pages: usize,
        source_hash: &str,
    ) -> Result<ProgressRecord, PersistenceError> {
        let Some(record) = self.load()? else {
            debug!("No progress for '{}', starting fresh", document_id);
            return Ok(ProgressRecord::new(document_id, total_pages, source_hash));
        };

        if record.document_id != document_id {
            return Err(PersistenceError::Corrupt {
                document_id: document_id.to_string(),
                message: format!("record belongs to '{}'", record.document_id),
            });
        }
        if record.total_pages != total_pages {
            return Err(PersistenceError::PageCountMismatch {
                document_id: document_id.to_string(),
                stored: record.total_pages,
                actual: total_pages,
            });
        }
        if !record.source_hash.is_empty() && record.source_hash != source_hash {
            return Err(PersistenceError::SourceChanged {
                document_id: document_id.to_string(),
            });
        }
        record.validate()?;

        info!(
            "Resuming '{}': {} processed, {} failed, {} pending",
            document_id,
            record.processed.len(),
            record.failed.len(),
            record.pending_count()
        );
        Ok(record)
    }

    pub fn mark_processed(&self, record: &mut ProgressRecord, index: usize) -> Result<(), PersistenceError> {
        record.mark_processed(index)
    }

    pub fn mark_skipped(&self, record: &mut ProgressRecord, index: usize) -> Result<(), PersistenceError> {
        record.mark_skipped(index)
    }

    pub fn mark_failed(&self, record: &mut ProgressRecord, index: usize) -> Result<(), PersistenceError> {
        record.mark_failed(index)
    }

    /// Atomically persist the full record
    pub fn flush(&self, record: &ProgressRecord) -> Result<(), PersistenceError> {
        let path = self.layout.progress_path();
        let json = serde_json::to_string_pretty(record).map_err(|e| PersistenceError::Serialize {
            path: path.clone(),
            message: e.to_string(),
        })?;
        FileManager::write_atomic(&path, json.as_bytes()).map_err(|e| io_error(&path, e))
    }

    /// Delete the stored record and all partial outputs
    ///
    /// Composite outputs and the lock file are left alone.
    pub fn reset(&self) -> Result<(), PersistenceError> {
        let progress = self.layout.progress_path();
        match fs::remove_file(&progress) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(io_error(&progress, e)),
        }

        let pages = self.layout.pages_dir();
        match fs::remove_dir_all(&pages) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(io_error(&pages, e)),
        }

        warn!("Progress for '{}' was reset", self.layout.document_id());
        Ok(())
    }

    // =========================================================================
    // Partial outputs
    // =========================================================================

    /// Atomically write the translated text of a page
    pub fn write_partial(&self, index: usize, text: &str) -> Result<(), PersistenceError> {
        let path = self.layout.page_path(index);
        FileManager::write_atomic(&path, text.as_bytes()).map_err(|e| io_error(&path, e))
    }

    /// Translated text of a page, `None` when it was never written
    pub fn read_partial(&self, index: usize) -> Result<Option<String>, PersistenceError> {
        let path = self.layout.page_path(index);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path, e)),
        }
    }
}
