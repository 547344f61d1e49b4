use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::PersistenceError;

/// Persisted progress of one document
///
/// `processed` holds translated and skipped pages, `skipped` is the subset
/// that was skipped. A page index is never in both `processed` and `failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Document the record belongs to
    pub document_id: String,

    /// Page count of the document
    pub total_pages: usize,

    /// SHA-256 of the input file when the record was created
    #[serde(default)]
    pub source_hash: String,

    /// Pages that are done (translated or skipped)
    #[serde(default)]
    pub processed: BTreeSet<usize>,

    /// Pages whose last attempt failed
    #[serde(default)]
    pub failed: BTreeSet<usize>,

    /// Pages skipped as empty or image-dominated
    #[serde(default)]
    pub skipped: BTreeSet<usize>,

    /// Highest page index attempted, -1 before the first page
    pub last_processed_index: i64,

    /// When the job first started
    pub started_at: DateTime<Utc>,

    /// When the composite output was last produced
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    /// Fresh record with nothing processed
    pub fn new(document_id: impl Into<String>, total_pages: usize, source_hash: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            total_pages,
            source_hash: source_hash.into(),
            processed: BTreeSet::new(),
            failed: BTreeSet::new(),
            skipped: BTreeSet::new(),
            last_processed_index: -1,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_processed(&self, index: usize) -> bool {
        self.processed.contains(&index)
    }

    pub fn is_failed(&self, index: usize) -> bool {
        self.failed.contains(&index)
    }

    /// Whether every page is processed
    pub fn is_complete(&self) -> bool {
        self.processed.len() == self.total_pages
    }

    /// Pages neither processed nor failed
    pub fn pending_count(&self) -> usize {
        self.total_pages.saturating_sub(self.processed.len() + self.failed.len())
    }

    /// Mark a page done; clears an earlier failure
    pub fn mark_processed(&mut self, index: usize) -> Result<(), PersistenceError> {
        self.check_range(index)?;
        self.failed.remove(&index);
        self.processed.insert(index);
        self.touch(index);
        Ok(())
    }

    /// Mark a page done without output
    pub fn mark_skipped(&mut self, index: usize) -> Result<(), PersistenceError> {
        self.mark_processed(index)?;
        self.skipped.insert(index);
        Ok(())
    }

    /// Mark a page failed; no-op for a page already processed
    pub fn mark_failed(&mut self, index: usize) -> Result<(), PersistenceError> {
        self.check_range(index)?;
        if !self.processed.contains(&index) {
            self.failed.insert(index);
            self.touch(index);
        }
        Ok(())
    }

    /// Check the set invariants
    pub fn validate(&self) -> Result<(), PersistenceError> {
        let corrupt = |message: String| PersistenceError::Corrupt {
            document_id: self.document_id.clone(),
            message,
        };

        if let Some(&index) = self.processed.iter().chain(self.failed.iter()).find(|&&i| i >= self.total_pages) {
            return Err(corrupt(format!("page index {} outside 0..{}", index, self.total_pages)));
        }
        if let Some(index) = self.processed.intersection(&self.failed).next() {
            return Err(corrupt(format!("page {} is both processed and failed", index)));
        }
        if let Some(index) = self.skipped.difference(&self.processed).next() {
            return Err(corrupt(format!("skipped page {} is not processed", index)));
        }
        if self.last_processed_index < -1 || self.last_processed_index >= self.total_pages as i64 {
            return Err(corrupt(format!("last processed index {} out of range", self.last_processed_index)));
        }
        Ok(())
    }

    fn check_range(&self, index: usize) -> Result<(), PersistenceError> {
        if index >= self.total_pages {
            return Err(PersistenceError::PageOutOfRange {
                document_id: self.document_id.clone(),
                index,
                total_pages: self.total_pages,
            });
        }
        Ok(())
    }

    fn touch(&mut self, index: usize) {
        self.last_processed_index = self.last_processed_index.max(index as i64);
    }
}
