use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::assembly::CompositeOutput;
use crate::progress::ProgressRecord;

/// A document being translated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Stable name derived from the input file stem
    pub id: String,
    /// Input file
    pub source_path: PathBuf,
    /// Number of pages
    pub page_count: usize,
    /// Start of the job, stable across resumed runs
    pub created_at: DateTime<Utc>,
}

/// Why a page was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Nothing extractable after trimming and sanitizing
    NoText,
    /// Little text and embedded raster images
    ImageDominated,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoText => write!(f, "no text"),
            Self::ImageDominated => write!(f, "image-dominated"),
        }
    }
}

/// Lifecycle of a page within one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
    Pending,
    Translated(String),
    Failed(String),
    Skipped(SkipReason),
}

/// One page of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 0-based index
    pub index: usize,
    /// Extracted text
    pub source_text: String,
    pub status: PageStatus,
}

impl Page {
    /// A pending page with its extracted text
    pub fn new(index: usize, source_text: impl Into<String>) -> Self {
        Self {
            index,
            source_text: source_text.into(),
            status: PageStatus::Pending,
        }
    }

    /// Move to a terminal status
    ///
    /// Terminal statuses are final; later transitions are ignored.
    pub fn finish(&mut self, status: PageStatus) {
        if self.status == PageStatus::Pending {
            self.status = status;
        }
    }
}

/// Result of processing one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Already processed by an earlier run; nothing was done
    AlreadyDone,
    /// Failed in an earlier run and failed pages are not retried
    FailedEarlier,
    /// Translated and written to its partial output
    Translated,
    /// Marked processed without output
    Skipped(SkipReason),
    /// Failed in this run
    Failed(String),
}

impl From<&PageStatus> for PageOutcome {
    fn from(status: &PageStatus) -> Self {
        match status {
            PageStatus::Translated(_) => Self::Translated,
            PageStatus::Skipped(reason) => Self::Skipped(*reason),
            PageStatus::Failed(reason) => Self::Failed(reason.clone()),
            PageStatus::Pending => Self::Failed("page left pending".to_string()),
        }
    }
}

/// Counts of one pipeline run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Pages newly translated in this run
    pub processed_count: usize,
    /// Pages failed in this run or left failed from an earlier one
    pub failed_count: usize,
    /// Pages newly skipped in this run
    pub skipped_count: usize,
    /// Pages already complete from an earlier run
    pub resumed_count: usize,
    /// The assembled output
    pub composite: Option<CompositeOutput>,
}

impl RunSummary {
    pub(crate) fn record(&mut self, outcome: &PageOutcome) {
        match outcome {
            PageOutcome::AlreadyDone => self.resumed_count += 1,
            PageOutcome::Translated => self.processed_count += 1,
            PageOutcome::Skipped(_) => self.skipped_count += 1,
            PageOutcome::Failed(_) | PageOutcome::FailedEarlier => self.failed_count += 1,
        }
    }
}

/// Per-document job state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    InProgress,
    Completed,
}

impl RunState {
    /// State implied by a stored record
    pub fn of(record: Option<&ProgressRecord>) -> Self {
        match record {
            None => Self::NotStarted,
            Some(r) if r.finished_at.is_some() => Self::Completed,
            Some(_) => Self::InProgress,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not started"),
            Self::InProgress => write!(f, "in progress"),
            Self::Completed => write!(f, "completed"),
        }
    }
}
