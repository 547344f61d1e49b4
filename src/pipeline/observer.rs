use log::{info, warn};

use crate::pipeline::model::{Document, PageOutcome, RunSummary};
use crate::progress::ProgressRecord;

/// Receives pipeline progress notifications
///
/// All methods default to no-ops.
pub trait PipelineObserver: Send + Sync {
    /// The document is open, locked and its progress loaded
    fn on_run_started(&self, _document: &Document, _record: &ProgressRecord) {}

    /// A page finished without failing in this run
    fn on_page_completed(&self, _document: &Document, _index: usize, _outcome: &PageOutcome) {}

    /// A page failed in this run
    fn on_page_failed(&self, _document: &Document, _index: usize, _error: &str) {}

    /// The composite output was produced
    fn on_run_finished(&self, _document: &Document, _summary: &RunSummary) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Observer that reports through the log facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl PipelineObserver for LoggingObserver {
    fn on_run_started(&self, document: &Document, record: &ProgressRecord) {
        info!(
            "Translating '{}' ({} pages, {} already processed)",
            document.id,
            document.page_count,
            record.processed.len()
        );
    }

    fn on_page_completed(&self, document: &Document, index: usize, outcome: &PageOutcome) {
        match outcome {
            PageOutcome::Translated => info!("'{}' page {} translated", document.id, index + 1),
            PageOutcome::Skipped(reason) => info!("'{}' page {} skipped ({})", document.id, index + 1, reason),
            PageOutcome::FailedEarlier => info!("'{}' page {} left failed", document.id, index + 1),
            PageOutcome::AlreadyDone | PageOutcome::Failed(_) => {}
        }
    }

    fn on_page_failed(&self, document: &Document, index: usize, error: &str) {
        warn!("'{}' page {} failed: {}", document.id, index + 1, error);
    }

    fn on_run_finished(&self, document: &Document, summary: &RunSummary) {
        info!(
            "'{}' done: {} translated, {} skipped, {} failed, {} resumed",
            document.id,
            summary.processed_count,
            summary.skipped_count,
            summary.failed_count,
            summary.resumed_count
        );
    }
}
