/*!
 * Resumable per-page translation pipeline.
 *
 * `DocumentPipeline` drives one document from open to composite output,
 * `PageProcessor` handles a single page, and observers get notified of
 * progress along the way.
 */

pub mod document;
pub mod model;
pub mod observer;
pub mod page;

pub use document::{DocumentPipeline, PipelineOptions};
pub use model::{Document, Page, PageOutcome, PageStatus, RunState, RunSummary, SkipReason};
pub use observer::{LoggingObserver, NoopObserver, PipelineObserver};
pub use page::PageProcessor;
