/*!
 * Single-page processing.
 *
 * A page is extracted, classified, sanitized, chunked and translated, then
 * its outcome is recorded. Every attempted page ends with exactly one flush
 * of the progress record and at most one partial output write. A failed
 * page never touches an existing partial output.
 */

use log::{debug, warn};

use crate::document::DocumentHandle;
use crate::errors::PipelineError;
use crate::pipeline::document::PipelineOptions;
use crate::pipeline::model::{Page, PageOutcome, PageStatus, SkipReason};
use crate::progress::{ProgressRecord, ProgressStore};
use crate::translation::TranslationClient;
use crate::translation::chunker;
use crate::translation::sanitize::sanitize;

/// Processes pages of one document against one progress store
pub struct PageProcessor<'a> {
    client: &'a TranslationClient,
    store: &'a ProgressStore,
    options: &'a PipelineOptions,
}

impl<'a> PageProcessor<'a> {
    pub fn new(client: &'a TranslationClient, store: &'a ProgressStore, options: &'a PipelineOptions) -> Self {
        Self { client, store, options }
    }

    /// Process page `index` of `document`, updating and flushing `progress`
    ///
    /// Only persistence failures are returned as errors; extraction and
    /// translation failures come back as `PageOutcome::Failed`.
    pub async fn process(
        &self,
        document: &dyn DocumentHandle,
        index: usize,
        progress: &mut ProgressRecord,
    ) -> Result<PageOutcome, PipelineError> {
        if progress.is_processed(index) {
            return Ok(PageOutcome::AlreadyDone);
        }
        if progress.is_failed(index) && !self.options.retry_failed_pages {
            return Ok(PageOutcome::FailedEarlier);
        }

        let mut page = match document.extract_text(index) {
            Ok(text) => Page::new(index, text),
            Err(e) => {
                warn!("Page {} of '{}': {}", index + 1, progress.document_id, e);
                let mut page = Page::new(index, String::new());
                page.finish(PageStatus::Failed(e.to_string()));
                page
            }
        };

        if page.status == PageStatus::Pending {
            let status = self.translate(document, &page).await;
            page.finish(status);
        }

        match &page.status {
            PageStatus::Translated(text) => {
                self.store.write_partial(index, text)?;
                self.store.mark_processed(progress, index)?;
            }
            PageStatus::Skipped(reason) => {
                debug!("Page {} of '{}' skipped: {}", index + 1, progress.document_id, reason);
                self.store.mark_skipped(progress, index)?;
            }
            PageStatus::Failed(_) | PageStatus::Pending => {
                self.store.mark_failed(progress, index)?;
            }
        }
        self.store.flush(progress)?;

        Ok(PageOutcome::from(&page.status))
    }

    /// Classify an extracted page and translate it if it has content
    async fn translate(&self, document: &dyn DocumentHandle, page: &Page) -> PageStatus {
        let trimmed = page.source_text.trim();
        if trimmed.is_empty() {
            return PageStatus::Skipped(SkipReason::NoText);
        }
        if trimmed.chars().count() < self.options.image_text_threshold && document.has_raster_content(page.index) {
            return PageStatus::Skipped(SkipReason::ImageDominated);
        }

        let clean = sanitize(trimmed, self.options.max_code_point);
        if clean.trim().is_empty() {
            return PageStatus::Skipped(SkipReason::NoText);
        }

        let chunks = chunker::split(&clean, self.options.chunk_size);
        let mut translated = Vec::with_capacity(chunks.len());
        for (n, chunk) in chunks.iter().enumerate() {
            match self
                .client
                .translate(chunk, &self.options.source_language, &self.options.target_language)
                .await
            {
                Ok(text) => translated.push(text),
                Err(e) => {
                    warn!("Page {} chunk {}/{} failed: {}", page.index + 1, n + 1, chunks.len(), e);
                    return PageStatus::Failed(format!("chunk {}/{}: {}", n + 1, chunks.len(), e));
                }
            }
        }

        let joined = chunker::join(&translated);
        if joined.is_empty() {
            return PageStatus::Failed("empty translation".to_string());
        }
        PageStatus::Translated(joined)
    }
}
