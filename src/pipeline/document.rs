/*!
 * Whole-document pipeline.
 *
 * One run opens the document, takes the per-document lock, loads or creates
 * the progress record, walks the pages in ascending order and finally
 * reassembles the composite output from every partial output on disk,
 * including those written by earlier runs.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use log::{error, info};

use crate::app_config::Config;
use crate::assembly::Assembler;
use crate::document::{DocumentReader, DocumentWriter};
use crate::errors::{PersistenceError, PipelineError};
use crate::file_utils::FileManager;
use crate::pipeline::model::{Document, PageOutcome, RunSummary};
use crate::pipeline::observer::{NoopObserver, PipelineObserver};
use crate::pipeline::page::PageProcessor;
use crate::progress::{DocumentLock, ProgressRecord, ProgressStore, StateLayout};
use crate::translation::TranslationClient;
use crate::translation::sanitize::ASCII_MAX;

/// Knobs of a pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Source language code or `auto`
    pub source_language: String,
    /// Target language code
    pub target_language: String,
    /// Maximum characters per translation request
    pub chunk_size: usize,
    /// Whether pages that failed in an earlier run are attempted again
    pub retry_failed_pages: bool,
    /// Below this many characters a page with images counts as image-dominated
    pub image_text_threshold: usize,
    /// Highest code point kept by sanitization
    pub max_code_point: u32,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            source_language: "auto".to_string(),
            target_language: "id".to_string(),
            chunk_size: 4500,
            retry_failed_pages: true,
            image_text_threshold: 100,
            max_code_point: ASCII_MAX,
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            source_language: config.source_language.clone(),
            target_language: config.target_language.clone(),
            chunk_size: config.translation.get_max_chars_per_request(),
            retry_failed_pages: config.pipeline.retry_failed_pages,
            image_text_threshold: config.pipeline.image_text_threshold,
            max_code_point: config.pipeline.max_code_point,
        }
    }
}

/// Drives documents through extraction, translation and assembly
pub struct DocumentPipeline {
    reader: Arc<dyn DocumentReader>,
    client: TranslationClient,
    assembler: Assembler,
    output_dir: PathBuf,
    options: PipelineOptions,
    observer: Arc<dyn PipelineObserver>,
}

impl DocumentPipeline {
    pub fn new(
        reader: Arc<dyn DocumentReader>,
        writer: Arc<dyn DocumentWriter>,
        client: TranslationClient,
        output_dir: impl Into<PathBuf>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            reader,
            client,
            assembler: Assembler::new(writer, options.max_code_point),
            output_dir: output_dir.into(),
            options,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Replace the observer
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn client(&self) -> &TranslationClient {
        &self.client
    }

    /// State layout of the document at `path`
    pub fn layout_for(&self, path: &Path) -> StateLayout {
        StateLayout::new(&self.output_dir, FileManager::document_id(path))
    }

    /// Stored progress of the document at `path`, if any
    pub fn status(&self, path: &Path) -> Result<Option<ProgressRecord>, PipelineError> {
        Ok(ProgressStore::new(self.layout_for(path)).load()?)
    }

    /// Forget all progress and partial outputs of the document at `path`
    pub fn reset(&self, path: &Path) -> Result<(), PipelineError> {
        let layout = self.layout_for(path);
        let _lock = DocumentLock::acquire(&layout)?;
        ProgressStore::new(layout).reset()?;
        Ok(())
    }

    /// Translate one document, resuming earlier progress
    pub async fn run(&self, path: &Path) -> Result<RunSummary, PipelineError> {
        let handle = self.reader.open(path).map_err(PipelineError::Open)?;
        let total_pages = handle.page_count();
        if total_pages == 0 {
            return Err(PipelineError::EmptyDocument(path.to_path_buf()));
        }

        let layout = self.layout_for(path);
        let document_id = layout.document_id().to_string();
        let source_hash = FileManager::hash_file(path).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let _lock = DocumentLock::acquire(&layout)?;
        let store = ProgressStore::new(layout);
        let mut record = store.load_or_create(&document_id, total_pages, &source_hash)?;
        // Not completed again until this run's assembly succeeds
        record.finished_at = None;
        store.flush(&record)?;

        let document = Document {
            id: document_id,
            source_path: path.to_path_buf(),
            page_count: total_pages,
            created_at: record.started_at,
        };
        self.observer.on_run_started(&document, &record);

        let processor = PageProcessor::new(&self.client, &store, &self.options);
        let mut summary = RunSummary::default();
        for index in 0..total_pages {
            let outcome = processor.process(handle.as_ref(), index, &mut record).await?;
            summary.record(&outcome);
            match &outcome {
                PageOutcome::Failed(reason) => self.observer.on_page_failed(&document, index, reason),
                other => self.observer.on_page_completed(&document, index, other),
            }
        }

        let composite = self.assembler.assemble(&document, &store)?;
        record.finished_at = Some(Utc::now());
        store.flush(&record)?;

        info!(
            "'{}': {} of {} pages in the composite ({:?})",
            document.id,
            composite.included_pages.len(),
            total_pages,
            composite.strategy
        );
        summary.composite = Some(composite);
        self.observer.on_run_finished(&document, &summary);
        Ok(summary)
    }

    /// Translate documents one after another
    ///
    /// Each document goes through assembly before the next one starts. A
    /// failing document does not stop the others.
    pub async fn run_many(&self, paths: &[PathBuf]) -> Vec<(PathBuf, Result<RunSummary, PipelineError>)> {
        let mut results = Vec::with_capacity(paths.len());
        for path in paths {
            let result = self.run(path).await;
            if let Err(e) = &result {
                error!("Failed to translate {:?}: {}", path, e);
            }
            results.push((path.clone(), result));
        }
        results
    }
}
