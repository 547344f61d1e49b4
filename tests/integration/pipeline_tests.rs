/*!
 * End-to-end pipeline tests over fake documents and a mock backend
 */

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

use pagewise::assembly::AssemblyStrategy;
use pagewise::document::DocumentReader;
use pagewise::errors::{AssemblyError, PersistenceError, PipelineError};
use pagewise::file_utils::FileManager;
use pagewise::pipeline::{PageOutcome, PageProcessor, RunState, SkipReason};
use pagewise::progress::{DocumentLock, ProgressStore};
use pagewise::providers::mock::{MockBackend, MockBehavior};

use crate::common::{self, FakePage, FakeReader, FakeWriter};

fn translated(n: usize) -> String {
    MockBackend::expected_translation(&common::page_text(n), "id")
}

fn pages(count: usize) -> Vec<FakePage> {
    (1..=count).map(|n| FakePage::text(common::page_text(n))).collect()
}

fn source(dir: &Path, name: &str) -> Result<PathBuf> {
    common::create_test_file(dir, name, &format!("%PDF-fake {}", name))
}

/// Test that a page failing extraction leaves its neighbours translated
#[tokio::test]
async fn test_run_withUnreadableMiddlePage_shouldTranslateTheOthers() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = source(temp_dir.path(), "report.pdf")?;
    let reader = FakeReader::new();
    reader.insert(
        &path,
        vec![
            FakePage::text(common::page_text(1)),
            FakePage::unreadable("broken content stream"),
            FakePage::text(common::page_text(3)),
        ],
    );
    let writer = FakeWriter::new();
    let backend = MockBackend::working();
    let output_dir = temp_dir.path().join("out");
    let pipeline = common::test_pipeline(&reader, &writer, &backend, &output_dir, common::test_options());

    let summary = pipeline.run(&path).await?;

    assert_eq!(summary.processed_count, 2);
    assert_eq!(summary.failed_count, 1);
    assert_eq!(summary.skipped_count, 0);

    let record = pipeline.status(&path)?.expect("record should exist");
    assert_eq!(record.processed.iter().copied().collect::<Vec<_>>(), vec![0, 2]);
    assert_eq!(record.failed.iter().copied().collect::<Vec<_>>(), vec![1]);
    assert!(record.finished_at.is_some());

    let composite = summary.composite.expect("composite should exist");
    assert_eq!(composite.included_pages, vec![0, 2]);
    assert_eq!(composite.omitted_pages, vec![1]);
    assert_eq!(composite.strategy, AssemblyStrategy::Structured);

    let text = fs::read_to_string(&composite.text_path)?;
    assert!(text.starts_with("=== TRANSLATION report ===\nTranslated on: "));
    assert!(text.contains(&format!("--- PAGE 1 ---\n{}\n\n", translated(1))));
    assert!(text.contains(&format!("--- PAGE 3 ---\n{}\n\n", translated(3))));
    assert!(!text.contains("--- PAGE 2 ---"));
    assert_eq!(text.matches("--- PAGE ").count(), 2);
    Ok(())
}

/// Test that a second run over a finished document does no new work
#[tokio::test]
async fn test_run_twice_shouldNotRepeatTranslationsAndKeepOutputIdentical() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = source(temp_dir.path(), "report.pdf")?;
    let reader = FakeReader::new();
    reader.insert(&path, pages(3));
    let writer = FakeWriter::new();
    let backend = MockBackend::working();
    let output_dir = temp_dir.path().join("out");
    let pipeline = common::test_pipeline(&reader, &writer, &backend, &output_dir, common::test_options());

    let first = pipeline.run(&path).await?;
    let calls_after_first = backend.request_count();
    let text_path = first.composite.as_ref().expect("composite").text_path.clone();
    let first_text = fs::read_to_string(&text_path)?;

    let second = pipeline.run(&path).await?;

    assert_eq!(calls_after_first, 3);
    assert_eq!(backend.request_count(), calls_after_first);
    assert_eq!(second.processed_count, 0);
    assert_eq!(second.resumed_count, 3);
    assert_eq!(fs::read_to_string(&text_path)?, first_text);
    assert_eq!(writer.saved().len(), 2);
    assert_eq!(writer.saved()[0].blocks(), writer.saved()[1].blocks());
    Ok(())
}

/// Test that a run started after an interruption only translates the remaining pages
#[tokio::test]
async fn test_run_afterInterruption_shouldResumeFromRemainingPages() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = source(temp_dir.path(), "book.pdf")?;
    let reader = FakeReader::new();
    reader.insert(&path, pages(5));
    let writer = FakeWriter::new();
    let backend = MockBackend::working();
    let output_dir = temp_dir.path().join("out");
    let options = common::test_options();
    let pipeline = common::test_pipeline(&reader, &writer, &backend, &output_dir, options.clone());

    // An earlier run that stopped after two pages
    {
        let store = ProgressStore::new(pipeline.layout_for(&path));
        let hash = FileManager::hash_file(&path)?;
        let mut record = store.load_or_create("book", 5, &hash)?;
        let client = common::fast_client(backend.clone());
        let processor = PageProcessor::new(&client, &store, &options);
        let handle = reader.open(&path)?;
        for index in 0..2 {
            let outcome = processor.process(handle.as_ref(), index, &mut record).await?;
            assert_eq!(outcome, PageOutcome::Translated);
        }
    }
    let stored = pipeline.status(&path)?.expect("record should exist");
    assert_eq!(stored.last_processed_index, 1);
    assert_eq!(stored.pending_count(), 3);

    let summary = pipeline.run(&path).await?;

    assert_eq!(summary.resumed_count, 2);
    assert_eq!(summary.processed_count, 3);
    let requests = backend.requests();
    assert_eq!(requests.len(), 5);
    for n in 1..=5 {
        assert_eq!(requests.iter().filter(|r| **r == common::page_text(n)).count(), 1);
    }
    let composite = summary.composite.expect("composite");
    assert_eq!(composite.included_pages, vec![0, 1, 2, 3, 4]);

    // Same document translated in one go elsewhere; only the header timestamp may differ
    let fresh_dir = temp_dir.path().join("fresh");
    let fresh = common::test_pipeline(&reader, &FakeWriter::new(), &MockBackend::working(), &fresh_dir, options)
        .run(&path)
        .await?;
    let sections = |text: String| text[text.find("--- PAGE 1 ---").expect("first section")..].to_string();
    assert_eq!(
        sections(fs::read_to_string(&composite.text_path)?),
        sections(fs::read_to_string(&fresh.composite.expect("composite").text_path)?)
    );
    Ok(())
}

/// Test that short pages with images are skipped without output
#[tokio::test]
async fn test_run_withImageDominatedPage_shouldSkipWithoutOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = source(temp_dir.path(), "scan.pdf")?;
    let reader = FakeReader::new();
    reader.insert(
        &path,
        vec![
            FakePage::text(common::page_text(1)),
            FakePage::with_images("Fig"),
            FakePage::text("   \n  "),
        ],
    );
    let writer = FakeWriter::new();
    let backend = MockBackend::working();
    let output_dir = temp_dir.path().join("out");
    let pipeline = common::test_pipeline(&reader, &writer, &backend, &output_dir, common::test_options());

    let summary = pipeline.run(&path).await?;

    assert_eq!(summary.processed_count, 1);
    assert_eq!(summary.skipped_count, 2);
    assert_eq!(backend.request_count(), 1);

    let layout = pipeline.layout_for(&path);
    assert!(!layout.page_path(1).exists());
    assert!(!layout.page_path(2).exists());

    let record = pipeline.status(&path)?.expect("record");
    assert!(record.is_processed(1));
    assert!(record.skipped.contains(&1));
    assert!(record.skipped.contains(&2));
    assert!(record.is_complete());

    let composite = summary.composite.expect("composite");
    assert_eq!(composite.included_pages, vec![0]);
    Ok(())
}

/// Test that an image page with enough text is still translated
#[tokio::test]
async fn test_run_withIllustratedTextPage_shouldTranslate() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = source(temp_dir.path(), "figure.pdf")?;
    let reader = FakeReader::new();
    reader.insert(&path, vec![FakePage::with_images(common::page_text(1))]);
    let mut options = common::test_options();
    options.image_text_threshold = 10;
    let pipeline = common::test_pipeline(&reader, &FakeWriter::new(), &MockBackend::working(), &temp_dir.path().join("out"), options);

    let summary = pipeline.run(&path).await?;

    assert_eq!(summary.processed_count, 1);
    assert_eq!(summary.skipped_count, 0);
    Ok(())
}

/// Test that transient failures past the retry bound fail only that page
#[tokio::test]
async fn test_run_withPersistentTransientFailure_shouldFailOnlyThatPage() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = source(temp_dir.path(), "report.pdf")?;
    let reader = FakeReader::new();
    reader.insert(&path, pages(3));
    let writer = FakeWriter::new();
    let backend = MockBackend::new(MockBehavior::FailWhenContains("page number 2".into()));
    let output_dir = temp_dir.path().join("out");
    let pipeline = common::test_pipeline(&reader, &writer, &backend, &output_dir, common::test_options());

    let summary = pipeline.run(&path).await?;

    assert_eq!(summary.processed_count, 2);
    assert_eq!(summary.failed_count, 1);
    let attempts_on_page_two = backend
        .requests()
        .iter()
        .filter(|r| r.contains("page number 2"))
        .count();
    assert_eq!(attempts_on_page_two, 2);
    assert_eq!(backend.request_count(), 4);

    let layout = pipeline.layout_for(&path);
    assert!(!layout.page_path(1).exists());
    assert_eq!(fs::read_to_string(layout.page_path(0))?, translated(1));
    assert_eq!(fs::read_to_string(layout.page_path(2))?, translated(3));

    let record = pipeline.status(&path)?.expect("record");
    assert!(record.is_failed(1));
    assert!(!record.is_processed(1));
    Ok(())
}

/// Test that a page spanning several chunks is joined in order
#[tokio::test]
async fn test_run_withLongPage_shouldJoinChunksInOrder() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = source(temp_dir.path(), "long.pdf")?;
    let paragraphs: Vec<String> = (1..=4).map(|n| format!("marker{} {}", n, "word ".repeat(20).trim())).collect();
    let reader = FakeReader::new();
    reader.insert(&path, vec![FakePage::text(paragraphs.join("\n\n"))]);
    let backend = MockBackend::working();
    let output_dir = temp_dir.path().join("out");
    let pipeline = common::test_pipeline(&reader, &FakeWriter::new(), &backend, &output_dir, common::test_options());

    pipeline.run(&path).await?;

    let requests = backend.requests();
    assert!(requests.len() > 1);
    assert!(requests.iter().all(|r| r.chars().count() <= 200));
    let partial = fs::read_to_string(pipeline.layout_for(&path).page_path(0))?;
    let positions: Vec<usize> = (1..=4)
        .map(|n| partial.find(&format!("marker{}", n)).expect("marker present"))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    Ok(())
}

/// Test that pages failed earlier are left alone when retries are disabled
#[tokio::test]
async fn test_run_withRetryFailedPagesDisabled_shouldKeepEarlierFailures() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = source(temp_dir.path(), "report.pdf")?;
    let reader = FakeReader::new();
    reader.insert(&path, vec![FakePage::text(common::page_text(1)), FakePage::unreadable("bad xref")]);
    let writer = FakeWriter::new();
    let backend = MockBackend::working();
    let output_dir = temp_dir.path().join("out");
    common::test_pipeline(&reader, &writer, &backend, &output_dir, common::test_options())
        .run(&path)
        .await?;

    // The page becomes readable, but failed pages are not retried
    reader.insert(&path, pages(2));
    let mut options = common::test_options();
    options.retry_failed_pages = false;
    let strict = common::test_pipeline(&reader, &writer, &backend, &output_dir, options);
    let summary = strict.run(&path).await?;

    assert_eq!(summary.resumed_count, 1);
    assert_eq!(summary.failed_count, 1);
    assert_eq!(summary.processed_count, 0);
    assert_eq!(backend.request_count(), 1);

    // With retries enabled the page is translated
    let retrying = common::test_pipeline(&reader, &writer, &backend, &output_dir, common::test_options());
    let summary = retrying.run(&path).await?;

    assert_eq!(summary.processed_count, 1);
    assert_eq!(summary.failed_count, 0);
    let record = retrying.status(&path)?.expect("record");
    assert!(record.failed.is_empty());
    assert!(record.is_complete());
    Ok(())
}

/// Test that a held lock stops a second run on the same document
#[tokio::test]
async fn test_run_whileDocumentLocked_shouldFailWithLocked() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = source(temp_dir.path(), "report.pdf")?;
    let reader = FakeReader::new();
    reader.insert(&path, pages(2));
    let backend = MockBackend::working();
    let output_dir = temp_dir.path().join("out");
    let pipeline = common::test_pipeline(&reader, &FakeWriter::new(), &backend, &output_dir, common::test_options());

    let layout = pipeline.layout_for(&path);
    let _held = DocumentLock::acquire(&layout)?;

    let result = pipeline.run(&path).await;

    assert!(matches!(result, Err(PipelineError::Persistence(PersistenceError::Locked { .. }))));
    assert_eq!(backend.request_count(), 0);
    Ok(())
}

/// Test that a stored record for a different page count is rejected
#[tokio::test]
async fn test_run_withChangedPageCount_shouldRejectStoredProgress() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = source(temp_dir.path(), "report.pdf")?;
    let reader = FakeReader::new();
    reader.insert(&path, pages(3));
    let output_dir = temp_dir.path().join("out");
    let pipeline = common::test_pipeline(&reader, &FakeWriter::new(), &MockBackend::working(), &output_dir, common::test_options());
    pipeline.run(&path).await?;

    reader.insert(&path, pages(4));
    let result = pipeline.run(&path).await;

    match result {
        Err(PipelineError::Persistence(PersistenceError::PageCountMismatch { stored, actual, .. })) => {
            assert_eq!(stored, 3);
            assert_eq!(actual, 4);
        }
        other => panic!("expected a page count mismatch, got {:?}", other),
    }
    Ok(())
}

/// Test that a modified source file is detected and a reset recovers
#[tokio::test]
async fn test_run_withModifiedSource_shouldRequireReset() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = source(temp_dir.path(), "report.pdf")?;
    let reader = FakeReader::new();
    reader.insert(&path, pages(2));
    let backend = MockBackend::working();
    let output_dir = temp_dir.path().join("out");
    let pipeline = common::test_pipeline(&reader, &FakeWriter::new(), &backend, &output_dir, common::test_options());
    pipeline.run(&path).await?;

    fs::write(&path, "%PDF-fake revised")?;
    let result = pipeline.run(&path).await;
    assert!(matches!(result, Err(PipelineError::Persistence(PersistenceError::SourceChanged { .. }))));

    pipeline.reset(&path)?;
    assert!(pipeline.status(&path)?.is_none());
    assert!(!pipeline.layout_for(&path).pages_dir().exists());

    let summary = pipeline.run(&path).await?;
    assert_eq!(summary.processed_count, 2);
    assert_eq!(backend.request_count(), 4);
    Ok(())
}

/// Test that a failed structured build falls back to reflow
#[tokio::test]
async fn test_run_whenStructuredSaveFails_shouldFallBackToReflow() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = source(temp_dir.path(), "report.pdf")?;
    let reader = FakeReader::new();
    reader.insert(&path, pages(2));
    let writer = FakeWriter::failing_saves(1);
    let output_dir = temp_dir.path().join("out");
    let pipeline = common::test_pipeline(&reader, &writer, &MockBackend::working(), &output_dir, common::test_options());

    let summary = pipeline.run(&path).await?;

    let composite = summary.composite.expect("composite");
    assert_eq!(composite.strategy, AssemblyStrategy::Reflow);
    let saved = writer.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].pages.len(), 1);
    let blocks = saved[0].blocks();
    assert!(blocks.contains(&"Page 1".to_string()));
    assert!(blocks.contains(&"Page 2".to_string()));
    assert!(blocks.contains(&translated(2)));
    Ok(())
}

/// Test that failing both strategies reports an assembly error and keeps partial outputs
#[tokio::test]
async fn test_run_whenBothStrategiesFail_shouldKeepPartialOutputs() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = source(temp_dir.path(), "report.pdf")?;
    let reader = FakeReader::new();
    reader.insert(&path, pages(2));
    let output_dir = temp_dir.path().join("out");
    let pipeline = common::test_pipeline(&reader, &FakeWriter::failing_saves(2), &MockBackend::working(), &output_dir, common::test_options());

    let result = pipeline.run(&path).await;

    assert!(matches!(result, Err(PipelineError::Assembly(AssemblyError::Failed { .. }))));
    let layout = pipeline.layout_for(&path);
    assert!(layout.page_path(0).exists());
    assert!(layout.page_path(1).exists());
    assert!(layout.text_output_path().exists());
    let record = pipeline.status(&path)?.expect("record");
    assert!(record.is_complete());
    assert!(record.finished_at.is_none());
    Ok(())
}

/// Test that a block the writer cannot render is counted and left out
#[tokio::test]
async fn test_run_withUnrenderableBlock_shouldCountRenderFailure() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = source(temp_dir.path(), "report.pdf")?;
    let reader = FakeReader::new();
    reader.insert(&path, pages(3));
    let writer = FakeWriter::rejecting("page number 2");
    let output_dir = temp_dir.path().join("out");
    let pipeline = common::test_pipeline(&reader, &writer, &MockBackend::working(), &output_dir, common::test_options());

    let summary = pipeline.run(&path).await?;

    let composite = summary.composite.expect("composite");
    assert_eq!(composite.strategy, AssemblyStrategy::Structured);
    assert_eq!(composite.render_failures, 1);
    let saved = writer.saved();
    assert_eq!(saved[0].pages.len(), 4);
    assert!(saved[0].blocks().contains(&"Page 2".to_string()));
    assert!(!saved[0].blocks().contains(&translated(2)));
    Ok(())
}

/// Test that a document without pages is rejected before any state is written
#[tokio::test]
async fn test_run_withZeroPages_shouldFailWithEmptyDocument() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = source(temp_dir.path(), "blank.pdf")?;
    let reader = FakeReader::new();
    reader.insert(&path, Vec::new());
    let output_dir = temp_dir.path().join("out");
    let pipeline = common::test_pipeline(&reader, &FakeWriter::new(), &MockBackend::working(), &output_dir, common::test_options());

    let result = pipeline.run(&path).await;

    assert!(matches!(result, Err(PipelineError::EmptyDocument(_))));
    assert!(!pipeline.layout_for(&path).progress_path().exists());
    Ok(())
}

/// Test that several documents run one after another and failures stay isolated
#[tokio::test]
async fn test_runMany_withOneUnopenableDocument_shouldTranslateTheRest() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let good = source(temp_dir.path(), "good.pdf")?;
    let missing = temp_dir.path().join("missing.pdf");
    let reader = FakeReader::new();
    reader.insert(&good, pages(2));
    let output_dir = temp_dir.path().join("out");
    let pipeline = common::test_pipeline(&reader, &FakeWriter::new(), &MockBackend::working(), &output_dir, common::test_options());

    let results = pipeline.run_many(&[missing.clone(), good.clone()]).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, missing);
    assert!(matches!(results[0].1, Err(PipelineError::Open(_))));
    assert_eq!(results[1].0, good);
    let summary = results[1].1.as_ref().expect("good document should translate");
    assert_eq!(summary.processed_count, 2);
    Ok(())
}

/// Test that skipped reasons surface as page outcomes
#[tokio::test]
async fn test_pageProcessor_withEmptyPage_shouldReportNoText() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = source(temp_dir.path(), "empty.pdf")?;
    let reader = FakeReader::new();
    reader.insert(&path, vec![FakePage::text("")]);
    let pipeline = common::test_pipeline(&reader, &FakeWriter::new(), &MockBackend::working(), &temp_dir.path().join("out"), common::test_options());
    let store = ProgressStore::new(pipeline.layout_for(&path));
    let mut record = store.load_or_create("empty", 1, "")?;
    let options = common::test_options();
    let processor = PageProcessor::new(pipeline.client(), &store, &options);
    let handle = reader.open(&path)?;

    let first = processor.process(handle.as_ref(), 0, &mut record).await?;
    let second = processor.process(handle.as_ref(), 0, &mut record).await?;

    assert_eq!(first, PageOutcome::Skipped(SkipReason::NoText));
    assert_eq!(second, PageOutcome::AlreadyDone);
    Ok(())
}

/// Test that a rerun whose assembly fails does not leave the document reported as completed
#[tokio::test]
async fn test_run_rerunWithFailedAssembly_shouldClearFinishedAt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = source(temp_dir.path(), "report.pdf")?;
    let reader = FakeReader::new();
    reader.insert(&path, pages(2));
    let backend = MockBackend::working();
    let output_dir = temp_dir.path().join("out");
    let pipeline = common::test_pipeline(&reader, &FakeWriter::new(), &backend, &output_dir, common::test_options());
    pipeline.run(&path).await?;
    assert_eq!(RunState::of(pipeline.status(&path)?.as_ref()), RunState::Completed);

    let broken = common::test_pipeline(&reader, &FakeWriter::failing_saves(2), &backend, &output_dir, common::test_options());
    let result = broken.run(&path).await;

    assert!(matches!(result, Err(PipelineError::Assembly(_))));
    let record = broken.status(&path)?.expect("record");
    assert!(record.finished_at.is_none());
    assert_eq!(RunState::of(Some(&record)), RunState::InProgress);
    assert_eq!(backend.request_count(), 2);
    Ok(())
}

/// Test that a persistence failure stops the run and keeps what was already flushed
#[tokio::test]
async fn test_run_whenPartialOutputCannotBeWritten_shouldHaltWithPersistenceError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = source(temp_dir.path(), "report.pdf")?;
    let reader = FakeReader::new();
    reader.insert(
        &path,
        vec![
            FakePage::text(""),
            FakePage::text(common::page_text(2)),
            FakePage::text(common::page_text(3)),
        ],
    );
    let backend = MockBackend::working();
    let output_dir = temp_dir.path().join("out");
    let pipeline = common::test_pipeline(&reader, &FakeWriter::new(), &backend, &output_dir, common::test_options());

    // A plain file where the partial output directory belongs
    let layout = pipeline.layout_for(&path);
    fs::create_dir_all(layout.state_dir())?;
    fs::write(layout.pages_dir(), "in the way")?;

    let result = pipeline.run(&path).await;

    assert!(matches!(result, Err(PipelineError::Persistence(PersistenceError::Io { .. }))));
    assert_eq!(backend.request_count(), 1);
    assert_eq!(pipeline.client().calls_made(), 1);
    let record = pipeline.status(&path)?.expect("record");
    assert_eq!(record.processed.iter().copied().collect::<Vec<_>>(), vec![0]);
    assert!(record.skipped.contains(&0));
    assert!(record.failed.is_empty());
    assert!(record.finished_at.is_none());
    assert!(!layout.text_output_path().exists());
    Ok(())
}

/// Test that failing a previously failed page again leaves its old partial output untouched
#[tokio::test]
async fn test_run_retryingFailedPageThatFailsAgain_shouldKeepExistingPartialOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = source(temp_dir.path(), "report.pdf")?;
    let reader = FakeReader::new();
    reader.insert(&path, pages(2));
    let backend = MockBackend::new(MockBehavior::FailWhenContains("page number 2".into()));
    let output_dir = temp_dir.path().join("out");
    let pipeline = common::test_pipeline(&reader, &FakeWriter::new(), &backend, &output_dir, common::test_options());

    let store = ProgressStore::new(pipeline.layout_for(&path));
    let mut record = store.load_or_create("report", 2, &FileManager::hash_file(&path)?)?;
    store.write_partial(1, "older translation of page two")?;
    store.mark_failed(&mut record, 1)?;
    store.flush(&record)?;
    let before = fs::read(pipeline.layout_for(&path).page_path(1))?;

    let summary = pipeline.run(&path).await?;

    assert_eq!(summary.failed_count, 1);
    assert_eq!(fs::read(pipeline.layout_for(&path).page_path(1))?, before);
    let record = pipeline.status(&path)?.expect("record");
    assert!(record.is_failed(1));
    assert!(record.is_processed(0));
    Ok(())
}

/// Test that the reflow fallback drops only the paragraph that cannot be rendered
#[tokio::test]
async fn test_run_reflowWithUnrenderableParagraph_shouldKeepTheRestOfThePage() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = source(temp_dir.path(), "report.pdf")?;
    let reader = FakeReader::new();
    reader.insert(&path, pages(1));
    let writer = FakeWriter::rejecting("unprintable").with_failing_saves(1);
    let backend = MockBackend::working();
    let output_dir = temp_dir.path().join("out");
    let pipeline = common::test_pipeline(&reader, &writer, &backend, &output_dir, common::test_options());

    // Page already translated by an earlier run, with two paragraphs
    let store = ProgressStore::new(pipeline.layout_for(&path));
    let mut record = store.load_or_create("report", 1, &FileManager::hash_file(&path)?)?;
    store.write_partial(0, "First paragraph stays.\n\nSecond paragraph is unprintable.")?;
    store.mark_processed(&mut record, 0)?;
    store.flush(&record)?;

    let summary = pipeline.run(&path).await?;

    let composite = summary.composite.expect("composite");
    assert_eq!(composite.strategy, AssemblyStrategy::Reflow);
    assert_eq!(composite.render_failures, 1);
    let blocks = writer.saved()[0].blocks();
    assert!(blocks.contains(&"Page 1".to_string()));
    assert!(blocks.contains(&"First paragraph stays.".to_string()));
    assert!(!blocks.iter().any(|b| b.contains("unprintable")));
    assert_eq!(backend.request_count(), 0);
    Ok(())
}
