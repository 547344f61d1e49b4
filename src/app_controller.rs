use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::app_config::Config;
use crate::document::{PdfReader, PdfWriter};
use crate::errors::{PersistenceError, PipelineError};
use crate::file_utils::FileManager;
use crate::pipeline::{
    Document, DocumentPipeline, LoggingObserver, PageOutcome, PipelineObserver, PipelineOptions, RunState,
    RunSummary,
};
use crate::progress::ProgressRecord;
use crate::providers;
use crate::translation::TranslationClient;

// @module: Application controller for document translation

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,
}

/// Outcome of a folder run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FolderReport {
    pub succeeded: usize,
    pub failed: usize,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Translation client configured from the translation section
    pub fn build_client(config: &Config) -> Result<TranslationClient> {
        let backend = providers::create_backend(&config.translation)?;
        let common = &config.translation.common;
        Ok(TranslationClient::new(backend)
            .with_retry_policy(common.retry_policy())
            .with_min_interval(Duration::from_millis(common.rate_limit_delay_ms))
            .with_min_text_length(common.min_text_length))
    }

    fn build_pipeline(&self) -> Result<DocumentPipeline> {
        FileManager::ensure_dir(&self.config.output_dir)
            .with_context(|| format!("Failed to create output directory: {:?}", self.config.output_dir))?;

        let client = Self::build_client(&self.config)?;
        info!(
            "pagewise: {} ({} -> {})",
            self.config.translation.provider.display_name(),
            self.config.source_language,
            self.config.target_language
        );

        Ok(DocumentPipeline::new(
            Arc::new(PdfReader),
            Arc::new(PdfWriter),
            client,
            &self.config.output_dir,
            PipelineOptions::from_config(&self.config),
        )
        .with_observer(Self::observer_for(std::io::stderr().is_terminal())))
    }

    // @returns: Progress bar on a terminal, log lines otherwise
    fn observer_for(terminal: bool) -> Arc<dyn PipelineObserver> {
        if terminal {
            Arc::new(ProgressBarObserver::default())
        } else {
            Arc::new(LoggingObserver)
        }
    }

    /// Translate a single document
    pub async fn run(&self, input_file: PathBuf, restart: bool) -> Result<RunSummary> {
        let pipeline = self.build_pipeline()?;
        Self::run_one(&pipeline, &input_file, restart).await
    }

    async fn run_one(pipeline: &DocumentPipeline, input_file: &Path, restart: bool) -> Result<RunSummary> {
        if !input_file.is_file() {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }
        if restart {
            pipeline.reset(input_file)?;
        }

        let start_time = std::time::Instant::now();
        let summary = pipeline.run(input_file).await.map_err(|e| match e {
            PipelineError::Persistence(
                ref inner @ (PersistenceError::SourceChanged { .. } | PersistenceError::PageCountMismatch { .. }),
            ) => anyhow!("{} (run again with --restart to discard the old progress)", inner),
            other => anyhow::Error::new(other),
        })?;

        Self::report(&summary, start_time.elapsed());
        Ok(summary)
    }

    fn report(summary: &RunSummary, elapsed: Duration) {
        info!(
            "Done in {}: {} translated, {} skipped, {} failed, {} from earlier runs",
            Self::format_duration(elapsed),
            summary.processed_count,
            summary.skipped_count,
            summary.failed_count,
            summary.resumed_count
        );
        if let Some(composite) = &summary.composite {
            info!("Text output: {:?}", composite.text_path);
            info!("PDF output: {:?} ({:?})", composite.pdf_path, composite.strategy);
            if composite.render_failures > 0 {
                warn!("{} text block(s) could not be rendered into the PDF", composite.render_failures);
            }
        }
        if summary.failed_count > 0 {
            warn!("Some pages failed; run again to retry them");
        }
    }

    /// Format a duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;

        if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }

    /// Translate every PDF under `input_dir`, one document at a time
    ///
    /// Fails after the whole folder when any document failed.
    pub async fn run_folder(&self, input_dir: PathBuf, restart: bool) -> Result<FolderReport> {
        if !input_dir.is_dir() {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }
        let files = FileManager::find_files(&input_dir, "pdf")?;
        if files.is_empty() {
            return Err(anyhow!("No PDF files found in directory: {:?}", input_dir));
        }

        let pipeline = self.build_pipeline()?;
        let client = pipeline.client();
        client
            .check_connection()
            .await
            .with_context(|| format!("Cannot reach {} before processing {:?}", client.backend_name(), input_dir))?;

        let mut report = FolderReport::default();
        for file in &files {
            match Self::run_one(&pipeline, file, restart).await {
                Ok(_) => report.succeeded += 1,
                Err(e) => {
                    error!("Error processing {:?}: {:#}", file, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Folder processing completed: {} translated, {} failed, {} {} call(s)",
            report.succeeded,
            report.failed,
            client.calls_made(),
            client.backend_name()
        );
        if report.failed > 0 {
            return Err(anyhow!("{} of {} documents failed", report.failed, files.len()));
        }
        Ok(report)
    }

    /// Let the user pick documents from the input folder until they quit
    pub async fn run_interactive(&self, restart: bool) -> Result<()> {
        let input_dir = &self.config.input_dir;
        FileManager::ensure_dir(input_dir)
            .with_context(|| format!("Failed to create input directory: {:?}", input_dir))?;

        let pipeline = self.build_pipeline()?;
        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        let mut output = std::io::stdout();
        Self::interactive_loop(&pipeline, input_dir, &mut input, &mut output, restart).await
    }

    /// Menu loop behind `run_interactive`
    ///
    /// Fails once the user quits if any chosen document failed.
    async fn interactive_loop<R: BufRead, W: Write>(
        pipeline: &DocumentPipeline,
        input_dir: &Path,
        input: &mut R,
        output: &mut W,
        restart: bool,
    ) -> Result<()> {
        let mut failed = 0;
        loop {
            let files = FileManager::find_files(input_dir, "pdf")?;
            if files.is_empty() {
                warn!("No PDF files in {:?}; put documents there and run again", input_dir);
                break;
            }

            let Some(choice) = select_document(&files, input, output)? else {
                break;
            };
            if let Err(e) = Self::run_one(pipeline, &choice, restart).await {
                error!("{:#}", e);
                failed += 1;
            }

            if !confirm("Translate another document? (y/n): ", input, output)? {
                break;
            }
        }

        if failed > 0 {
            return Err(anyhow!("{} chosen document(s) failed", failed));
        }
        Ok(())
    }

    /// Print the stored progress of a document
    pub fn status(&self, input_file: &Path) -> Result<()> {
        let pipeline = self.build_pipeline()?;
        let record = pipeline.status(input_file)?;
        let layout = pipeline.layout_for(input_file);
        println!("{}", describe_status(layout.document_id(), record.as_ref()));
        Ok(())
    }
}

/// Human-readable progress summary
pub fn describe_status(document_id: &str, record: Option<&ProgressRecord>) -> String {
    let state = RunState::of(record);
    let Some(record) = record else {
        return format!("{}: {}", document_id, state);
    };

    let mut out = format!(
        "{}: {}\n  pages: {}\n  processed: {} ({} skipped)\n  failed: {}\n  pending: {}\n  started: {}",
        document_id,
        state,
        record.total_pages,
        record.processed.len(),
        record.skipped.len(),
        record.failed.len(),
        record.pending_count(),
        record.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
    );
    if let Some(finished) = record.finished_at {
        out.push_str(&format!("\n  finished: {}", finished.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    if !record.failed.is_empty() {
        let pages: Vec<String> = record.failed.iter().map(|i| (i + 1).to_string()).collect();
        out.push_str(&format!("\n  failed pages: {}", pages.join(", ")));
    }
    out
}

/// Numbered menu over `files`; `None` when the user enters 0 or input ends
pub fn select_document<R: BufRead, W: Write>(files: &[PathBuf], input: &mut R, output: &mut W) -> Result<Option<PathBuf>> {
    writeln!(output, "Available documents:")?;
    for (i, file) in files.iter().enumerate() {
        let name = file.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        writeln!(output, "  {}. {}", i + 1, name)?;
    }

    loop {
        write!(output, "Choose a document (1-{}, 0 to quit): ", files.len())?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        match line.trim().parse::<usize>() {
            Ok(0) => return Ok(None),
            Ok(n) if n <= files.len() => return Ok(Some(files[n - 1].clone())),
            _ => writeln!(output, "Invalid choice")?,
        }
    }
}

fn confirm<R: BufRead, W: Write>(prompt: &str, input: &mut R, output: &mut W) -> Result<bool> {
    write!(output, "{}", prompt)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Observer drawing one progress bar per document
#[derive(Default)]
pub struct ProgressBarObserver {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressBarObserver {
    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(bar) = guard.as_ref() {
                f(bar);
            }
        }
    }
}

impl PipelineObserver for ProgressBarObserver {
    fn on_run_started(&self, document: &Document, record: &ProgressRecord) {
        let bar = ProgressBar::new(document.page_count as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style.progress_chars("=> "));
        bar.set_message(document.id.clone());
        if !record.processed.is_empty() {
            info!("Resuming '{}': {} page(s) already done", document.id, record.processed.len());
        }
        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some(bar);
        }
    }

    fn on_page_completed(&self, document: &Document, index: usize, outcome: &PageOutcome) {
        self.with_bar(|bar| {
            bar.inc(1);
            if let PageOutcome::Skipped(reason) = outcome {
                bar.println(format!("{}: page {} skipped ({})", document.id, index + 1, reason));
            }
        });
    }

    fn on_page_failed(&self, document: &Document, index: usize, error: &str) {
        self.with_bar(|bar| {
            bar.inc(1);
            bar.println(format!("{}: page {} failed: {}", document.id, index + 1, error));
        });
    }

    fn on_run_finished(&self, _document: &Document, _summary: &RunSummary) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
    }
}
