/*!
 * Composite output assembly.
 *
 * The assembler reads every page's partial output in index order and
 * produces two artifacts in the document's state directory:
 * - a plain-text composite with `--- PAGE n ---` section markers
 * - a PDF, built page by page, or as one reflowed text flow when the
 *   page-by-page build fails
 *
 * Missing partial outputs are omitted, never treated as errors. Nothing
 * here deletes partial outputs.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::{DocumentBuilder, DocumentWriter, FontStyle};
use crate::errors::{AssemblyError, DocumentError};
use crate::file_utils::FileManager;
use crate::pipeline::model::Document;
use crate::progress::ProgressStore;
use crate::translation::sanitize::sanitize;

static PAGE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^--- PAGE (\d+) ---[ \t]*\r?$").unwrap());

/// How the PDF composite was built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyStrategy {
    /// One output page per translated page
    Structured,
    /// A single flow built from the text composite
    Reflow,
}

/// Artifacts of one assembly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeOutput {
    pub pdf_path: PathBuf,
    pub text_path: PathBuf,
    /// 0-based indices present in the composite
    pub included_pages: Vec<usize>,
    /// 0-based indices without a partial output
    pub omitted_pages: Vec<usize>,
    pub strategy: AssemblyStrategy,
    /// Text blocks that could not be rendered and were left out
    pub render_failures: usize,
}

/// Builds composite outputs from partial outputs
pub struct Assembler {
    writer: Arc<dyn DocumentWriter>,
    max_code_point: u32,
}

impl Assembler {
    pub fn new(writer: Arc<dyn DocumentWriter>, max_code_point: u32) -> Self {
        Self { writer, max_code_point }
    }

    /// Assemble `document` from the partial outputs in `store`
    pub fn assemble(&self, document: &Document, store: &ProgressStore) -> Result<CompositeOutput, AssemblyError> {
        let layout = store.layout();
        let mut pages = Vec::new();
        let mut omitted_pages = Vec::new();
        for index in 0..document.page_count {
            match store.read_partial(index) {
                Ok(Some(text)) => pages.push((index, text)),
                Ok(None) => omitted_pages.push(index),
                Err(e) => {
                    warn!("Omitting page {} of '{}': {}", index + 1, document.id, e);
                    omitted_pages.push(index);
                }
            }
        }

        let text_path = layout.text_output_path();
        let composite_text = render_text(document, &pages);
        FileManager::write_atomic(&text_path, composite_text.as_bytes()).map_err(|source| AssemblyError::Io {
            path: text_path.clone(),
            source,
        })?;

        let pdf_path = layout.pdf_output_path();
        let (strategy, render_failures) = match self.build_structured(document, &pages, &pdf_path) {
            Ok(failures) => (AssemblyStrategy::Structured, failures),
            Err(structured) => {
                warn!(
                    "Structured assembly of '{}' failed ({}), falling back to reflow",
                    document.id, structured
                );
                let failures = self.build_reflow(&composite_text, &pdf_path).map_err(|fallback| AssemblyError::Failed {
                    document_id: document.id.clone(),
                    structured: structured.to_string(),
                    fallback: fallback.to_string(),
                })?;
                (AssemblyStrategy::Reflow, failures)
            }
        };

        Ok(CompositeOutput {
            pdf_path,
            text_path,
            included_pages: pages.iter().map(|(index, _)| *index).collect(),
            omitted_pages,
            strategy,
            render_failures,
        })
    }

    /// Write one block, counting instead of propagating render failures
    fn write_counted(&self, builder: &mut dyn DocumentBuilder, text: &str, failures: &mut usize) {
        let clean = sanitize(text, self.max_code_point);
        if let Err(e) = builder.write_block(&clean) {
            warn!("Skipping block that failed to render: {}", e);
            *failures += 1;
        }
    }

    fn build_structured(
        &self,
        document: &Document,
        pages: &[(usize, String)],
        path: &Path,
    ) -> Result<usize, DocumentError> {
        let mut builder = self.writer.new_document();
        let mut failures = 0;

        builder.add_page()?;
        builder.set_font(FontStyle::Title);
        self.write_counted(builder.as_mut(), &format!("Translation: {}", document.id), &mut failures);
        builder.set_font(FontStyle::Body);
        self.write_counted(builder.as_mut(), &format!("Translated on: {}", timestamp(document)), &mut failures);

        for (index, text) in pages {
            builder.add_page()?;
            builder.set_font(FontStyle::Heading);
            self.write_counted(builder.as_mut(), &format!("Page {}", index + 1), &mut failures);
            builder.set_font(FontStyle::Body);
            for paragraph in paragraphs(text) {
                self.write_counted(builder.as_mut(), paragraph, &mut failures);
            }
        }

        builder.save(path)?;
        debug!("Structured PDF for '{}': {} pages", document.id, builder.page_count());
        Ok(failures)
    }

    fn build_reflow(&self, composite_text: &str, path: &Path) -> Result<usize, DocumentError> {
        let mut builder = self.writer.new_document();
        let mut failures = 0;
        builder.add_page()?;

        let (header, sections) = split_sections(composite_text);
        builder.set_font(FontStyle::Body);
        for line in header.lines().map(str::trim).filter(|l| !l.is_empty()) {
            self.write_counted(builder.as_mut(), line, &mut failures);
        }
        for (number, body) in sections {
            builder.set_font(FontStyle::Heading);
            self.write_counted(builder.as_mut(), &format!("Page {}", number), &mut failures);
            builder.set_font(FontStyle::Body);
            for paragraph in paragraphs(body) {
                self.write_counted(builder.as_mut(), paragraph, &mut failures);
            }
        }

        builder.save(path)?;
        Ok(failures)
    }
}

fn timestamp(document: &Document) -> String {
    document.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn paragraphs(text: &str) -> impl Iterator<Item = &str> {
    text.split("\n\n").map(str::trim).filter(|p| !p.is_empty())
}

/// Plain-text composite of the included pages
pub fn render_text(document: &Document, pages: &[(usize, String)]) -> String {
    let mut out = format!(
        "=== TRANSLATION {} ===\nTranslated on: {}\n\n",
        document.id,
        timestamp(document)
    );
    for (index, text) in pages {
        out.push_str(&format!("--- PAGE {} ---\n{}\n\n", index + 1, text.trim()));
    }
    out
}

/// Split a text composite into its header and `(page number, body)` sections
pub fn split_sections(composite_text: &str) -> (&str, Vec<(usize, &str)>) {
    let markers: Vec<_> = PAGE_MARKER.captures_iter(composite_text).collect();
    let header_end = markers
        .first()
        .and_then(|c| c.get(0))
        .map(|m| m.start())
        .unwrap_or(composite_text.len());

    let mut sections = Vec::with_capacity(markers.len());
    for (i, captures) in markers.iter().enumerate() {
        let (Some(whole), Some(number)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let end = markers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(composite_text.len());
        let number = number.as_str().parse().unwrap_or(0);
        sections.push((number, &composite_text[whole.end()..end]));
    }
    (&composite_text[..header_end], sections)
}
