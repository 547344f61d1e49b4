use std::path::{Path, PathBuf};

/// File locations of one document's state
///
/// Everything lives under `<output_dir>/<document_id>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLayout {
    document_id: String,
    state_dir: PathBuf,
}

impl StateLayout {
    /// Layout for `document_id` under `output_dir`
    pub fn new(output_dir: impl AsRef<Path>, document_id: impl Into<String>) -> Self {
        let document_id = document_id.into();
        let state_dir = output_dir.as_ref().join(&document_id);
        Self { document_id, state_dir }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn progress_path(&self) -> PathBuf {
        self.state_dir.join("progress.json")
    }

    pub fn pages_dir(&self) -> PathBuf {
        self.state_dir.join("pages")
    }

    /// Partial output of a 0-based page index
    pub fn page_path(&self, index: usize) -> PathBuf {
        self.pages_dir().join(format!("page_{:05}.txt", index))
    }

    pub fn text_output_path(&self) -> PathBuf {
        self.state_dir.join(format!("translated_{}.txt", self.document_id))
    }

    pub fn pdf_output_path(&self) -> PathBuf {
        self.state_dir.join(format!("translated_{}.pdf", self.document_id))
    }

    pub fn lock_path(&self) -> PathBuf {
        self.state_dir.join(".lock")
    }
}
