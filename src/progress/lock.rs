use std::fs::{File, OpenOptions, TryLockError};
use std::path::{Path, PathBuf};

use log::debug;

use crate::errors::PersistenceError;
use crate::file_utils::FileManager;
use crate::progress::layout::StateLayout;

/// Exclusive advisory lock on a document's state directory
///
/// Held for the whole run and released on drop. The OS drops the lock when
/// the process dies, so a crash never leaves a stale lock behind.
#[derive(Debug)]
pub struct DocumentLock {
    file: File,
    path: PathBuf,
}

impl DocumentLock {
    /// Take the lock or fail with `PersistenceError::Locked`
    pub fn acquire(layout: &StateLayout) -> Result<Self, PersistenceError> {
        let io_error = |path: &Path, source| PersistenceError::Io { path: path.to_path_buf(), source };

        FileManager::ensure_dir(layout.state_dir()).map_err(|e| io_error(layout.state_dir(), e))?;
        let path = layout.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| io_error(&path, e))?;

        match file.try_lock() {
            Ok(()) => {
                debug!("Locked {:?}", path);
                Ok(Self { file, path })
            }
            Err(TryLockError::WouldBlock) => Err(PersistenceError::Locked {
                document_id: layout.document_id().to_string(),
                path,
            }),
            Err(TryLockError::Error(e)) => Err(io_error(&path, e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DocumentLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
