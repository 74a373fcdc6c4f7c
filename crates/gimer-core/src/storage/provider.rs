//! Whole-collection persistence backends.
//!
//! A provider only moves complete snapshots. Encoding lives in the store.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tempfile::NamedTempFile;

use crate::error::StoreError;

/// Durable storage for one serialized collection.
pub trait PersistenceProvider: Send + Sync {
    /// Prepare the backing location (create directories).
    fn init(&self) -> Result<(), StoreError>;

    /// Read the full snapshot as raw bytes. `None` when absent or blank.
    ///
    /// Bytes are not validated here; undecodable content is the store's
    /// concern.
    fn read(&self) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the full snapshot.
    fn write(&self, contents: &str) -> Result<(), StoreError>;
}

/// One JSON file per collection, replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    path: PathBuf,
}

impl JsonFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl PersistenceProvider for JsonFileProvider {
    fn init(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::DataDir {
                path: parent.to_path_buf(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }

    fn read(&self) -> Result<Option<Vec<u8>>, StoreError> {
        match std::fs::read(&self.path) {
            Ok(content) if is_blank(&content) => Ok(None),
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn write(&self, contents: &str) -> Result<(), StoreError> {
        // Temp file in the same directory so the rename never crosses filesystems.
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(contents.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;
        Ok(())
    }
}

fn is_blank(content: &[u8]) -> bool {
    content.iter().all(u8::is_ascii_whitespace)
}

/// Shared in-memory snapshot.
///
/// Clones share the same buffer, so two stores built from clones of one
/// provider behave like two processes sharing one file.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    contents: Arc<Mutex<Option<String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the buffer with raw content, bypassing encoding.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        let provider = Self::default();
        *provider.lock() = Some(contents.into());
        provider
    }

    /// Make every subsequent write fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Current raw snapshot.
    pub fn contents(&self) -> Option<String> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.contents
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl PersistenceProvider for MemoryProvider {
    fn init(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn read(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .lock()
            .as_ref()
            .filter(|c| !is_blank(c.as_bytes()))
            .map(|c| c.clone().into_bytes()))
    }

    fn write(&self, contents: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Provider("write rejected".into()));
        }
        *self.lock() = Some(contents.to_string());
        Ok(())
    }
}
