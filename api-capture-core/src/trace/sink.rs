use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::CaptureError;

/// Append-only destination for the serialized trace document.
///
/// The recorder owns its sink for the process lifetime and only ever
/// appends; compression or container framing belongs behind this trait, not
/// in the engine.
pub trait TraceSink: Send {
    fn append(&mut self, data: &[u8]) -> Result<(), CaptureError>;
    fn flush(&mut self) -> Result<(), CaptureError>;
}

/// Sink writing straight to a file on disk.
pub struct FileSink {
    path: PathBuf,
    file: File,
}

impl FileSink {
    /// Create the file (and any missing parent directories).
    pub fn create(path: &Path) -> Result<Self, CaptureError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    CaptureError::StorageError(format!("failed to create directory: {e}"))
                })?;
            }
        }
        let file = File::create(path)
            .map_err(|e| CaptureError::StorageError(format!("failed to create file: {e}")))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TraceSink for FileSink {
    fn append(&mut self, data: &[u8]) -> Result<(), CaptureError> {
        self.file
            .write_all(data)
            .map_err(|e| CaptureError::StorageError(format!("write failed: {e}")))
    }

    fn flush(&mut self) -> Result<(), CaptureError> {
        self.file
            .flush()
            .map_err(|e| CaptureError::StorageError(e.to_string()))
    }
}

/// In-memory sink sharing its buffer, for tests and tools.
#[derive(Clone, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far.
    pub fn contents(&self) -> Vec<u8> {
        self.buffer.lock().clone()
    }

    pub fn contents_string(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }
}

impl TraceSink for MemorySink {
    fn append(&mut self, data: &[u8]) -> Result<(), CaptureError> {
        self.buffer.lock().extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }
}
