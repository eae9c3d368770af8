use thiserror::Error;

/// Errors surfaced by the capture engine itself.
///
/// Failures of forwarded calls into the real library are never represented
/// here — those travel back to the application as the original status codes,
/// untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("initialization failed: {0}")]
    InitializationFailed(String),

    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("duplicate identity for handle {handle:#x} ({interface})")]
    DuplicateIdentity {
        handle: u64,
        interface: &'static str,
    },

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("malformed trace: {0}")]
    MalformedTrace(String),

    #[error("trace document is closed")]
    TraceClosed,
}
