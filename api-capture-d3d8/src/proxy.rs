//! Locating and loading the genuine implementation.
//!
//! The real `d3d8.dll` is loaded exactly once per process and never
//! unloaded before teardown; wrappers hold raw pointers into it for the
//! process lifetime. Load or symbol failure is an unrecoverable environment
//! error surfaced as a typed [`CaptureError`] — the exported entry decides
//! whether that aborts the process (see [`crate::config::FailurePolicy`]).

use std::ffi::c_void;
use std::sync::OnceLock;

use libloading::Library;

use api_capture_core::CaptureError;

use crate::config::CaptureConfig;

/// Signature of the real `Direct3DCreate8` export.
pub type Direct3DCreate8Fn = unsafe extern "system" fn(u32) -> *mut c_void;

/// The loaded genuine library and its resolved entry point.
#[derive(Debug)]
pub struct RealModule {
    // Keeps the library mapped; the fn pointer below lives inside it.
    _library: Library,
    create: Direct3DCreate8Fn,
}

impl RealModule {
    /// Resolve, load, and bind the real implementation.
    pub fn load(config: &CaptureConfig) -> Result<Self, CaptureError> {
        let path = config.real_library_path()?;
        log::info!("loading genuine Direct3D 8 from {}", path.display());

        let library = unsafe { Library::new(&path) }.map_err(|e| {
            CaptureError::InitializationFailed(format!("{}: {e}", path.display()))
        })?;

        let create = unsafe { library.get::<Direct3DCreate8Fn>(b"Direct3DCreate8\0") }
            .map(|symbol| *symbol)
            .map_err(|e| CaptureError::SymbolNotFound(format!("Direct3DCreate8: {e}")))?;

        Ok(Self {
            _library: library,
            create,
        })
    }

    /// Invoke the real entry point. Returns whatever it returned, including
    /// null on failure — behavior is never altered here.
    ///
    /// # Safety
    /// Calls into the loaded library.
    pub unsafe fn direct3d_create8(&self, sdk_version: u32) -> *mut c_void {
        (self.create)(sdk_version)
    }
}

/// Run `load` at most once per cell, caching success or failure for the
/// rest of the process. Every later call observes the first outcome.
pub fn load_once<T>(
    cell: &OnceLock<Result<T, CaptureError>>,
    load: impl FnOnce() -> Result<T, CaptureError>,
) -> Result<&T, CaptureError> {
    cell.get_or_init(load).as_ref().map_err(Clone::clone)
}
