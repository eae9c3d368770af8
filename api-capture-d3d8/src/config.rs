//! Environment-derived proxy configuration.
//!
//! Everything the proxy decides at startup comes from here: where the
//! genuine `d3d8.dll` lives, where the trace document goes, and what to do
//! when initialization fails.

use std::env;
use std::path::{Path, PathBuf};

use api_capture_core::CaptureError;

/// Overrides the directory search for the genuine implementation.
pub const ENV_REAL_DLL: &str = "API_CAPTURE_D3D8_DLL";
/// Overrides the trace output path.
pub const ENV_TRACE_PATH: &str = "API_CAPTURE_TRACE_PATH";
/// Selects the initialization failure policy: `abort` (default) or `error`.
pub const ENV_ON_INIT_FAILURE: &str = "API_CAPTURE_ON_INIT_FAILURE";

/// What the exported entry point does when the real library cannot be
/// loaded. A silent half-initialized proxy would corrupt the trace, so the
/// default is the loud one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log and terminate the process.
    #[default]
    Abort,
    /// Return failure to the caller and let it decide.
    Error,
}

/// Proxy configuration, normally read from the environment once per
/// process.
#[derive(Debug, Clone, Default)]
pub struct CaptureConfig {
    /// Explicit path to the genuine library, bypassing the system
    /// directory convention.
    pub real_library: Option<PathBuf>,

    /// Explicit trace output path.
    pub trace_path: Option<PathBuf>,

    pub failure_policy: FailurePolicy,
}

impl CaptureConfig {
    pub fn from_env() -> Self {
        Self {
            real_library: env::var_os(ENV_REAL_DLL).map(PathBuf::from),
            trace_path: env::var_os(ENV_TRACE_PATH).map(PathBuf::from),
            failure_policy: match env::var(ENV_ON_INIT_FAILURE).as_deref() {
                Ok("error") => FailurePolicy::Error,
                Ok("abort") | Err(_) => FailurePolicy::Abort,
                Ok(other) => {
                    log::warn!("unknown {ENV_ON_INIT_FAILURE} value {other:?}, using abort");
                    FailurePolicy::Abort
                }
            },
        }
    }

    /// Path of the genuine implementation: the override if set, otherwise
    /// `d3d8.dll` in the system's canonical library directory.
    pub fn real_library_path(&self) -> Result<PathBuf, CaptureError> {
        if let Some(path) = &self.real_library {
            return Ok(path.clone());
        }
        Ok(system_directory()?.join("d3d8.dll"))
    }

    /// Where the trace document goes: the override if set, otherwise
    /// `<process>.d3d8.trace` next to the working directory, never
    /// clobbering an existing file.
    pub fn resolve_trace_path(&self) -> PathBuf {
        if let Some(path) = &self.trace_path {
            return path.clone();
        }
        default_trace_path(Path::new("."), &process_name())
    }
}

fn process_name() -> String {
    env::current_exe()
        .ok()
        .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "capture".into())
}

/// `<dir>/<process>.d3d8.trace`, suffixed with a counter while the name is
/// taken, so consecutive runs never overwrite an earlier trace.
fn default_trace_path(dir: &Path, process: &str) -> PathBuf {
    let mut counter = 0u32;
    loop {
        let name = if counter == 0 {
            format!("{process}.d3d8.trace")
        } else {
            format!("{process}.d3d8.{counter}.trace")
        };
        let candidate = dir.join(name);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(target_os = "windows")]
fn system_directory() -> Result<PathBuf, CaptureError> {
    use windows::Win32::System::SystemInformation::GetSystemDirectoryW;

    let mut buffer = [0u16; 260];
    let len = unsafe { GetSystemDirectoryW(Some(&mut buffer)) } as usize;
    if len == 0 || len > buffer.len() {
        return Err(CaptureError::InitializationFailed(
            "GetSystemDirectoryW failed".into(),
        ));
    }
    Ok(PathBuf::from(String::from_utf16_lossy(&buffer[..len])))
}

#[cfg(not(target_os = "windows"))]
fn system_directory() -> Result<PathBuf, CaptureError> {
    Err(CaptureError::InitializationFailed(format!(
        "no system library directory on this platform; set {ENV_REAL_DLL}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn override_wins_over_system_directory() {
        let config = CaptureConfig {
            real_library: Some(PathBuf::from("/tmp/fake/d3d8.dll")),
            ..Default::default()
        };
        assert_eq!(
            config.real_library_path().unwrap(),
            PathBuf::from("/tmp/fake/d3d8.dll")
        );
    }

    #[test]
    fn trace_path_override_is_used_verbatim() {
        let config = CaptureConfig {
            trace_path: Some(PathBuf::from("/tmp/out.trace")),
            ..Default::default()
        };
        assert_eq!(config.resolve_trace_path(), PathBuf::from("/tmp/out.trace"));
    }

    #[test]
    fn default_trace_name_never_clobbers() {
        let dir = std::env::temp_dir().join("api_capture_config_test");
        fs::create_dir_all(&dir).unwrap();

        let first = default_trace_path(&dir, "game");
        assert_eq!(first.file_name().unwrap(), "game.d3d8.trace");
        fs::write(&first, b"").unwrap();

        let second = default_trace_path(&dir, "game");
        assert_eq!(second.file_name().unwrap(), "game.d3d8.1.trace");
        fs::write(&second, b"").unwrap();

        let third = default_trace_path(&dir, "game");
        assert_eq!(third.file_name().unwrap(), "game.d3d8.2.trace");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn failure_policy_defaults_to_abort() {
        assert_eq!(FailurePolicy::default(), FailurePolicy::Abort);
    }
}
