//! # api-capture-d3d8
//!
//! Direct3D 8 module proxy for api-capture-kit.
//!
//! Builds a `cdylib` named `d3d8` that exports `Direct3DCreate8`. Dropped
//! next to an application (so the loader's search order finds it before the
//! system copy), it loads the genuine `d3d8.dll` from the system directory,
//! forwards every call unchanged, and writes an ordered trace of the call
//! stream via `api-capture-core`.
//!
//! Provides:
//! - `entry` — the exported `Direct3DCreate8` and process lifecycle
//! - `proxy` — locating/loading the genuine library, once per process
//! - `com` — vtable layouts, inbound adapters, outbound wrapper projection
//! - `config` — environment overrides (`API_CAPTURE_D3D8_DLL`,
//!   `API_CAPTURE_TRACE_PATH`, `API_CAPTURE_ON_INIT_FAILURE`)

pub mod com;
pub mod config;
pub mod entry;
pub mod proxy;

pub use config::{CaptureConfig, FailurePolicy};
pub use proxy::RealModule;
