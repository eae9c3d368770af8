//! # api-capture-core
//!
//! Platform-agnostic call interception core.
//!
//! Provides the recording wrapper family for a Direct3D 8 style
//! object-oriented API, the identity registry that keeps real objects and
//! wrappers in one-to-one correspondence, and the thread-safe trace
//! recorder. The module proxy (`api-capture-d3d8`) plugs the raw COM world
//! into the trait seam defined here.
//!
//! ## Architecture
//!
//! ```text
//! api-capture-core (this crate)
//! ├── traits/    ← Unknown + the four wrapped interface contracts
//! ├── models/    ← CaptureError, Guid tables, trace Value, API data types
//! ├── trace/     ← TraceWriter/CallBuilder, sinks, document reader
//! ├── wrap/      ← TraceDirect3D8, TraceDevice8, TraceSwapChain8, TraceSurface8
//! ├── registry   ← IdentityRegistry: (handle, interface) → live wrapper
//! └── context    ← CaptureContext: process-scoped recorder + registry
//! ```
//!
//! ## Guarantees
//!
//! - Transparency: return values, error codes, and object identities seen
//!   through a wrapper are exactly those the real library produced.
//! - Identity stability: one live wrapper per (real handle, interface);
//!   re-queries return the same instance.
//! - Record atomicity: concurrent calls interleave in the trace document at
//!   whole-block granularity only, and no lock spans the real call.

pub mod context;
pub mod models;
pub mod registry;
pub mod trace;
pub mod traits;
pub mod wrap;

// Re-export key types at crate root for convenience.
pub use context::CaptureContext;
pub use models::d3d8::HResult;
pub use models::error::CaptureError;
pub use models::guid::Guid;
pub use models::value::Value;
pub use registry::IdentityRegistry;
pub use trace::{FileSink, MemorySink, TraceSink, TraceWriter};
pub use traits::{
    AnyInterface, Direct3D8, Direct3DDevice8, Direct3DSurface8, Direct3DSwapChain8, InterfaceTag,
    RawHandle, Unknown,
};
pub use wrap::{TraceDevice8, TraceDirect3D8, TraceSurface8, TraceSwapChain8};
