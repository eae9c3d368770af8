use std::any::Any;
use std::sync::Arc;

use crate::models::d3d8::HResult;
use crate::models::guid::Guid;

use super::AnyInterface;

/// Stable identity of an object owned by the real library: the raw COM
/// pointer value on Windows, an arbitrary id for test doubles. The capture
/// layer never constructs one, only carries it.
pub type RawHandle = u64;

/// Base contract shared by every wrapped interface: identity, the reference
/// discipline, and interface re-query.
///
/// Implemented three ways: by the raw FFI adapters over real COM objects, by
/// the recording wrappers standing in for them, and by test doubles. The
/// reference methods move real reference counts only — an `Arc` clone of an
/// implementor is a non-owning alias and has no effect on the underlying
/// object's lifetime.
pub trait Unknown: Send + Sync {
    fn raw_handle(&self) -> RawHandle;

    /// `self` as `Any`, so a wrapper argument can be unwrapped back to the
    /// real-space object it fronts.
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Forwarded `IUnknown::AddRef`. Returns the new reference count.
    fn add_ref(&self) -> u32;

    /// Forwarded `IUnknown::Release`. Returns the remaining reference count.
    fn release(&self) -> u32;

    /// Forwarded `IUnknown::QueryInterface`. On success the new reference
    /// belongs to the caller, carried by the returned interface.
    fn query_interface(&self, iid: &Guid) -> Result<AnyInterface, HResult>;
}
