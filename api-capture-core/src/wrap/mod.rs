//! The recording wrapper family.
//!
//! One wrapper type per wrapped interface. Each owns the real-side object
//! it fronts, implements the same interface trait, and for every method:
//! encodes the inputs, forwards to the real object (unwrapping any wrapper
//! arguments to real space first), wraps object results through the
//! identity registry, records outputs and the return value, and hands back
//! exactly what the real call produced.
//!
//! The shape shared by all variants — construction, registry interplay, the
//! mirrored reference count, and the `IUnknown` trio — is stamped out by
//! `wrapper_type!`; the per-interface method bodies live in the sibling
//! modules.

mod device;
mod direct3d8;
mod surface;
mod swap_chain;

pub use device::TraceDevice8;
pub use direct3d8::TraceDirect3D8;
pub use surface::TraceSurface8;
pub use swap_chain::TraceSwapChain8;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::context::CaptureContext;
use crate::models::d3d8::Rect;
use crate::models::value::Value;
use crate::traits::{AnyInterface, Direct3DSurface8, Unknown};

/// Mirror of the application's reference count on one wrapper.
///
/// Starts at one for the reference the real call transferred to the
/// application at wrap time. Reaching zero is the wrapper's logical death;
/// the count never goes back up from zero.
pub(crate) struct RefCount(AtomicU32);

impl RefCount {
    pub(crate) fn new() -> Self {
        Self(AtomicU32::new(1))
    }

    pub(crate) fn acquire(&self) -> u32 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Decrement toward zero, saturating: an over-released wrapper stays
    /// dead instead of wrapping around.
    pub(crate) fn release(&self) -> u32 {
        self.0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .map(|previous| previous - 1)
            .unwrap_or(0)
    }

    pub(crate) fn get(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn is_live(&self) -> bool {
        self.get() > 0
    }
}

/// Translate a real-side interface into wrapper space, reusing a live
/// wrapper when the registry already maps the real identity. Returns the
/// wrapped interface and its encoded trace value; unmodeled interfaces pass
/// through untouched and encode as opaque.
pub fn wrap_any(ctx: &Arc<CaptureContext>, obj: AnyInterface) -> (AnyInterface, Value) {
    match obj {
        AnyInterface::Direct3D8(real) => {
            let wrapper = TraceDirect3D8::wrap_reuse(ctx, real);
            let value = Value::Handle(wrapper.object_id());
            (AnyInterface::Direct3D8(wrapper), value)
        }
        AnyInterface::Device8(real) => {
            let wrapper = TraceDevice8::wrap_reuse(ctx, real);
            let value = Value::Handle(wrapper.object_id());
            (AnyInterface::Device8(wrapper), value)
        }
        AnyInterface::SwapChain8(real) => {
            let wrapper = TraceSwapChain8::wrap_reuse(ctx, real);
            let value = Value::Handle(wrapper.object_id());
            (AnyInterface::SwapChain8(wrapper), value)
        }
        AnyInterface::Surface8(real) => {
            let wrapper = TraceSurface8::wrap_reuse(ctx, real);
            let value = Value::Handle(wrapper.object_id());
            (AnyInterface::Surface8(wrapper), value)
        }
        AnyInterface::Opaque(handle) => (AnyInterface::Opaque(handle), Value::Opaque),
    }
}

/// Translate a surface argument from wrapper space to real space.
///
/// An implementation this layer does not recognize is passed through
/// unchanged rather than fabricated, and its record field goes opaque.
pub(crate) fn unwrap_surface(
    surface: &Arc<dyn Direct3DSurface8>,
) -> (Arc<dyn Direct3DSurface8>, Value) {
    match Arc::clone(surface).as_any().downcast::<TraceSurface8>() {
        Ok(wrapper) => {
            let value = Value::Handle(wrapper.object_id());
            (wrapper.real_object(), value)
        }
        Err(_) => (Arc::clone(surface), Value::Opaque),
    }
}

pub(crate) fn opt_rect_value(rect: &Option<Rect>) -> Value {
    match rect {
        Some(rect) => rect.to_value(),
        None => Value::Null,
    }
}

/// Stamp out one wrapper variant: the struct, its constructors and registry
/// interplay, the recorded `IUnknown` methods, and the registry's view of
/// it. The interface trait impl is written per variant.
macro_rules! wrapper_type {
    (
        $(#[$attr:meta])*
        $wrapper:ident: $iface_trait:ident, $tag:expr, $iface_name:literal
    ) => {
        $(#[$attr])*
        pub struct $wrapper {
            ctx: ::std::sync::Arc<$crate::context::CaptureContext>,
            real: ::std::sync::Arc<dyn $crate::traits::$iface_trait>,
            object_id: u64,
            refs: $crate::wrap::RefCount,
        }

        impl $wrapper {
            pub(crate) const TAG: $crate::traits::InterfaceTag = $tag;

            fn new(
                ctx: &::std::sync::Arc<$crate::context::CaptureContext>,
                real: ::std::sync::Arc<dyn $crate::traits::$iface_trait>,
            ) -> ::std::sync::Arc<Self> {
                ::std::sync::Arc::new(Self {
                    object_id: ctx.next_object_id(),
                    ctx: ::std::sync::Arc::clone(ctx),
                    real,
                    refs: $crate::wrap::RefCount::new(),
                })
            }

            /// Wrap a real object that may already be tracked: reuse the
            /// live wrapper (mirroring the reference the real call just
            /// produced) or create and register a fresh one.
            pub fn wrap_reuse(
                ctx: &::std::sync::Arc<$crate::context::CaptureContext>,
                real: ::std::sync::Arc<dyn $crate::traits::$iface_trait>,
            ) -> ::std::sync::Arc<Self> {
                let handle = real.raw_handle();
                let (wrapper, reused) = ctx
                    .registry()
                    .lookup_or_insert(handle, Self::TAG, || Self::new(ctx, real));
                if reused {
                    wrapper.refs.acquire();
                }
                wrapper
            }

            /// Wrap an object a creating call just produced. The handle was
            /// never seen before, so registration expects no live entry.
            pub fn wrap_fresh(
                ctx: &::std::sync::Arc<$crate::context::CaptureContext>,
                real: ::std::sync::Arc<dyn $crate::traits::$iface_trait>,
            ) -> ::std::sync::Arc<Self> {
                let handle = real.raw_handle();
                let wrapper = Self::new(ctx, real);
                ctx.registry().register(handle, Self::TAG, wrapper)
            }

            /// The real-side object this wrapper fronts.
            pub fn real_object(
                &self,
            ) -> ::std::sync::Arc<dyn $crate::traits::$iface_trait> {
                ::std::sync::Arc::clone(&self.real)
            }

            /// Stable trace identifier, assigned once at first wrap.
            pub fn object_id(&self) -> u64 {
                self.object_id
            }

            /// Current mirrored reference count.
            pub fn ref_count(&self) -> u32 {
                self.refs.get()
            }
        }

        impl $crate::traits::Unknown for $wrapper {
            fn raw_handle(&self) -> $crate::traits::RawHandle {
                self.real.raw_handle()
            }

            fn as_any(
                self: ::std::sync::Arc<Self>,
            ) -> ::std::sync::Arc<dyn ::std::any::Any + Send + Sync> {
                self
            }

            fn add_ref(&self) -> u32 {
                let mut call = self
                    .ctx
                    .recorder()
                    .begin_call(concat!($iface_name, "::AddRef"));
                call.arg(
                    "this",
                    $crate::models::value::Value::Handle(self.object_id),
                );
                let count = self.real.add_ref();
                self.refs.acquire();
                call.ret($crate::models::value::Value::UInt(count.into()));
                count
            }

            fn release(&self) -> u32 {
                let mut call = self
                    .ctx
                    .recorder()
                    .begin_call(concat!($iface_name, "::Release"));
                call.arg(
                    "this",
                    $crate::models::value::Value::Handle(self.object_id),
                );
                // Forward first: the wrapper must never be torn down before
                // the real release it mirrors.
                let count = self.real.release();
                if self.refs.release() == 0 {
                    self.ctx
                        .registry()
                        .unregister(self.real.raw_handle(), Self::TAG, self.object_id);
                }
                call.ret($crate::models::value::Value::UInt(count.into()));
                count
            }

            fn query_interface(
                &self,
                iid: &$crate::models::guid::Guid,
            ) -> ::std::result::Result<
                $crate::traits::AnyInterface,
                $crate::models::d3d8::HResult,
            > {
                let mut call = self
                    .ctx
                    .recorder()
                    .begin_call(concat!($iface_name, "::QueryInterface"));
                call.arg(
                    "this",
                    $crate::models::value::Value::Handle(self.object_id),
                );
                call.arg("riid", $crate::models::value::Value::Uuid(*iid));
                match self.real.query_interface(iid) {
                    Ok(obj) => {
                        if let $crate::traits::AnyInterface::Opaque(_) = obj {
                            log::warn!(
                                concat!(
                                    $iface_name,
                                    "::QueryInterface: unknown interface {}, passing through unwrapped"
                                ),
                                $crate::models::guid::name_for(iid)
                            );
                        }
                        let (wrapped, value) = $crate::wrap::wrap_any(&self.ctx, obj);
                        call.out("ppvObj", value);
                        call.ret($crate::models::d3d8::HResult::OK.to_value());
                        Ok(wrapped)
                    }
                    Err(hr) => {
                        call.ret(hr.to_value());
                        Err(hr)
                    }
                }
            }
        }

        impl $crate::registry::Wrapped for $wrapper {
            fn object_id(&self) -> u64 {
                self.object_id
            }

            fn is_live(&self) -> bool {
                self.refs.is_live()
            }

            fn as_any_arc(
                self: ::std::sync::Arc<Self>,
            ) -> ::std::sync::Arc<dyn ::std::any::Any + Send + Sync> {
                self
            }
        }
    };
}

pub(crate) use wrapper_type;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ref_count_saturates_at_zero() {
        let refs = RefCount::new();
        assert_eq!(refs.get(), 1);
        assert_eq!(refs.acquire(), 2);
        assert_eq!(refs.release(), 1);
        assert_eq!(refs.release(), 0);
        assert!(!refs.is_live());
        assert_eq!(refs.release(), 0);
    }
}
