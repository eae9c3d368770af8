//! Bidirectional bookkeeping between real objects and their wrappers.
//!
//! The registry is the source of truth for "is this handle already
//! wrapped". It tracks, it does not keep alive: entries hold `Weak`
//! references, and a wrapper whose mirrored reference count has reached
//! zero counts as absent even while its allocation lingers. All operations
//! share one mutex, so a concurrent existence check and creation can never
//! race into two wrappers for the same key.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::traits::{InterfaceTag, RawHandle};

/// What the registry needs to know about a wrapper it tracks.
pub trait Wrapped: Send + Sync + 'static {
    /// The stable trace identifier assigned at first wrap.
    fn object_id(&self) -> u64;

    /// False once the mirrored reference count has reached zero.
    fn is_live(&self) -> bool;

    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

struct Entry {
    object_id: u64,
    wrapper: Weak<dyn Wrapped>,
}

impl Entry {
    fn new<W: Wrapped>(wrapper: &Arc<W>) -> Self {
        Self {
            object_id: wrapper.object_id(),
            wrapper: Arc::downgrade(wrapper) as Weak<dyn Wrapped>,
        }
    }

    /// Upgrade to a live wrapper of the expected type, or `None`.
    fn live<W: Wrapped>(&self) -> Option<Arc<W>> {
        let wrapper = self.wrapper.upgrade()?;
        if !wrapper.is_live() {
            return None;
        }
        wrapper.as_any_arc().downcast::<W>().ok()
    }
}

/// The identity map: `(RealHandle, InterfaceTag)` to live wrapper.
#[derive(Default)]
pub struct IdentityRegistry {
    entries: Mutex<HashMap<(RawHandle, InterfaceTag), Entry>>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The wrapper currently registered for this key, if one is live.
    pub fn lookup<W: Wrapped>(&self, handle: RawHandle, tag: InterfaceTag) -> Option<Arc<W>> {
        self.entries.lock().get(&(handle, tag))?.live()
    }

    /// Atomic check-then-create: returns the live wrapper for the key, or
    /// registers and returns the one produced by `make`. The second tuple
    /// element is true when an existing wrapper was reused.
    pub fn lookup_or_insert<W, F>(
        &self,
        handle: RawHandle,
        tag: InterfaceTag,
        make: F,
    ) -> (Arc<W>, bool)
    where
        W: Wrapped,
        F: FnOnce() -> Arc<W>,
    {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(&(handle, tag)).and_then(|e| e.live::<W>()) {
            return (existing, true);
        }
        let wrapper = make();
        entries.insert((handle, tag), Entry::new(&wrapper));
        (wrapper, false)
    }

    /// Register a freshly created wrapper. A live entry already present for
    /// the key is a logic error in the wrap paths; it is reported and the
    /// existing wrapper is returned rather than corrupting the map.
    pub fn register<W: Wrapped>(
        &self,
        handle: RawHandle,
        tag: InterfaceTag,
        wrapper: Arc<W>,
    ) -> Arc<W> {
        match self.try_register(handle, tag, &wrapper) {
            Ok(()) => wrapper,
            Err(e) => {
                log::error!("{e}");
                self.lookup(handle, tag).unwrap_or(wrapper)
            }
        }
    }

    /// Strict registration, failing on a live duplicate. Dead entries are
    /// replaced silently: real allocators reuse addresses.
    pub fn try_register<W: Wrapped>(
        &self,
        handle: RawHandle,
        tag: InterfaceTag,
        wrapper: &Arc<W>,
    ) -> Result<(), CaptureError> {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(&(handle, tag)) {
            if existing.live::<W>().is_some() {
                return Err(CaptureError::DuplicateIdentity {
                    handle,
                    interface: tag.interface_name(),
                });
            }
        }
        entries.insert((handle, tag), Entry::new(wrapper));
        Ok(())
    }

    /// Remove the entry for this key, but only if it still belongs to the
    /// wrapper identified by `object_id` — a dying wrapper must not evict
    /// its replacement. Absent or mismatched entries are left alone.
    pub fn unregister(&self, handle: RawHandle, tag: InterfaceTag, object_id: u64) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get(&(handle, tag)) {
            if entry.object_id == object_id {
                entries.remove(&(handle, tag));
            }
        }
    }

    /// Number of entries currently held (live or not).
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct TestWrapper {
        id: u64,
        live: AtomicBool,
    }

    impl TestWrapper {
        fn new(id: u64) -> Arc<Self> {
            Arc::new(Self {
                id,
                live: AtomicBool::new(true),
            })
        }

        fn kill(&self) {
            self.live.store(false, Ordering::SeqCst);
        }
    }

    impl Wrapped for TestWrapper {
        fn object_id(&self) -> u64 {
            self.id
        }

        fn is_live(&self) -> bool {
            self.live.load(Ordering::SeqCst)
        }

        fn as_any_arc(self: Arc<Self>) -> Arc<dyn std::any::Any + Send + Sync> {
            self
        }
    }

    const TAG: InterfaceTag = InterfaceTag::Surface8;

    #[test]
    fn lookup_returns_registered_wrapper() {
        let registry = IdentityRegistry::new();
        let wrapper = registry.register(0x10, TAG, TestWrapper::new(1));
        let found: Arc<TestWrapper> = registry.lookup(0x10, TAG).unwrap();
        assert!(Arc::ptr_eq(&wrapper, &found));
        assert!(registry.lookup::<TestWrapper>(0x10, InterfaceTag::Device8).is_none());
    }

    #[test]
    fn duplicate_live_registration_is_rejected() {
        let registry = IdentityRegistry::new();
        let first = registry.register(0x10, TAG, TestWrapper::new(1));
        let err = registry
            .try_register(0x10, TAG, &TestWrapper::new(2))
            .unwrap_err();
        assert_eq!(
            err,
            CaptureError::DuplicateIdentity {
                handle: 0x10,
                interface: "IDirect3DSurface8",
            }
        );

        // The lenient path keeps the original wrapper.
        let kept = registry.register(0x10, TAG, TestWrapper::new(3));
        assert!(Arc::ptr_eq(&first, &kept));
    }

    #[test]
    fn dead_entries_count_as_absent_and_are_replaceable() {
        let registry = IdentityRegistry::new();
        let first = registry.register(0x10, TAG, TestWrapper::new(1));
        first.kill();

        assert!(registry.lookup::<TestWrapper>(0x10, TAG).is_none());
        registry.try_register(0x10, TAG, &TestWrapper::new(2)).unwrap();
    }

    #[test]
    fn unregister_is_idempotent_and_generation_checked() {
        let registry = IdentityRegistry::new();
        let first = registry.register(0x10, TAG, TestWrapper::new(1));
        first.kill();
        let _second = registry.register(0x10, TAG, TestWrapper::new(2));

        // The dying first wrapper unregisters late; the replacement stays.
        registry.unregister(0x10, TAG, 1);
        assert!(registry.lookup::<TestWrapper>(0x10, TAG).is_some());

        registry.unregister(0x10, TAG, 2);
        assert!(registry.lookup::<TestWrapper>(0x10, TAG).is_none());
        registry.unregister(0x10, TAG, 2);
        assert!(registry.is_empty());
    }

    #[test]
    fn lookup_or_insert_reuses_live_wrapper() {
        let registry = IdentityRegistry::new();
        let (first, reused) = registry.lookup_or_insert(0x10, TAG, || TestWrapper::new(1));
        assert!(!reused);
        let (second, reused) = registry.lookup_or_insert(0x10, TAG, || TestWrapper::new(2));
        assert!(reused);
        assert!(Arc::ptr_eq(&first, &second));
    }
}
