use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::models::error::CaptureError;
use crate::registry::IdentityRegistry;
use crate::trace::{TraceSink, TraceWriter};

/// Process-scoped capture state: the call recorder, the identity registry,
/// and the trace-id allocator.
///
/// Explicitly constructed by the module proxy and shared by every wrapper;
/// there are no hidden globals in the engine. Init order: load the real
/// library, open the trace, then wrap the first object. Teardown: close the
/// trace once wrappers have quiesced; records arriving later are discarded,
/// forwarding is unaffected.
pub struct CaptureContext {
    recorder: TraceWriter,
    registry: IdentityRegistry,
    next_object_id: AtomicU64,
}

impl CaptureContext {
    pub fn new(sink: Box<dyn TraceSink>) -> Arc<Self> {
        Arc::new(Self {
            recorder: TraceWriter::new(sink),
            registry: IdentityRegistry::new(),
            next_object_id: AtomicU64::new(1),
        })
    }

    /// Write the trace header. Idempotent while the document is open.
    pub fn open(&self) -> Result<(), CaptureError> {
        self.recorder.open()
    }

    /// Write the trace trailer and release the sink. Idempotent.
    pub fn close(&self) -> Result<(), CaptureError> {
        self.recorder.close()
    }

    pub fn recorder(&self) -> &TraceWriter {
        &self.recorder
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    /// Allocate the stable trace identifier for a new wrapper.
    pub fn next_object_id(&self) -> u64 {
        self.next_object_id.fetch_add(1, Ordering::SeqCst)
    }
}
