use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::models::value::{escape_into, Value};

use super::record::CallRecord;
use super::sink::TraceSink;

/// Document format version written into the header.
pub const TRACE_VERSION: u32 = 1;

enum DocState {
    /// Constructed, header not yet written.
    Pending(Box<dyn TraceSink>),
    /// Header written, accepting call blocks.
    Open(Box<dyn TraceSink>),
    /// Trailer written; nothing may be written again.
    Closed,
}

/// Thread-safe serializer for the trace document.
///
/// A call is recorded through a [`CallBuilder`] token: inputs are encoded
/// into it before the real call is delegated, outputs after, and the
/// finished block is appended to the sink as one atomic unit when the token
/// is dropped. No lock is held while the real library call runs; the sink
/// mutex is taken only for the brief serialization of a completed record,
/// so concurrent calls interleave at whole-block granularity only.
pub struct TraceWriter {
    state: Mutex<DocState>,
    next_call_no: AtomicU64,
    calls_written: AtomicU64,
}

impl TraceWriter {
    pub fn new(sink: Box<dyn TraceSink>) -> Self {
        Self {
            state: Mutex::new(DocState::Pending(sink)),
            next_call_no: AtomicU64::new(1),
            calls_written: AtomicU64::new(0),
        }
    }

    /// Write the document header. Runs once; calling again while open is a
    /// no-op, and reopening a closed document is an error.
    pub fn open(&self) -> Result<(), CaptureError> {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, DocState::Closed) {
            DocState::Pending(mut sink) => {
                let header = format!("<trace version=\"{TRACE_VERSION}\">\n");
                sink.append(header.as_bytes())?;
                sink.flush()?;
                *state = DocState::Open(sink);
                Ok(())
            }
            DocState::Open(sink) => {
                *state = DocState::Open(sink);
                Ok(())
            }
            DocState::Closed => Err(CaptureError::TraceClosed),
        }
    }

    /// Write the trailer and release the sink. Runs once; further calls are
    /// no-ops. After this, records are silently discarded.
    pub fn close(&self) -> Result<(), CaptureError> {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, DocState::Closed) {
            DocState::Open(mut sink) => {
                sink.append(b"</trace>\n")?;
                sink.flush()?;
                Ok(())
            }
            // Never opened or already closed: nothing left to finalize.
            DocState::Pending(_) | DocState::Closed => Ok(()),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(&*self.state.lock(), DocState::Open(_))
    }

    /// Number of call blocks emitted so far.
    pub fn calls_written(&self) -> u64 {
        self.calls_written.load(Ordering::SeqCst)
    }

    /// Start recording one call. The returned token buffers the record;
    /// dropping it emits the block.
    pub fn begin_call(&self, name: &'static str) -> CallBuilder<'_> {
        let no = self.next_call_no.fetch_add(1, Ordering::SeqCst);
        CallBuilder {
            writer: self,
            record: Some(CallRecord::new(no, name)),
        }
    }

    fn emit(&self, record: CallRecord) {
        let mut text = String::with_capacity(128);
        render_block(&record, &mut text);

        let mut state = self.state.lock();
        if let DocState::Open(sink) = &mut *state {
            if let Err(e) = sink.append(text.as_bytes()) {
                log::error!("dropping call record {}: {}", record.no, e);
                return;
            }
            let _ = sink.flush();
            self.calls_written.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Token for one in-flight call record (`begin_call` .. emission).
///
/// Parameter order is preserved; the block reaches the sink when the token
/// drops, after the wrapper has filled in outputs and the return value.
pub struct CallBuilder<'w> {
    writer: &'w TraceWriter,
    record: Option<CallRecord>,
}

impl CallBuilder<'_> {
    pub fn call_no(&self) -> u64 {
        self.record.as_ref().map(|r| r.no).unwrap_or(0)
    }

    /// Record one input parameter.
    pub fn arg(&mut self, name: &'static str, value: Value) {
        if let Some(record) = &mut self.record {
            record.args.push(super::record::Param { name, value });
        }
    }

    /// Record one output parameter.
    pub fn out(&mut self, name: &'static str, value: Value) {
        if let Some(record) = &mut self.record {
            record.outs.push(super::record::Param { name, value });
        }
    }

    /// Record the return value.
    pub fn ret(&mut self, value: Value) {
        if let Some(record) = &mut self.record {
            record.ret = Some(value);
        }
    }
}

impl Drop for CallBuilder<'_> {
    fn drop(&mut self) {
        if let Some(record) = self.record.take() {
            self.writer.emit(record);
        }
    }
}

fn render_block(record: &CallRecord, out: &mut String) {
    out.push_str(&format!(
        "<call no=\"{}\" name=\"{}\">\n",
        record.no, record.name
    ));
    for param in &record.args {
        render_param("arg", param, out);
    }
    for param in &record.outs {
        render_param("out", param, out);
    }
    if let Some(ret) = &record.ret {
        out.push_str(&format!("<ret type=\"{}\">", ret.type_tag()));
        ret.render(out);
        out.push_str("</ret>\n");
    }
    out.push_str("</call>\n");
}

fn render_param(kind: &str, param: &super::record::Param, out: &mut String) {
    out.push_str(&format!("<{kind} name=\""));
    escape_into(param.name, out);
    out.push_str(&format!("\" type=\"{}\">", param.value.type_tag()));
    param.value.render(out);
    out.push_str(&format!("</{kind}>\n"));
}
