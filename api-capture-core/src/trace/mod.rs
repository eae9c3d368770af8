pub mod reader;
mod record;
mod sink;
mod writer;

pub use record::{CallRecord, Param};
pub use sink::{FileSink, MemorySink, TraceSink};
pub use writer::{CallBuilder, TraceWriter, TRACE_VERSION};
