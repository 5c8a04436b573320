//! GfxTrace Tracer - GAPII trace transport
//!
//! Connects to the graphics interceptor (GAPII) inside a traced
//! application and streams what it records into a capture sink.
//!
//! ```text
//! launch/listen -> forward tcp:9286 -> connect -> header -> read loop -> finalize | cancel
//! ```

pub mod capture;
pub mod error;
pub mod header;
pub mod listener;
pub mod tracer;

pub use capture::{Capture, CaptureError, CaptureSink, FileCaptureSink, MemoryCapture, MemoryCaptureSink};
pub use error::{Result, TraceError};
pub use header::{ConnectionHeader, Options, HEADER_SIZE, PROTOCOL_VERSION};
pub use listener::{LogListener, TraceListener};
pub use tracer::{GfxTracer, SessionOutcome, SessionSettings, StopHandle};
