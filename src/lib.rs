//! GfxTrace - Graphics trace capture for Android
//!
//! Captures the command stream of an Android application through the
//! GAPII interceptor and stores it as a `.gfxtrace` file.
//!
//! ## Architecture
//!
//! GfxTrace is organized into specialized crates:
//!
//! - `gfxtrace-core`: Configuration, errors and the event bus
//! - `gfxtrace-rpclib`: Schema-driven binary object codec
//! - `gfxtrace-service`: Service entities built on the codec
//! - `gfxtrace-device-bridge`: ADB device-command channel
//! - `gfxtrace-tracer`: GAPII connection, capture sinks and trace sessions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod commands;

// Re-export main components for library usage
pub use gfxtrace_core as core;
pub use gfxtrace_device_bridge as device;
pub use gfxtrace_rpclib as rpclib;
pub use gfxtrace_service as service;
pub use gfxtrace_tracer as tracer;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::commands::TraceCommand;
    pub use gfxtrace_core::{AppConfig, Event, EventBus};
    pub use gfxtrace_device_bridge::{AdbClient, AdbDevice, DeviceChannel};
    pub use gfxtrace_rpclib::{decode_object, encode_object, BinaryObject, BinaryType, Namespace};
    pub use gfxtrace_tracer::{
        CaptureSink, FileCaptureSink, GfxTracer, Options, SessionOutcome, SessionSettings,
        TraceListener,
    };
}
