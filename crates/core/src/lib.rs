//! GfxTrace Core - Configuration, errors and events
//! 
//! This crate holds the pieces every other GfxTrace crate leans on:
//! the application configuration, the top-level error type and the
//! event bus used to hand trace notifications to interested parties.

pub mod config;
pub mod events;
pub mod error;

pub use config::{AppConfig, CaptureConfig, TracerConfig, TraceTarget};
pub use events::{Event, EventBus, EventSubscription};
pub use error::{GfxTraceError, Result};

/// GfxTrace version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "GfxTrace";
