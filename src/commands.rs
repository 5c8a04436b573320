//! Trace commands
//!
//! Glue between the configuration and a trace session.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use gfxtrace_core::{AppConfig, CaptureConfig, Event, EventBus, TraceTarget};
use gfxtrace_device_bridge::{AdbClient, AdbDevice};
use gfxtrace_tracer::{FileCaptureSink, GfxTracer, Options, SessionOutcome, SessionSettings};
use tracing::info;

/// Trace one application on one device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceCommand {
    /// Device serial
    pub serial: String,
    /// Application package
    pub package: String,
    /// Activity to launch; `None` attaches to the running process
    pub activity: Option<String>,
    /// Capture options
    pub options: Options,
}

impl TraceCommand {
    /// Build the command for a configured target
    pub fn from_target(target: &TraceTarget, capture: &CaptureConfig) -> Self {
        let trace_name = target
            .trace_name
            .clone()
            .unwrap_or_else(|| target.package.clone());
        Self {
            serial: target.serial.clone(),
            package: target.package.clone(),
            activity: target.activity.clone().filter(|a| !a.is_empty()),
            options: Options::from_config(trace_name, capture),
        }
    }

    /// Run the trace to completion, stopping early on Ctrl-C
    ///
    /// Session status is published on `bus`, followed by
    /// [`Event::CaptureReady`] when a capture file was kept.
    pub async fn execute(&self, config: &AppConfig, bus: Arc<EventBus>) -> Result<SessionOutcome> {
        let sdk = config
            .get_sdk_path()
            .ok_or_else(|| anyhow!("Android SDK not found; set android.sdk_path or ANDROID_HOME"))?;
        let client = Arc::new(AdbClient::new(sdk));
        let device = Arc::new(AdbDevice::connect(client, &self.serial).await?);
        bus.emit(Event::DeviceConnected {
            serial: self.serial.clone(),
        });

        let sink = FileCaptureSink::create(config.capture.resolve_output_dir(), &self.options.trace_name).await?;
        let settings = SessionSettings::from(&config.tracer);

        let tracer = match &self.activity {
            Some(activity) => {
                info!("Tracing {}/{} on {}", self.package, activity, self.serial);
                GfxTracer::launch(
                    device,
                    Box::new(sink),
                    self.package.clone(),
                    activity.clone(),
                    self.options.clone(),
                    settings,
                    bus.clone(),
                )
            }
            None => {
                info!("Tracing running {} on {}", self.package, self.serial);
                GfxTracer::listen(
                    device,
                    Box::new(sink),
                    self.package.clone(),
                    self.options.clone(),
                    settings,
                    bus.clone(),
                )
            }
        };

        let stop = tracer.stop_handle();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, stopping trace");
                stop.stop();
            }
        });

        let outcome = tracer.join().await;
        interrupt.abort();

        if let Some(path) = outcome.capture.as_ref().and_then(|c| c.path.clone()) {
            bus.emit(Event::CaptureReady(path));
        }
        Ok(outcome)
    }
}
