//! GfxTrace
//!
//! Loads the configuration, registers the codec types and runs the trace
//! target named in the `[trace]` section of the config file.

use std::sync::Arc;
use std::thread;

use anyhow::Result;
use gfxtrace::commands::TraceCommand;
use gfxtrace::core::{AppConfig, Event, EventBus, EventSubscription, APP_NAME, VERSION};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().await?;
    init_logging(&config.log_level)?;

    info!("{} v{} starting...", APP_NAME, VERSION);

    gfxtrace::service::register_all()?;
    info!(
        "Registered {} codec types",
        gfxtrace::rpclib::Namespace::global().len()
    );

    let Some(target) = config.trace.clone() else {
        info!(
            "No trace target configured; add a [trace] section to {:?}",
            AppConfig::config_file()
        );
        return Ok(());
    };
    if target.serial.is_empty() || target.package.is_empty() {
        warn!("The [trace] section needs both serial and package");
        return Ok(());
    }

    let bus = Arc::new(EventBus::new());
    let logger = spawn_event_logger(bus.subscribe());

    let command = TraceCommand::from_target(&target, &config.capture);
    let result = command.execute(&config, bus.clone()).await;

    bus.emit(Event::Shutdown);
    if logger.join().is_err() {
        error!("Event logger panicked");
    }

    let outcome = result?;
    info!("Outcome: {}", serde_json::to_string(&outcome)?);
    match outcome.error {
        Some(message) => Err(anyhow::anyhow!(message)),
        None => Ok(()),
    }
}

fn init_logging(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Log trace events until shutdown
fn spawn_event_logger(events: EventSubscription) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for event in events.iter() {
            match event {
                Event::DeviceConnected { serial } => info!("Device {} connected", serial),
                Event::TraceAction(action) => info!("{}", action),
                Event::TraceProgress(bytes) => info!("Captured {} KiB", bytes / 1024),
                Event::TraceStopped => info!("Trace stopped"),
                Event::TraceError(message) => error!("Trace failed: {}", message),
                Event::CaptureReady(path) => info!("Capture ready: {}", path.display()),
                Event::Shutdown => break,
            }
        }
    })
}
