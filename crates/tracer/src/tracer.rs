//! GAPII Trace Session
//!
//! Drives one capture: optionally launches the application, forwards the
//! agent's abstract socket, sends the [`ConnectionHeader`] and copies the
//! stream into a [`CaptureSink`] until the agent closes it or the session
//! is stopped.
//!
//! Each session runs on its own tokio task. The stop flag is the only
//! state shared with the caller.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gfxtrace_core::TracerConfig;
use gfxtrace_device_bridge::{AdbError, DeviceAbi, DeviceChannel, ABI_PROPERTY};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, error, info, warn};

use crate::capture::{Capture, CaptureSink};
use crate::error::{Result, TraceError};
use crate::header::{ConnectionHeader, Options};
use crate::listener::TraceListener;

pub const ACTION_LAUNCHING: &str = "Launching application...";
pub const ACTION_INSTALLING: &str = "Installing trace library...";
pub const ACTION_CONNECTING: &str = "Connecting to application...";
pub const ACTION_TRACING: &str = "Tracing...";

/// Runtime tuning of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub host: String,
    pub port: u16,
    pub abstract_socket: String,
    /// Bounds each read, and so the time a stop request can go unnoticed
    pub read_timeout: Duration,
    pub connect_timeout: Duration,
    pub retry_delay: Duration,
    /// Reconnects allowed while no data has been received
    pub max_retries: u32,
    pub progress_interval: Duration,
    pub buffer_size: usize,
}

impl From<&TracerConfig> for SessionSettings {
    fn from(config: &TracerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            abstract_socket: config.abstract_socket.clone(),
            read_timeout: Duration::from_millis(config.read_timeout_ms),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            max_retries: config.max_retries,
            progress_interval: Duration::from_millis(config.progress_interval_ms),
            buffer_size: config.buffer_size.max(1),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&TracerConfig::default())
    }
}

/// How a session ended
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionOutcome {
    /// Bytes received from the agent
    pub bytes: u64,
    /// The kept capture, if any data arrived and finalizing succeeded
    pub capture: Option<Capture>,
    pub connection_attempts: u32,
    /// Message of the error reported to the listener, if the session failed
    pub error: Option<String>,
}

impl SessionOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

enum Target {
    Launch {
        device: Arc<dyn DeviceChannel>,
        package: String,
        activity: String,
    },
    Attach {
        device: Arc<dyn DeviceChannel>,
        package: String,
    },
    /// Agent already reachable at the configured address
    Direct,
}

/// Byte stream to the agent
trait AgentStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> AgentStream for T {}

/// Opens connections to the agent
#[async_trait]
trait Dialer: Send + Sync {
    async fn dial(&self, host: &str, port: u16) -> io::Result<Box<dyn AgentStream>>;
}

struct TcpDialer;

#[async_trait]
impl Dialer for TcpDialer {
    async fn dial(&self, host: &str, port: u16) -> io::Result<Box<dyn AgentStream>> {
        Ok(Box::new(TcpStream::connect((host, port)).await?))
    }
}

/// Stops a session without owning its [`GfxTracer`]
#[derive(Debug, Clone)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Handle to a running trace session
pub struct GfxTracer {
    stopped: Arc<AtomicBool>,
    task: JoinHandle<SessionOutcome>,
}

impl GfxTracer {
    /// Launch `package/activity` in debug mode and trace it
    pub fn launch(
        device: Arc<dyn DeviceChannel>,
        sink: Box<dyn CaptureSink>,
        package: impl Into<String>,
        activity: impl Into<String>,
        options: Options,
        settings: SessionSettings,
        listener: Arc<dyn TraceListener>,
    ) -> Self {
        let target = Target::Launch {
            device,
            package: package.into(),
            activity: activity.into(),
        };
        Self::spawn(target, sink, options, settings, listener, Arc::new(TcpDialer))
    }

    /// Trace an already running `package`
    pub fn listen(
        device: Arc<dyn DeviceChannel>,
        sink: Box<dyn CaptureSink>,
        package: impl Into<String>,
        options: Options,
        settings: SessionSettings,
        listener: Arc<dyn TraceListener>,
    ) -> Self {
        let target = Target::Attach {
            device,
            package: package.into(),
        };
        Self::spawn(target, sink, options, settings, listener, Arc::new(TcpDialer))
    }

    /// Trace an agent listening at `settings.host:settings.port`, no device setup
    pub fn connect(
        sink: Box<dyn CaptureSink>,
        options: Options,
        settings: SessionSettings,
        listener: Arc<dyn TraceListener>,
    ) -> Self {
        Self::spawn(Target::Direct, sink, options, settings, listener, Arc::new(TcpDialer))
    }

    fn spawn(
        target: Target,
        sink: Box<dyn CaptureSink>,
        options: Options,
        settings: SessionSettings,
        listener: Arc<dyn TraceListener>,
        dialer: Arc<dyn Dialer>,
    ) -> Self {
        let stopped = Arc::new(AtomicBool::new(false));
        let session = Session {
            options,
            settings,
            listener,
            dialer,
            stopped: stopped.clone(),
            total: 0,
            attempts: 0,
        };
        let task = tokio::spawn(session.run(target, sink));
        Self { stopped, task }
    }

    /// Ask the session to stop
    ///
    /// Only sets a flag; the session notices within one read timeout. Safe
    /// to call repeatedly or after the session ended.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            stopped: self.stopped.clone(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the session to end
    pub async fn join(self) -> SessionOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Trace session task failed: {}", e);
                SessionOutcome {
                    error: Some(format!("trace session task failed: {}", e)),
                    ..Default::default()
                }
            }
        }
    }
}

enum Block {
    Data(usize),
    /// Nothing arrived within the read timeout
    Idle,
    Closed,
}

struct Session {
    options: Options,
    settings: SessionSettings,
    listener: Arc<dyn TraceListener>,
    dialer: Arc<dyn Dialer>,
    stopped: Arc<AtomicBool>,
    total: u64,
    attempts: u32,
}

impl Session {
    async fn run(mut self, target: Target, mut sink: Box<dyn CaptureSink>) -> SessionOutcome {
        let result = self.drive(&target, sink.as_mut()).await;

        let capture = if self.total > 0 {
            match sink.finalize().await {
                Ok(capture) => Some(capture),
                Err(e) => {
                    error!("Failed to finalize capture {}: {}", self.options.trace_name, e);
                    None
                }
            }
        } else {
            if let Err(e) = sink.cancel().await {
                warn!("Failed to discard empty capture {}: {}", self.options.trace_name, e);
            }
            None
        };

        let error = match result {
            Ok(()) => {
                info!("Trace {} finished with {} bytes", self.options.trace_name, self.total);
                self.listener.on_stopped();
                None
            }
            Err(e) => {
                error!("Trace {} failed: {}", self.options.trace_name, e);
                self.listener.on_error(&e);
                Some(e.to_string())
            }
        };

        SessionOutcome {
            bytes: self.total,
            capture,
            connection_attempts: self.attempts,
            error,
        }
    }

    async fn drive(&mut self, target: &Target, sink: &mut dyn CaptureSink) -> Result<()> {
        match target {
            Target::Launch {
                device,
                package,
                activity,
            } => {
                self.listener.on_action(ACTION_LAUNCHING);
                device.root().await?;
                let command = format!("am start -S -D -W -n {}/{}", package, activity);
                let output = device.execute_shell_command(&command).await?;
                if let Some(line) = output.lines().find(|l| l.starts_with("Error")) {
                    return Err(AdbError::CommandFailed(line.to_string()).into());
                }
                self.attach(device.as_ref(), package, sink).await
            }
            Target::Attach { device, package } => self.attach(device.as_ref(), package, sink).await,
            Target::Direct => self.capture(sink).await,
        }
    }

    async fn attach(
        &mut self,
        device: &dyn DeviceChannel,
        package: &str,
        sink: &mut dyn CaptureSink,
    ) -> Result<()> {
        self.listener.on_action(ACTION_INSTALLING);
        let api = device.get_version().await?;
        let abi: DeviceAbi = device.get_property(ABI_PROPERTY).await?.parse()?;
        info!(
            "Attaching to {} on {} (API {}, {})",
            package,
            device.serial(),
            api,
            abi
        );

        let port = self.settings.port;
        let socket = self.settings.abstract_socket.clone();
        device.forward_port(port, &socket).await?;

        let result = self.capture(sink).await;

        if let Err(e) = device.remove_forward(port, &socket).await {
            warn!("Failed to remove forward tcp:{} -> {}: {}", port, socket, e);
        }
        result
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Longest a blocking step may run before the stop flag is checked again
    fn poll_interval(&self) -> Duration {
        self.settings.read_timeout.max(Duration::from_millis(1))
    }

    /// Sleep for `duration`, returning early once stopped
    async fn pause(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while !self.is_stopped() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            sleep(remaining.min(self.poll_interval())).await;
        }
    }

    /// Copy the agent's stream into `sink`
    async fn capture(&mut self, sink: &mut dyn CaptureSink) -> Result<()> {
        self.listener.on_action(ACTION_CONNECTING);

        let mut buffer = vec![0u8; self.settings.buffer_size.max(1)];
        let mut retries_left = self.settings.max_retries;
        let mut last_progress: Option<Instant> = None;
        let mut stream: Option<Box<dyn AgentStream>> = None;

        while !self.is_stopped() {
            if stream.is_none() {
                match self.open().await {
                    Ok(s) => stream = Some(s),
                    Err(e) if e.is_retryable() => debug!("{}", e),
                    Err(e) => return Err(e),
                }
                if self.is_stopped() {
                    break;
                }
            }

            let block = match stream.as_mut() {
                None => Block::Closed,
                Some(s) => match self.read_block(s.as_mut(), &mut buffer).await {
                    Ok(block) => block,
                    Err(e) if self.total == 0 && retries_left > 0 => {
                        debug!("{}", e);
                        Block::Closed
                    }
                    Err(e) => return Err(e),
                },
            };

            match block {
                Block::Data(len) => {
                    sink.append(&buffer[..len]).await?;
                    if self.total == 0 {
                        info!("Receiving trace data");
                        self.listener.on_action(ACTION_TRACING);
                    }
                    self.total += len as u64;

                    let now = Instant::now();
                    let due = last_progress
                        .map_or(true, |t| now.duration_since(t) >= self.settings.progress_interval);
                    if due {
                        self.listener.on_progress(self.total);
                        last_progress = Some(now);
                    }
                }
                Block::Idle => {}
                Block::Closed => {
                    stream = None;
                    if self.total == 0 && retries_left > 0 {
                        retries_left -= 1;
                        debug!("No data yet, retrying ({} attempts left)", retries_left);
                        self.pause(self.settings.retry_delay).await;
                    } else {
                        if self.total == 0 {
                            info!("Gave up after {} connection attempts", self.attempts);
                        }
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Connect and send the header
    ///
    /// The connect is bounded by `connect_timeout` and abandoned early once
    /// the session is stopped.
    async fn open(&mut self) -> Result<Box<dyn AgentStream>> {
        self.attempts += 1;
        let host = self.settings.host.as_str();
        let port = self.settings.port;
        debug!("Connecting to {}:{} (attempt {})", host, port, self.attempts);

        let deadline = Instant::now() + self.settings.connect_timeout;
        let mut connect = self.dialer.dial(host, port);
        let mut stream = loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TraceError::Connection(format!(
                    "connect to {}:{} timed out after {:?}",
                    host, port, self.settings.connect_timeout
                )));
            }
            match timeout(remaining.min(self.poll_interval()), &mut connect).await {
                Ok(Ok(stream)) => break stream,
                Ok(Err(e)) => {
                    return Err(TraceError::Connection(format!(
                        "connect to {}:{} failed: {}",
                        host, port, e
                    )))
                }
                Err(_) if self.is_stopped() => {
                    return Err(TraceError::Connection(format!(
                        "connect to {}:{} abandoned, session stopped",
                        host, port
                    )))
                }
                Err(_) => {}
            }
        };

        let header = ConnectionHeader::from_options(&self.options).to_bytes();
        stream
            .write_all(&header)
            .await
            .map_err(|e| TraceError::Protocol(format!("failed to send header: {}", e)))?;
        stream
            .flush()
            .await
            .map_err(|e| TraceError::Protocol(format!("failed to send header: {}", e)))?;
        debug!("Sent connection header");
        Ok(stream)
    }

    async fn read_block(&self, stream: &mut dyn AgentStream, buffer: &mut [u8]) -> Result<Block> {
        match timeout(self.settings.read_timeout, stream.read(buffer)).await {
            Err(_) => Ok(Block::Idle),
            Ok(Ok(0)) => Ok(Block::Closed),
            Ok(Ok(len)) => Ok(Block::Data(len)),
            Ok(Err(e)) => Err(TraceError::Connection(format!("read failed: {}", e))),
        }
    }
}
