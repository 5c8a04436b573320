//! Capture Sinks
//!
//! Where the bytes streamed from the agent end up. A sink is appended to
//! by exactly one session, then either finalized into a [`Capture`] or
//! cancelled.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info};

/// Extension of finished capture files
pub const CAPTURE_EXTENSION: &str = "gfxtrace";

/// Capture errors
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Capture I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Capture {0} is already finished")]
    Finished(String),
}

/// A finalized capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Capture {
    pub name: String,
    /// Location on disk, for file-backed captures
    pub path: Option<PathBuf>,
    /// Size in bytes
    pub size: u64,
}

/// Destination of a capture stream
#[async_trait]
pub trait CaptureSink: Send {
    /// Append bytes in the order they were received
    async fn append(&mut self, bytes: &[u8]) -> Result<(), CaptureError>;

    /// Keep the capture
    async fn finalize(self: Box<Self>) -> Result<Capture, CaptureError>;

    /// Discard the capture
    async fn cancel(self: Box<Self>) -> Result<(), CaptureError>;

    /// Bytes appended so far
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Writes `<name>.gfxtrace.partial` and renames it on finalize
pub struct FileCaptureSink {
    name: String,
    dir: PathBuf,
    partial: PathBuf,
    writer: BufWriter<File>,
    written: u64,
}

impl FileCaptureSink {
    /// Start a capture file named `name` in `dir`, creating the directory
    pub async fn create(dir: impl AsRef<Path>, name: &str) -> Result<Self, CaptureError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;

        let partial = dir.join(format!("{}.{}.partial", name, CAPTURE_EXTENSION));
        let file = File::create(&partial).await?;
        debug!("Writing capture to {:?}", partial);

        Ok(Self {
            name: name.to_string(),
            dir,
            partial,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    /// Path of the in-progress file
    pub fn partial_path(&self) -> &Path {
        &self.partial
    }

    /// Claim the first free `<name>.gfxtrace`, `<name>-1.gfxtrace`, ...
    ///
    /// The name is reserved with `create_new`; an existing file is never replaced.
    async fn claim_final_path(&self) -> Result<PathBuf, CaptureError> {
        let mut n = 0u32;
        loop {
            let path = if n == 0 {
                self.dir.join(format!("{}.{}", self.name, CAPTURE_EXTENSION))
            } else {
                self.dir
                    .join(format!("{}-{}.{}", self.name, n, CAPTURE_EXTENSION))
            };
            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(_) => return Ok(path),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => n += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[async_trait]
impl CaptureSink for FileCaptureSink {
    async fn append(&mut self, bytes: &[u8]) -> Result<(), CaptureError> {
        self.writer.write_all(bytes).await?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    async fn finalize(mut self: Box<Self>) -> Result<Capture, CaptureError> {
        self.writer.flush().await?;
        self.writer.get_ref().sync_all().await?;

        let path = self.claim_final_path().await?;
        if let Err(e) = fs::rename(&self.partial, &path).await {
            let _ = fs::remove_file(&path).await;
            return Err(e.into());
        }
        info!("Capture {} saved to {:?} ({} bytes)", self.name, path, self.written);

        Ok(Capture {
            name: self.name.clone(),
            path: Some(path),
            size: self.written,
        })
    }

    async fn cancel(self: Box<Self>) -> Result<(), CaptureError> {
        let FileCaptureSink { partial, writer, name, .. } = *self;
        drop(writer);
        fs::remove_file(&partial).await?;
        debug!("Discarded capture {}", name);
        Ok(())
    }

    fn len(&self) -> u64 {
        self.written
    }
}

/// What happened to a [`MemoryCaptureSink`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryCapture {
    pub data: Vec<u8>,
    /// Number of append calls
    pub appends: usize,
    pub finalized: bool,
    pub cancelled: bool,
}

/// Keeps the capture in memory
///
/// Clones share the same buffer, so a caller can keep one to inspect the
/// capture after handing the sink to a session.
#[derive(Debug, Clone, Default)]
pub struct MemoryCaptureSink {
    name: String,
    state: Arc<Mutex<MemoryCapture>>,
}

impl MemoryCaptureSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::default(),
        }
    }

    pub fn snapshot(&self) -> MemoryCapture {
        self.state.lock().clone()
    }

    fn check_open(&self) -> Result<(), CaptureError> {
        let state = self.state.lock();
        if state.finalized || state.cancelled {
            return Err(CaptureError::Finished(self.name.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl CaptureSink for MemoryCaptureSink {
    async fn append(&mut self, bytes: &[u8]) -> Result<(), CaptureError> {
        self.check_open()?;
        let mut state = self.state.lock();
        state.data.extend_from_slice(bytes);
        state.appends += 1;
        Ok(())
    }

    async fn finalize(self: Box<Self>) -> Result<Capture, CaptureError> {
        self.check_open()?;
        let mut state = self.state.lock();
        state.finalized = true;
        Ok(Capture {
            name: self.name.clone(),
            path: None,
            size: state.data.len() as u64,
        })
    }

    async fn cancel(self: Box<Self>) -> Result<(), CaptureError> {
        self.check_open()?;
        self.state.lock().cancelled = true;
        Ok(())
    }

    fn len(&self) -> u64 {
        self.state.lock().data.len() as u64
    }
}
