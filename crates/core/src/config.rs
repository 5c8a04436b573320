//! Application Configuration
//!
//! Manages all GfxTrace settings including:
//! - Android SDK location
//! - GAPII connection tuning (port, timeouts, retry budget)
//! - Capture output and observation options
//! - An optional trace target to run at startup

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use directories::ProjectDirs;
use tracing::{info, debug};

use crate::error::{GfxTraceError, Result};

/// Android SDK configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AndroidConfig {
    /// Path to Android SDK
    pub sdk_path: Option<PathBuf>,
}

/// GAPII connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TracerConfig {
    /// Host the forwarded port is reachable on
    pub host: String,
    /// Local TCP port forwarded to the device
    pub port: u16,
    /// Abstract socket name GAPII listens on
    pub abstract_socket: String,
    /// Socket read timeout; bounds how long a stop request can go unnoticed
    pub read_timeout_ms: u64,
    /// Upper bound for a single connect attempt
    pub connect_timeout_ms: u64,
    /// Pause between connection attempts
    pub retry_delay_ms: u64,
    /// Number of reconnects allowed before any data has arrived
    pub max_retries: u32,
    /// Minimum interval between progress notifications
    pub progress_interval_ms: u64,
    /// Read buffer size in bytes
    pub buffer_size: usize,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 9286,
            abstract_socket: "gapii".to_string(),
            read_timeout_ms: 500,
            connect_timeout_ms: 2000,
            retry_delay_ms: 500,
            max_retries: 60,
            progress_interval_ms: 500,
            buffer_size: 4096,
        }
    }
}

/// Capture output and GAPII observation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Directory finished captures are written to
    pub output_dir: Option<PathBuf>,
    /// Observe the framebuffer every N frames (0 disables)
    pub observe_frame_frequency: u32,
    /// Observe the framebuffer every N draw calls (0 disables)
    pub observe_draw_frequency: u32,
    /// Pretend the driver has no precompiled shader support
    pub disable_precompiled_shaders: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            observe_frame_frequency: 0,
            observe_draw_frequency: 0,
            disable_precompiled_shaders: false,
        }
    }
}

impl CaptureConfig {
    /// Resolve the capture directory, falling back to the data dir
    pub fn resolve_output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| {
            AppConfig::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("captures")
        })
    }
}

/// Trace to run when the binary starts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceTarget {
    /// Device serial
    pub serial: String,
    /// Application package
    pub package: String,
    /// Activity to launch; when absent the tracer attaches to a running process
    pub activity: Option<String>,
    /// Trace file name, defaults to the package name
    pub trace_name: Option<String>,
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration version for migrations
    pub version: u32,
    /// Default log level when RUST_LOG is not set
    pub log_level: String,
    /// Android SDK settings
    pub android: AndroidConfig,
    /// GAPII connection settings
    pub tracer: TracerConfig,
    /// Capture settings
    pub capture: CaptureConfig,
    /// Optional trace to run at startup
    pub trace: Option<TraceTarget>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            log_level: "info".to_string(),
            android: AndroidConfig::default(),
            tracer: TracerConfig::default(),
            capture: CaptureConfig::default(),
            trace: None,
        }
    }
}

impl AppConfig {
    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "gfxtrace", "GfxTrace")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the configuration file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get the data directory path
    pub fn data_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "gfxtrace", "GfxTrace")
            .map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// Load configuration from the default location, creating it if missing
    pub async fn load() -> Result<Self> {
        let config_file = Self::config_file()
            .ok_or_else(|| GfxTraceError::Config("Cannot determine config path".into()))?;
        Self::load_from(&config_file).await
    }

    /// Load configuration from a specific file, creating it if missing
    pub async fn load_from(config_file: &Path) -> Result<Self> {
        if config_file.exists() {
            debug!("Loading config from {:?}", config_file);
            let contents = tokio::fs::read_to_string(config_file).await?;
            let config: AppConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            info!("Config file not found, using defaults");
            let config = AppConfig::default();
            config.save_to(config_file).await?;
            Ok(config)
        }
    }

    /// Save configuration to the default location
    pub async fn save(&self) -> Result<()> {
        let config_file = Self::config_file()
            .ok_or_else(|| GfxTraceError::Config("Cannot determine config path".into()))?;
        self.save_to(&config_file).await
    }

    /// Save configuration to a specific file
    pub async fn save_to(&self, config_file: &Path) -> Result<()> {
        if let Some(parent) = config_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = toml::to_string_pretty(self)?;
        tokio::fs::write(config_file, contents).await?;

        debug!("Config saved to {:?}", config_file);
        Ok(())
    }

    /// Get Android SDK path, with auto-detection
    pub fn get_sdk_path(&self) -> Option<PathBuf> {
        self.android.sdk_path.clone().or_else(|| {
            let from_env = ["ANDROID_HOME", "ANDROID_SDK_ROOT"]
                .iter()
                .filter_map(|var| std::env::var_os(var))
                .map(PathBuf::from)
                .find(|p| p.exists());
            if from_env.is_some() {
                return from_env;
            }

            let candidates = if cfg!(windows) {
                vec![
                    dirs::config_local_dir().map(|d| d.join("Android").join("Sdk")),
                    Some(PathBuf::from("C:\\Android\\sdk")),
                ]
            } else {
                vec![
                    dirs::home_dir().map(|h: PathBuf| h.join("Android").join("Sdk")),
                    Some(PathBuf::from("/usr/local/android-sdk")),
                ]
            };

            candidates.into_iter()
                .flatten()
                .find(|p: &PathBuf| p.exists())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.tracer.port, 9286);
        assert_eq!(config.tracer.abstract_socket, "gapii");
        assert_eq!(config.tracer.read_timeout_ms, 500);
        assert_eq!(config.tracer.max_retries, 60);
        assert!(!config.capture.disable_precompiled_shaders);
        assert!(config.trace.is_none());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [tracer]
            port = 9300

            [capture]
            disable_precompiled_shaders = true
            "#,
        )
        .unwrap();

        assert_eq!(config.tracer.port, 9300);
        assert_eq!(config.tracer.retry_delay_ms, 500);
        assert!(config.capture.disable_precompiled_shaders);
        assert_eq!(config.log_level, "info");
    }

    #[tokio::test]
    async fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = AppConfig::load_from(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(config.version, 1);

        let mut changed = config.clone();
        changed.trace = Some(TraceTarget {
            serial: "emulator-5554".into(),
            package: "com.example.app".into(),
            activity: Some(".MainActivity".into()),
            trace_name: None,
        });
        changed.save_to(&path).await.unwrap();

        let reloaded = AppConfig::load_from(&path).await.unwrap();
        let target = reloaded.trace.unwrap();
        assert_eq!(target.serial, "emulator-5554");
        assert_eq!(target.activity.as_deref(), Some(".MainActivity"));
    }
}
