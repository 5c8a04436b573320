//! ADB (Android Debug Bridge) Client
//!
//! Runs the SDK's `adb` binary and exposes the device operations a trace
//! session needs through [`DeviceChannel`].

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::device::{parse_device_list, Device, DeviceState};
use crate::SDK_VERSION_PROPERTY;

/// ADB errors
#[derive(Debug, thiserror::Error)]
pub enum AdbError {
    #[error("ADB not found")]
    NotFound,
    #[error("Device not found: {0}")]
    DeviceNotFound(String),
    #[error("ADB command failed: {0}")]
    CommandFailed(String),
    #[error("Unsupported device ABI: {0}")]
    UnsupportedAbi(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The device operations a trace session depends on
#[async_trait]
pub trait DeviceChannel: Send + Sync {
    /// Serial of the device this channel talks to
    fn serial(&self) -> &str;

    /// Forward host `tcp:local_port` to the device's abstract socket
    async fn forward_port(&self, local_port: u16, abstract_socket: &str) -> Result<(), AdbError>;

    /// Undo a [`forward_port`](Self::forward_port)
    async fn remove_forward(&self, local_port: u16, abstract_socket: &str) -> Result<(), AdbError>;

    /// Run a shell command and collect its output
    async fn execute_shell_command(&self, command: &str) -> Result<String, AdbError>;

    /// API level of the device
    async fn get_version(&self) -> Result<u32, AdbError>;

    async fn get_property(&self, key: &str) -> Result<String, AdbError>;

    /// Restart adbd as root, where the device allows it
    async fn root(&self) -> Result<(), AdbError> {
        Ok(())
    }
}

/// ADB Client
#[derive(Debug, Clone)]
pub struct AdbClient {
    sdk_path: PathBuf,
}

impl AdbClient {
    pub fn new(sdk_path: PathBuf) -> Self {
        Self { sdk_path }
    }

    /// Path of the `adb` executable under `platform-tools`
    pub fn adb_path(&self) -> PathBuf {
        let platform_tools = self.sdk_path.join("platform-tools");
        if cfg!(windows) {
            platform_tools.join("adb.exe")
        } else {
            platform_tools.join("adb")
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String, AdbError> {
        let adb = self.adb_path();
        if !adb.exists() {
            return Err(AdbError::NotFound);
        }

        debug!("adb {:?}", args);

        let output = Command::new(&adb).args(args).output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AdbError::CommandFailed(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn run_for_device(&self, serial: &str, args: &[&str]) -> Result<String, AdbError> {
        let mut full_args = vec!["-s", serial];
        full_args.extend(args);
        self.run(&full_args).await
    }

    /// List connected devices
    pub async fn list_devices(&self) -> Result<Vec<Device>, AdbError> {
        let output = self.run(&["devices", "-l"]).await?;
        Ok(parse_device_list(&output))
    }

    pub async fn get_device(&self, serial: &str) -> Result<Device, AdbError> {
        self.list_devices()
            .await?
            .into_iter()
            .find(|d| d.serial == serial)
            .ok_or_else(|| AdbError::DeviceNotFound(serial.to_string()))
    }

    /// Run a shell command on device
    pub async fn shell(&self, serial: &str, command: &str) -> Result<String, AdbError> {
        self.run_for_device(serial, &["shell", command]).await
    }

    pub async fn get_prop(&self, serial: &str, prop: &str) -> Result<String, AdbError> {
        let output = self.shell(serial, &format!("getprop {}", prop)).await?;
        Ok(output.trim().to_string())
    }

    pub async fn get_sdk_version(&self, serial: &str) -> Result<u32, AdbError> {
        let version = self.get_prop(serial, SDK_VERSION_PROPERTY).await?;
        version
            .parse()
            .map_err(|_| AdbError::CommandFailed(format!("Invalid SDK version: {:?}", version)))
    }

    /// Forward a host port to an abstract unix socket on the device
    pub async fn forward_abstract(
        &self,
        serial: &str,
        local_port: u16,
        socket: &str,
    ) -> Result<(), AdbError> {
        let local = format!("tcp:{}", local_port);
        let remote = format!("localabstract:{}", socket);
        self.run_for_device(serial, &["forward", &local, &remote]).await?;
        Ok(())
    }

    pub async fn remove_forward(&self, serial: &str, local_port: u16) -> Result<(), AdbError> {
        let local = format!("tcp:{}", local_port);
        self.run_for_device(serial, &["forward", "--remove", &local]).await?;
        Ok(())
    }

    /// Restart adbd with root permissions and wait for the device to return
    pub async fn root(&self, serial: &str) -> Result<(), AdbError> {
        let output = self.run_for_device(serial, &["root"]).await?;
        info!("adb root on {}: {}", serial, output.trim());
        self.run_for_device(serial, &["wait-for-device"]).await?;
        Ok(())
    }
}

/// A device reached through an [`AdbClient`]
#[derive(Debug, Clone)]
pub struct AdbDevice {
    client: Arc<AdbClient>,
    serial: String,
}

impl AdbDevice {
    pub fn new(client: Arc<AdbClient>, serial: impl Into<String>) -> Self {
        Self {
            client,
            serial: serial.into(),
        }
    }

    /// Bind to `serial` after checking it is attached and online
    pub async fn connect(client: Arc<AdbClient>, serial: &str) -> Result<Self, AdbError> {
        let device = client.get_device(serial).await?;
        if device.state != DeviceState::Online {
            return Err(AdbError::DeviceNotFound(format!(
                "{} ({})",
                serial,
                device.state.as_str()
            )));
        }
        Ok(Self::new(client, serial))
    }
}

#[async_trait]
impl DeviceChannel for AdbDevice {
    fn serial(&self) -> &str {
        &self.serial
    }

    async fn forward_port(&self, local_port: u16, abstract_socket: &str) -> Result<(), AdbError> {
        self.client
            .forward_abstract(&self.serial, local_port, abstract_socket)
            .await
    }

    async fn remove_forward(&self, local_port: u16, _abstract_socket: &str) -> Result<(), AdbError> {
        self.client.remove_forward(&self.serial, local_port).await
    }

    async fn execute_shell_command(&self, command: &str) -> Result<String, AdbError> {
        self.client.shell(&self.serial, command).await
    }

    async fn get_version(&self) -> Result<u32, AdbError> {
        self.client.get_sdk_version(&self.serial).await
    }

    async fn get_property(&self, key: &str) -> Result<String, AdbError> {
        self.client.get_prop(&self.serial, key).await
    }

    async fn root(&self) -> Result<(), AdbError> {
        self.client.root(&self.serial).await
    }
}
