//! GfxTrace Device Bridge
//!
//! The device-command channel the tracer drives: port forwarding to an
//! abstract socket, shell commands and property reads, backed by `adb`.

pub mod adb;
pub mod device;

pub use adb::{AdbClient, AdbDevice, AdbError, DeviceChannel};
pub use device::{Device, DeviceAbi, DeviceState};

/// Property holding the device's API level
pub const SDK_VERSION_PROPERTY: &str = "ro.build.version.sdk";

/// Property holding the device's primary ABI
pub const ABI_PROPERTY: &str = "ro.product.cpu.abi";
