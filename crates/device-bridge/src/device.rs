//! Device Model
//!
//! Devices as listed by `adb devices -l`, and the CPU ABIs the trace
//! agent ships for.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::adb::AdbError;

/// Device state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceState {
    /// Online and accepting commands
    Online,
    Offline,
    /// Debugging not yet authorized on the device
    Unauthorized,
    Bootloader,
    Recovery,
    Sideload,
    Unknown,
}

impl DeviceState {
    /// Parse the state column of `adb devices`
    pub fn parse(text: &str) -> Self {
        match text {
            "device" => DeviceState::Online,
            "offline" => DeviceState::Offline,
            "unauthorized" => DeviceState::Unauthorized,
            "bootloader" => DeviceState::Bootloader,
            "recovery" => DeviceState::Recovery,
            "sideload" => DeviceState::Sideload,
            _ => DeviceState::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceState::Online => "device",
            DeviceState::Offline => "offline",
            DeviceState::Unauthorized => "unauthorized",
            DeviceState::Bootloader => "bootloader",
            DeviceState::Recovery => "recovery",
            DeviceState::Sideload => "sideload",
            DeviceState::Unknown => "unknown",
        }
    }
}

/// A device known to the ADB server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub serial: String,
    pub state: DeviceState,
}

impl Device {
    /// Parse one line of `adb devices -l`; trailing `key:value` details are ignored
    pub fn parse_line(line: &str) -> Option<Device> {
        let mut parts = line.split_whitespace();
        let serial = parts.next()?.to_string();
        let state = DeviceState::parse(parts.next()?);
        Some(Device { serial, state })
    }
}

/// Parse the full output of `adb devices -l`
pub fn parse_device_list(output: &str) -> Vec<Device> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("List of devices") && !line.starts_with('*'))
        .filter_map(Device::parse_line)
        .collect()
}

/// CPU ABI of a device, as reported by `ro.product.cpu.abi`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceAbi {
    #[serde(rename = "arm64-v8a")]
    Arm64V8a,
    #[serde(rename = "armeabi-v7a")]
    ArmeabiV7a,
    #[serde(rename = "x86")]
    X86,
    #[serde(rename = "x86_64")]
    X86_64,
}

impl DeviceAbi {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceAbi::Arm64V8a => "arm64-v8a",
            DeviceAbi::ArmeabiV7a => "armeabi-v7a",
            DeviceAbi::X86 => "x86",
            DeviceAbi::X86_64 => "x86_64",
        }
    }
}

impl FromStr for DeviceAbi {
    type Err = AdbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "arm64-v8a" => Ok(DeviceAbi::Arm64V8a),
            "armeabi-v7a" => Ok(DeviceAbi::ArmeabiV7a),
            "x86" => Ok(DeviceAbi::X86),
            "x86_64" => Ok(DeviceAbi::X86_64),
            other => Err(AdbError::UnsupportedAbi(other.to_string())),
        }
    }
}

impl fmt::Display for DeviceAbi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICES: &str = "\
* daemon started successfully
List of devices attached
emulator-5554          device product:sdk_gphone64 model:sdk_gphone64_x86_64 transport_id:1
0A1B2C3D               unauthorized transport_id:2

";

    #[test]
    fn test_parse_device_list() {
        let devices = parse_device_list(DEVICES);
        assert_eq!(devices.len(), 2);

        assert_eq!(
            devices[0],
            Device {
                serial: "emulator-5554".into(),
                state: DeviceState::Online,
            }
        );
        assert_eq!(devices[1].serial, "0A1B2C3D");
        assert_eq!(devices[1].state, DeviceState::Unauthorized);
    }

    #[test]
    fn test_parse_abi() {
        assert_eq!("arm64-v8a\n".parse::<DeviceAbi>().unwrap(), DeviceAbi::Arm64V8a);
        assert_eq!("x86".parse::<DeviceAbi>().unwrap(), DeviceAbi::X86);
        assert_eq!(DeviceAbi::ArmeabiV7a.to_string(), "armeabi-v7a");
    }

    #[test]
    fn test_unsupported_abi() {
        let err = "mips".parse::<DeviceAbi>().unwrap_err();
        assert!(matches!(err, AdbError::UnsupportedAbi(abi) if abi == "mips"));
    }
}
