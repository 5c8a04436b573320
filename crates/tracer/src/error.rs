//! Trace errors

use gfxtrace_device_bridge::AdbError;
use thiserror::Error;

use crate::capture::CaptureError;

/// Failures of a trace session
#[derive(Error, Debug)]
pub enum TraceError {
    /// Could not reach the agent, or the stream broke; retried within budget
    #[error("Connection error: {0}")]
    Connection(String),

    /// The agent handshake failed
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A device command failed
    #[error("Device command failed: {0}")]
    DeviceCommand(#[from] AdbError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),
}

pub type Result<T> = std::result::Result<T, TraceError>;

impl TraceError {
    /// Whether a fresh connection attempt may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, TraceError::Connection(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_connection_errors_retry() {
        assert!(TraceError::Connection("refused".into()).is_retryable());
        assert!(!TraceError::Protocol("short write".into()).is_retryable());
        assert!(!TraceError::from(AdbError::UnsupportedAbi("mips".into())).is_retryable());
        assert!(!TraceError::from(CaptureError::Finished("game".into())).is_retryable());
    }

    #[test]
    fn test_device_error_message() {
        let err = TraceError::from(AdbError::CommandFailed("am: not found".into()));
        assert_eq!(err.to_string(), "Device command failed: ADB command failed: am: not found");
    }
}
