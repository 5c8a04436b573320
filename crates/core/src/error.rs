//! Error types for GfxTrace
//! 
//! Application-level error handling using thiserror. Subsystem crates
//! carry their own error enums; this one covers configuration and I/O
//! at the application edge.

use thiserror::Error;

/// Main error type for GfxTrace
#[derive(Error, Debug)]
pub enum GfxTraceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Result type alias for GfxTrace operations
pub type Result<T> = std::result::Result<T, GfxTraceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = GfxTraceError::Config("Cannot determine config path".into());
        assert_eq!(err.to_string(), "Configuration error: Cannot determine config path");
    }

    #[test]
    fn test_from_toml_error() {
        let err: GfxTraceError = toml::from_str::<toml::Value>("version = ").unwrap_err().into();
        assert!(matches!(err, GfxTraceError::TomlParse(_)));
        assert!(err.to_string().starts_with("TOML parse error"));
    }
}
