//! Codec errors
//!
//! None of these are recoverable inside the codec. They surface to whoever
//! called the top-level encode or decode.

use std::io;

use crate::schema::TypeKey;

/// Errors raised while encoding or decoding binary objects
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Unexpected end of stream")]
    UnexpectedEndOfStream,
    #[error("Unknown type key {0}")]
    UnknownType(TypeKey),
    #[error("Schema violation: {0}")]
    SchemaViolation(String),
    #[error("Encoding error: {0}")]
    Encoding(String),
    #[error("Invalid UTF-8 string: {0}")]
    InvalidString(#[from] std::string::FromUtf8Error),
    #[error("Type key {key} is already registered to {existing}, cannot register {attempted}")]
    RegistrationConflict {
        key: TypeKey,
        existing: String,
        attempted: String,
    },
    #[error("IO error: {0}")]
    Io(io::Error),
}

impl CodecError {
    pub(crate) fn violation(message: impl Into<String>) -> Self {
        CodecError::SchemaViolation(message.into())
    }
}

impl From<io::Error> for CodecError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            CodecError::UnexpectedEndOfStream
        } else {
            CodecError::Io(err)
        }
    }
}

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;
