//! Identifiers
//!
//! 20-byte identifiers carried as `[20]byte` array fields.

use std::fmt;

use gfxtrace_rpclib::{FieldReader, Result, Type, Value};

/// Size of every service identifier
pub const ID_SIZE: usize = 20;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $alias:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub [u8; ID_SIZE]);

        impl $name {
            /// The all-zero identifier
            pub const INVALID: $name = $name([0; ID_SIZE]);

            /// Schema type of a field holding this identifier
            pub fn field_type() -> Type {
                Type::id($alias, ID_SIZE)
            }

            pub fn is_valid(&self) -> bool {
                *self != Self::INVALID
            }

            /// Parse from 40 hex characters
            pub fn parse(text: &str) -> Option<Self> {
                let bytes = hex::decode(text).ok()?;
                let bytes: [u8; ID_SIZE] = bytes.try_into().ok()?;
                Some(Self(bytes))
            }

            pub fn to_value(&self) -> Value {
                Value::bytes(&self.0)
            }

            pub fn read(reader: &mut FieldReader) -> Result<Self> {
                Ok(Self(reader.bytes()?))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self)
            }
        }
    };
}

define_id!(
    /// Identifies a graphics context within a capture
    ContextID,
    "path.ContextID"
);
define_id!(
    /// Identifies a graphics API
    ApiID,
    "ApiID"
);
define_id!(
    /// Identifies a stored capture
    CaptureID,
    "ID"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let text = "000102030405060708090a0b0c0d0e0f10111213";
        let id = ContextID::parse(text).unwrap();
        assert_eq!(id.0[19], 0x13);
        assert_eq!(id.to_string(), text);
        assert!(id.is_valid());
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!(ApiID::parse("0102").is_none());
        assert!(ApiID::parse("zz").is_none());
    }

    #[test]
    fn test_invalid() {
        assert!(!CaptureID::INVALID.is_valid());
        assert_eq!(CaptureID::default(), CaptureID::INVALID);
    }
}
