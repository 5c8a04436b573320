//! Image formats
//!
//! Formats carry no fields; the type key alone identifies them.

use gfxtrace_rpclib::{decode_boxed, BinaryClass, BinaryType, Field, FieldReader, Result, Value};

/// Interface tag of every image format entity
pub const FORMAT_INTERFACE: &str = "Format";

macro_rules! define_format {
    ($(#[$meta:meta])* $name:ident, $class:ident, $entity:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name;

        pub static $class: BinaryClass =
            BinaryClass::new("image", $entity, no_fields, decode_boxed::<$name>);

        impl BinaryType for $name {
            fn binary_class() -> &'static BinaryClass {
                &$class
            }

            fn to_values(&self) -> Vec<Value> {
                Vec::new()
            }

            fn from_values(_: &mut FieldReader) -> Result<Self> {
                Ok($name)
            }
        }
    };
}

fn no_fields() -> Vec<Field> {
    Vec::new()
}

define_format!(
    /// 8 bits per channel RGBA
    FmtRgba,
    FMT_RGBA_CLASS,
    "fmtRGBA"
);
define_format!(
    /// AMD ATC compressed RGBA with interpolated alpha
    FmtAtcRgbaInterpolatedAlphaAmd,
    FMT_ATC_RGBA_INTERPOLATED_ALPHA_AMD_CLASS,
    "fmtATC_RGBA_INTERPOLATED_ALPHA_AMD"
);
