//! Schema Descriptors
//!
//! Every serializable type describes itself with an [`Entity`]: a package,
//! a name and an ordered list of [`Field`]s. Field types come from the
//! closed [`Type`] set, which the encoder and decoder interpret generically.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::object::BinaryClass;

/// Width of a type key in bytes
pub const TYPE_KEY_SIZE: usize = 20;

/// Wire method for a primitive field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Bool,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float32,
    Float64,
    String,
}

impl Method {
    pub fn name(&self) -> &'static str {
        match self {
            Method::Bool => "bool",
            Method::Int8 => "int8",
            Method::Uint8 => "uint8",
            Method::Int16 => "int16",
            Method::Uint16 => "uint16",
            Method::Int32 => "int32",
            Method::Uint32 => "uint32",
            Method::Int64 => "int64",
            Method::Uint64 => "uint64",
            Method::Float32 => "float32",
            Method::Float64 => "float64",
            Method::String => "string",
        }
    }

    /// Encoded size in bytes, `None` for variable-length methods
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            Method::Bool | Method::Int8 | Method::Uint8 => Some(1),
            Method::Int16 | Method::Uint16 => Some(2),
            Method::Int32 | Method::Uint32 | Method::Float32 => Some(4),
            Method::Int64 | Method::Uint64 | Method::Float64 => Some(8),
            Method::String => None,
        }
    }
}

/// Type descriptor for a single field
#[derive(Debug, Clone)]
pub enum Type {
    /// Fixed-width scalar or length-prefixed string
    Primitive { name: &'static str, method: Method },
    /// Exactly `size` elements, no length prefix
    Array {
        alias: &'static str,
        element: Box<Type>,
        size: usize,
    },
    /// `u32` count followed by the elements
    Slice {
        alias: &'static str,
        element: Box<Type>,
    },
    /// Nested value embedded in place
    Struct(&'static BinaryClass),
    /// Forward reference to an object of a known class
    Pointer(&'static BinaryClass),
    /// Object of any registered class
    Interface(&'static str),
}

impl Type {
    pub fn primitive(name: &'static str, method: Method) -> Self {
        Type::Primitive { name, method }
    }

    pub fn array(alias: &'static str, element: Type, size: usize) -> Self {
        Type::Array {
            alias,
            element: Box::new(element),
            size,
        }
    }

    pub fn slice(alias: &'static str, element: Type) -> Self {
        Type::Slice {
            alias,
            element: Box::new(element),
        }
    }

    /// A `[size]byte` identifier array
    pub fn id(alias: &'static str, size: usize) -> Self {
        Type::array(alias, Type::primitive("byte", Method::Uint8), size)
    }

    /// Canonical text used when hashing an entity into its key
    ///
    /// Struct and pointer targets are named, not expanded, so
    /// self-referencing schemas still produce a finite signature.
    pub fn signature(&self) -> String {
        match self {
            Type::Primitive { method, .. } => method.name().to_string(),
            Type::Array { element, size, .. } => format!("[{}]{}", size, element.signature()),
            Type::Slice { element, .. } => format!("[]{}", element.signature()),
            Type::Struct(class) => class.qualified_name(),
            Type::Pointer(class) => format!("*{}", class.qualified_name()),
            Type::Interface(name) => format!("?{}", name),
        }
    }
}

/// Named field of an entity
#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub ty: Type,
}

impl Field {
    pub fn new(name: &'static str, ty: Type) -> Self {
        Self { name, ty }
    }
}

/// Fixed-width identifier of an entity on the wire
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TypeKey([u8; TYPE_KEY_SIZE]);

impl TypeKey {
    /// Key written in place of a null object
    pub const NULL: TypeKey = TypeKey([0; TYPE_KEY_SIZE]);

    pub fn from_bytes(bytes: [u8; TYPE_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Derive a key from an entity signature
    pub fn from_signature(signature: &str) -> Self {
        let digest = Sha256::digest(signature.as_bytes());
        let mut bytes = [0u8; TYPE_KEY_SIZE];
        bytes.copy_from_slice(&digest[..TYPE_KEY_SIZE]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; TYPE_KEY_SIZE] {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self)
    }
}

/// Static schema of a serializable type
///
/// Field order is the wire order: encode and decode both walk `fields`
/// front to back.
#[derive(Debug)]
pub struct Entity {
    package: &'static str,
    name: &'static str,
    fields: Vec<Field>,
    key: TypeKey,
}

impl Entity {
    pub fn new(package: &'static str, name: &'static str, fields: Vec<Field>) -> Self {
        let key = TypeKey::from_signature(&signature(package, name, &fields));
        Self {
            package,
            name,
            fields,
            key,
        }
    }

    pub fn package(&self) -> &'static str {
        self.package
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.package, self.name)
    }

    pub fn signature(&self) -> String {
        signature(self.package, self.name, &self.fields)
    }
}

fn signature(package: &str, name: &str, fields: &[Field]) -> String {
    let body: Vec<String> = fields
        .iter()
        .map(|f| format!("{}:{}", f.name, f.ty.signature()))
        .collect();
    format!("{}.{}{{{}}}", package, name, body.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_format() {
        let entity = Entity::new(
            "atom",
            "Range",
            vec![
                Field::new("Start", Type::primitive("uint64", Method::Uint64)),
                Field::new("End", Type::primitive("uint64", Method::Uint64)),
                Field::new("ID", Type::id("ID", 20)),
                Field::new("Children", Type::slice("", Type::Interface("Node"))),
            ],
        );

        assert_eq!(
            entity.signature(),
            "atom.Range{Start:uint64,End:uint64,ID:[20]uint8,Children:[]?Node}"
        );
        assert_eq!(entity.qualified_name(), "atom.Range");
    }

    #[test]
    fn test_key_is_stable_and_distinct() {
        let a = Entity::new("image", "fmtRGBA", vec![]);
        let b = Entity::new("image", "fmtRGBA", vec![]);
        let c = Entity::new("image", "fmtAlpha", vec![]);

        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
        assert!(!a.key().is_null());
        assert_eq!(a.key().to_string().len(), TYPE_KEY_SIZE * 2);
    }

    #[test]
    fn test_method_sizes() {
        assert_eq!(Method::Uint8.fixed_size(), Some(1));
        assert_eq!(Method::Float64.fixed_size(), Some(8));
        assert_eq!(Method::String.fixed_size(), None);
    }
}
