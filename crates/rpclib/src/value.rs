//! Field Values
//!
//! The dynamic value tree the generic encoder and decoder walk. Concrete
//! types flatten themselves into a `Vec<Value>` in entity order and rebuild
//! from one through [`FieldReader`].

use crate::error::{CodecError, Result};
use crate::object::{BinaryObject, BinaryType};

/// A single field value
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Int8(i8),
    Uint8(u8),
    Int16(i16),
    Uint16(u16),
    Int32(i32),
    Uint32(u32),
    Int64(i64),
    Uint64(u64),
    Float32(f32),
    Float64(f64),
    String(String),
    Array(Vec<Value>),
    Slice(Vec<Value>),
    /// Nested value, its fields in entity order
    Struct(Vec<Value>),
    /// Pointer or interface field; `None` is the null object
    Object(Option<Box<dyn BinaryObject>>),
}

impl Value {
    /// Byte array value for fixed-size identifiers
    pub fn bytes(bytes: &[u8]) -> Value {
        Value::Array(bytes.iter().copied().map(Value::Uint8).collect())
    }

    /// Nested value for a struct-typed field
    pub fn structure<T: BinaryType>(value: &T) -> Value {
        Value::Struct(value.to_values())
    }

    /// Slice of nested values
    pub fn structs<T: BinaryType>(values: &[T]) -> Value {
        Value::Slice(values.iter().map(Value::structure).collect())
    }

    /// Pointer or interface value holding a copy of `object`
    pub fn object<T: BinaryObject>(object: &T) -> Value {
        Value::Object(Some(object.clone_object()))
    }

    /// Pointer or interface value that may be null
    pub fn optional(object: Option<&dyn BinaryObject>) -> Value {
        Value::Object(object.map(|o| o.clone_object()))
    }

    /// Name of the variant, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int8(_) => "int8",
            Value::Uint8(_) => "uint8",
            Value::Int16(_) => "int16",
            Value::Uint16(_) => "uint16",
            Value::Int32(_) => "int32",
            Value::Uint32(_) => "uint32",
            Value::Int64(_) => "int64",
            Value::Uint64(_) => "uint64",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Slice(_) => "slice",
            Value::Struct(_) => "struct",
            Value::Object(_) => "object",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int8(a), Value::Int8(b)) => a == b,
            (Value::Uint8(a), Value::Uint8(b)) => a == b,
            (Value::Int16(a), Value::Int16(b)) => a == b,
            (Value::Uint16(a), Value::Uint16(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Uint32(a), Value::Uint32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Uint64(a), Value::Uint64(b)) => a == b,
            (Value::Float32(a), Value::Float32(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Slice(a), Value::Slice(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => match (a, b) {
                (Some(a), Some(b)) => a.dyn_eq(&**b),
                (None, None) => true,
                _ => false,
            },
            _ => false,
        }
    }
}

/// Ordered, typed access to a decoded field list
pub struct FieldReader {
    owner: &'static str,
    values: std::vec::IntoIter<Value>,
    index: usize,
}

macro_rules! read_primitive {
    ($fn_name:ident, $variant:ident, $ty:ty) => {
        pub fn $fn_name(&mut self) -> Result<$ty> {
            match self.next()? {
                Value::$variant(v) => Ok(v),
                other => Err(self.mismatch(stringify!($variant), &other)),
            }
        }
    };
}

impl FieldReader {
    pub fn new(owner: &'static str, values: Vec<Value>) -> Self {
        Self {
            owner,
            values: values.into_iter(),
            index: 0,
        }
    }

    fn mismatch(&self, expected: &str, found: &Value) -> CodecError {
        CodecError::violation(format!(
            "{} field {}: expected {}, found {}",
            self.owner,
            self.index.saturating_sub(1),
            expected,
            found.kind()
        ))
    }

    /// Next raw value
    pub fn next(&mut self) -> Result<Value> {
        let value = self.values.next().ok_or_else(|| {
            CodecError::violation(format!("{} is missing field {}", self.owner, self.index))
        })?;
        self.index += 1;
        Ok(value)
    }

    read_primitive!(bool, Bool, bool);
    read_primitive!(int8, Int8, i8);
    read_primitive!(uint8, Uint8, u8);
    read_primitive!(int16, Int16, i16);
    read_primitive!(uint16, Uint16, u16);
    read_primitive!(int32, Int32, i32);
    read_primitive!(uint32, Uint32, u32);
    read_primitive!(int64, Int64, i64);
    read_primitive!(uint64, Uint64, u64);
    read_primitive!(float32, Float32, f32);
    read_primitive!(float64, Float64, f64);
    read_primitive!(string, String, String);

    /// Fixed-size byte array, e.g. a 20-byte identifier
    pub fn bytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        let elements = match self.next()? {
            Value::Array(elements) => elements,
            other => return Err(self.mismatch("array", &other)),
        };
        if elements.len() != N {
            return Err(CodecError::violation(format!(
                "{} field {}: expected {} bytes, found {}",
                self.owner,
                self.index - 1,
                N,
                elements.len()
            )));
        }
        let mut out = [0u8; N];
        for (slot, element) in out.iter_mut().zip(elements) {
            *slot = match element {
                Value::Uint8(b) => b,
                other => return Err(self.mismatch("uint8", &other)),
            };
        }
        Ok(out)
    }

    /// Nested struct value
    pub fn structure<T: BinaryType>(&mut self) -> Result<T> {
        match self.next()? {
            Value::Struct(fields) => nested::<T>(fields),
            other => Err(self.mismatch("struct", &other)),
        }
    }

    /// Slice of nested struct values
    pub fn structs<T: BinaryType>(&mut self) -> Result<Vec<T>> {
        let elements = self.slice()?;
        let mut out = Vec::with_capacity(elements.len());
        for element in elements {
            match element {
                Value::Struct(fields) => out.push(nested::<T>(fields)?),
                other => return Err(self.mismatch("struct", &other)),
            }
        }
        Ok(out)
    }

    /// Raw slice elements
    pub fn slice(&mut self) -> Result<Vec<Value>> {
        match self.next()? {
            Value::Slice(elements) => Ok(elements),
            other => Err(self.mismatch("slice", &other)),
        }
    }

    /// Pointer or interface field, possibly null
    pub fn object(&mut self) -> Result<Option<Box<dyn BinaryObject>>> {
        match self.next()? {
            Value::Object(object) => Ok(object),
            other => Err(self.mismatch("object", &other)),
        }
    }

    /// Pointer field of a known concrete type, possibly null
    pub fn pointer<T: BinaryObject>(&mut self) -> Result<Option<T>> {
        match self.object()? {
            None => Ok(None),
            Some(object) => {
                let name = object.class().qualified_name();
                object
                    .downcast::<T>()
                    .map(|boxed| Some(*boxed))
                    .ok_or_else(|| {
                        CodecError::violation(format!(
                            "{} field {}: unexpected pointer target {}",
                            self.owner,
                            self.index - 1,
                            name
                        ))
                    })
            }
        }
    }

    /// Slice of non-null interface objects
    pub fn objects(&mut self) -> Result<Vec<Box<dyn BinaryObject>>> {
        let elements = self.slice()?;
        let mut out = Vec::with_capacity(elements.len());
        for element in elements {
            match element {
                Value::Object(Some(object)) => out.push(object),
                Value::Object(None) => {
                    return Err(CodecError::violation(format!(
                        "{} field {}: null element in object slice",
                        self.owner,
                        self.index - 1
                    )))
                }
                other => return Err(self.mismatch("object", &other)),
            }
        }
        Ok(out)
    }

    /// Fail if values remain unread
    pub fn finish(&mut self) -> Result<()> {
        let remaining = self.values.len();
        if remaining == 0 {
            Ok(())
        } else {
            Err(CodecError::violation(format!(
                "{} has {} unread field(s)",
                self.owner, remaining
            )))
        }
    }
}

fn nested<T: BinaryType>(fields: Vec<Value>) -> Result<T> {
    let mut reader = FieldReader::new(T::binary_class().name(), fields);
    let value = T::from_values(&mut reader)?;
    reader.finish()?;
    Ok(value)
}
