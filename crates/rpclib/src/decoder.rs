//! Binary Decoder
//!
//! Reads values back using the same type descriptors the encoder wrote
//! them with. Objects are resolved through a [`Namespace`].

use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{CodecError, Result};
use crate::namespace::Namespace;
use crate::object::{BinaryObject, BinaryType};
use crate::schema::{Entity, Method, Type, TypeKey, TYPE_KEY_SIZE};
use crate::value::{FieldReader, Value};

/// Deepest object/struct nesting accepted from a stream
pub const MAX_DEPTH: usize = 64;

/// Upper bound on up-front allocation for a slice
const MAX_PREALLOCATED_ELEMENTS: usize = 4096;

/// Schema-driven reader over any byte source
pub struct Decoder<'n, R: Read> {
    reader: R,
    namespace: &'n Namespace,
    depth: usize,
}

impl<R: Read> Decoder<'static, R> {
    /// Decoder resolving objects through the global namespace
    pub fn new(reader: R) -> Self {
        Self::with_namespace(reader, Namespace::global())
    }
}

impl<'n, R: Read> Decoder<'n, R> {
    pub fn with_namespace(reader: R, namespace: &'n Namespace) -> Self {
        Self {
            reader,
            namespace,
            depth: 0,
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    pub fn bool(&mut self) -> Result<bool> {
        match self.reader.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::violation(format!("invalid bool byte {}", other))),
        }
    }

    pub fn int8(&mut self) -> Result<i8> {
        Ok(self.reader.read_i8()?)
    }

    pub fn uint8(&mut self) -> Result<u8> {
        Ok(self.reader.read_u8()?)
    }

    pub fn int16(&mut self) -> Result<i16> {
        Ok(self.reader.read_i16::<LittleEndian>()?)
    }

    pub fn uint16(&mut self) -> Result<u16> {
        Ok(self.reader.read_u16::<LittleEndian>()?)
    }

    pub fn int32(&mut self) -> Result<i32> {
        Ok(self.reader.read_i32::<LittleEndian>()?)
    }

    pub fn uint32(&mut self) -> Result<u32> {
        Ok(self.reader.read_u32::<LittleEndian>()?)
    }

    pub fn int64(&mut self) -> Result<i64> {
        Ok(self.reader.read_i64::<LittleEndian>()?)
    }

    pub fn uint64(&mut self) -> Result<u64> {
        Ok(self.reader.read_u64::<LittleEndian>()?)
    }

    pub fn float32(&mut self) -> Result<f32> {
        Ok(self.reader.read_f32::<LittleEndian>()?)
    }

    pub fn float64(&mut self) -> Result<f64> {
        Ok(self.reader.read_f64::<LittleEndian>()?)
    }

    pub fn string(&mut self) -> Result<String> {
        let len = self.uint32()? as usize;
        let mut bytes = Vec::with_capacity(len.min(MAX_PREALLOCATED_ELEMENTS));
        (&mut self.reader).take(len as u64).read_to_end(&mut bytes)?;
        if bytes.len() != len {
            return Err(CodecError::UnexpectedEndOfStream);
        }
        Ok(String::from_utf8(bytes)?)
    }

    pub fn primitive(&mut self, method: Method) -> Result<Value> {
        Ok(match method {
            Method::Bool => Value::Bool(self.bool()?),
            Method::Int8 => Value::Int8(self.int8()?),
            Method::Uint8 => Value::Uint8(self.uint8()?),
            Method::Int16 => Value::Int16(self.int16()?),
            Method::Uint16 => Value::Uint16(self.uint16()?),
            Method::Int32 => Value::Int32(self.int32()?),
            Method::Uint32 => Value::Uint32(self.uint32()?),
            Method::Int64 => Value::Int64(self.int64()?),
            Method::Uint64 => Value::Uint64(self.uint64()?),
            Method::Float32 => Value::Float32(self.float32()?),
            Method::Float64 => Value::Float64(self.float64()?),
            Method::String => Value::String(self.string()?),
        })
    }

    /// Read exactly `size` elements
    pub fn array(&mut self, element: &Type, size: usize) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(size.min(MAX_PREALLOCATED_ELEMENTS));
        for _ in 0..size {
            values.push(self.value(element)?);
        }
        Ok(values)
    }

    /// Read a `u32` count and that many elements
    ///
    /// A failure part way through drops the partially built slice.
    pub fn slice(&mut self, element: &Type) -> Result<Vec<Value>> {
        let count = self.uint32()? as usize;
        let mut values = Vec::with_capacity(count.min(MAX_PREALLOCATED_ELEMENTS));
        for _ in 0..count {
            values.push(self.value(element)?);
        }
        Ok(values)
    }

    /// Read a value described by `ty`
    pub fn value(&mut self, ty: &Type) -> Result<Value> {
        match ty {
            Type::Primitive { method, .. } => self.primitive(*method),
            Type::Array { element, size, .. } => Ok(Value::Array(self.array(element, *size)?)),
            Type::Slice { element, .. } => Ok(Value::Slice(self.slice(element)?)),
            Type::Struct(class) => {
                let fields = self.nested(|d| d.fields(class.entity()))?;
                Ok(Value::Struct(fields))
            }
            Type::Pointer(class) => {
                let object = self.object()?;
                if let Some(object) = &object {
                    if object.class().key() != class.key() {
                        return Err(CodecError::violation(format!(
                            "pointer to {} resolved to {}",
                            class.qualified_name(),
                            object.class().qualified_name()
                        )));
                    }
                }
                Ok(Value::Object(object))
            }
            Type::Interface(_) => Ok(Value::Object(self.object()?)),
        }
    }

    /// Read an entity body into values in field order
    pub fn fields(&mut self, entity: &Entity) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(entity.fields().len());
        for field in entity.fields() {
            values.push(self.value(&field.ty)?);
        }
        Ok(values)
    }

    /// Read a body of known type `T`, no type key
    pub fn struct_value<T: BinaryType>(&mut self) -> Result<T> {
        let class = T::binary_class();
        let fields = self.nested(|d| d.fields(class.entity()))?;
        let mut reader = FieldReader::new(class.name(), fields);
        let value = T::from_values(&mut reader)?;
        reader.finish()?;
        Ok(value)
    }

    /// Read a type key and the body of whatever class it names
    pub fn object(&mut self) -> Result<Option<Box<dyn BinaryObject>>> {
        let mut key = [0u8; TYPE_KEY_SIZE];
        self.reader.read_exact(&mut key)?;
        let key = TypeKey::from_bytes(key);
        if key.is_null() {
            return Ok(None);
        }

        let class = self
            .namespace
            .lookup(&key)
            .ok_or(CodecError::UnknownType(key))?;
        let fields = self.nested(|d| d.fields(class.entity()))?;
        let mut reader = FieldReader::new(class.name(), fields);
        Ok(Some(class.create(&mut reader)?))
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_DEPTH {
            return Err(CodecError::violation(format!(
                "nesting deeper than {} levels",
                MAX_DEPTH
            )));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }
}

/// Decode one object from `bytes` using the global namespace
pub fn decode_object(bytes: &[u8]) -> Result<Option<Box<dyn BinaryObject>>> {
    Decoder::new(bytes).object()
}

/// Decode one object and require it to be a `T`
pub fn decode_as<T: BinaryType>(bytes: &[u8]) -> Result<T> {
    let object = decode_object(bytes)?
        .ok_or_else(|| CodecError::violation("expected an object, found null"))?;
    let name = object.class().qualified_name();
    object.downcast::<T>().map(|boxed| *boxed).ok_or_else(|| {
        CodecError::violation(format!(
            "expected {}, found {}",
            T::binary_class().qualified_name(),
            name
        ))
    })
}
