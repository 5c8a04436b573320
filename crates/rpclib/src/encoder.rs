//! Binary Encoder
//!
//! Writes values against their type descriptors. Scalars are fixed width
//! and little-endian, strings and slices carry a `u32` length prefix,
//! arrays carry none.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{CodecError, Result};
use crate::object::BinaryObject;
use crate::schema::{Entity, Method, Type, TypeKey};
use crate::value::Value;

/// Schema-driven writer over any byte sink
pub struct Encoder<W: Write> {
    writer: W,
}

impl<W: Write> Encoder<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn bool(&mut self, v: bool) -> Result<()> {
        self.writer.write_u8(v as u8)?;
        Ok(())
    }

    pub fn int8(&mut self, v: i8) -> Result<()> {
        self.writer.write_i8(v)?;
        Ok(())
    }

    pub fn uint8(&mut self, v: u8) -> Result<()> {
        self.writer.write_u8(v)?;
        Ok(())
    }

    pub fn int16(&mut self, v: i16) -> Result<()> {
        self.writer.write_i16::<LittleEndian>(v)?;
        Ok(())
    }

    pub fn uint16(&mut self, v: u16) -> Result<()> {
        self.writer.write_u16::<LittleEndian>(v)?;
        Ok(())
    }

    pub fn int32(&mut self, v: i32) -> Result<()> {
        self.writer.write_i32::<LittleEndian>(v)?;
        Ok(())
    }

    pub fn uint32(&mut self, v: u32) -> Result<()> {
        self.writer.write_u32::<LittleEndian>(v)?;
        Ok(())
    }

    pub fn int64(&mut self, v: i64) -> Result<()> {
        self.writer.write_i64::<LittleEndian>(v)?;
        Ok(())
    }

    pub fn uint64(&mut self, v: u64) -> Result<()> {
        self.writer.write_u64::<LittleEndian>(v)?;
        Ok(())
    }

    pub fn float32(&mut self, v: f32) -> Result<()> {
        self.writer.write_f32::<LittleEndian>(v)?;
        Ok(())
    }

    pub fn float64(&mut self, v: f64) -> Result<()> {
        self.writer.write_f64::<LittleEndian>(v)?;
        Ok(())
    }

    /// `u32` byte length followed by the UTF-8 bytes
    pub fn string(&mut self, v: &str) -> Result<()> {
        self.length(v.len())?;
        self.writer.write_all(v.as_bytes())?;
        Ok(())
    }

    fn length(&mut self, len: usize) -> Result<()> {
        let len = u32::try_from(len)
            .map_err(|_| CodecError::Encoding(format!("length {} does not fit in 32 bits", len)))?;
        self.uint32(len)
    }

    /// Write a scalar, checking it matches `method`
    pub fn primitive(&mut self, method: Method, value: &Value) -> Result<()> {
        match (method, value) {
            (Method::Bool, Value::Bool(v)) => self.bool(*v),
            (Method::Int8, Value::Int8(v)) => self.int8(*v),
            (Method::Uint8, Value::Uint8(v)) => self.uint8(*v),
            (Method::Int16, Value::Int16(v)) => self.int16(*v),
            (Method::Uint16, Value::Uint16(v)) => self.uint16(*v),
            (Method::Int32, Value::Int32(v)) => self.int32(*v),
            (Method::Uint32, Value::Uint32(v)) => self.uint32(*v),
            (Method::Int64, Value::Int64(v)) => self.int64(*v),
            (Method::Uint64, Value::Uint64(v)) => self.uint64(*v),
            (Method::Float32, Value::Float32(v)) => self.float32(*v),
            (Method::Float64, Value::Float64(v)) => self.float64(*v),
            (Method::String, Value::String(v)) => self.string(v),
            (method, value) => Err(CodecError::violation(format!(
                "cannot encode {} as {}",
                value.kind(),
                method.name()
            ))),
        }
    }

    /// Exactly `size` elements, no length prefix
    pub fn array(&mut self, element: &Type, size: usize, values: &[Value]) -> Result<()> {
        if values.len() != size {
            return Err(CodecError::violation(format!(
                "array declared with {} elements holds {}",
                size,
                values.len()
            )));
        }
        for value in values {
            self.value(element, value)?;
        }
        Ok(())
    }

    /// `u32` count followed by each element
    pub fn slice(&mut self, element: &Type, values: &[Value]) -> Result<()> {
        self.length(values.len())?;
        for value in values {
            self.value(element, value)?;
        }
        Ok(())
    }

    /// Write `value` as described by `ty`
    pub fn value(&mut self, ty: &Type, value: &Value) -> Result<()> {
        match (ty, value) {
            (Type::Primitive { method, .. }, value) => self.primitive(*method, value),
            (Type::Array { element, size, .. }, Value::Array(values)) => {
                self.array(element, *size, values)
            }
            (Type::Slice { element, .. }, Value::Slice(values)) => self.slice(element, values),
            (Type::Struct(class), Value::Struct(fields)) => self.fields(class.entity(), fields),
            (Type::Pointer(class), Value::Object(object)) => {
                if let Some(object) = object {
                    if object.class().key() != class.key() {
                        return Err(CodecError::violation(format!(
                            "pointer to {} holds {}",
                            class.qualified_name(),
                            object.class().qualified_name()
                        )));
                    }
                }
                self.object(object.as_deref())
            }
            (Type::Interface(_), Value::Object(object)) => self.object(object.as_deref()),
            (ty, value) => Err(CodecError::violation(format!(
                "cannot encode {} as {}",
                value.kind(),
                ty.signature()
            ))),
        }
    }

    /// Write an entity body: each field in declaration order
    pub fn fields(&mut self, entity: &Entity, values: &[Value]) -> Result<()> {
        if values.len() != entity.fields().len() {
            return Err(CodecError::violation(format!(
                "{} has {} fields, got {} values",
                entity.qualified_name(),
                entity.fields().len(),
                values.len()
            )));
        }
        for (field, value) in entity.fields().iter().zip(values) {
            self.value(&field.ty, value)?;
        }
        Ok(())
    }

    /// Write an object body without its type key
    pub fn struct_value(&mut self, object: &dyn BinaryObject) -> Result<()> {
        self.fields(object.class().entity(), &object.field_values())
    }

    /// Write an object's type key followed by its body; `None` writes the null key
    pub fn object(&mut self, object: Option<&dyn BinaryObject>) -> Result<()> {
        match object {
            None => {
                self.writer.write_all(TypeKey::NULL.as_bytes())?;
                Ok(())
            }
            Some(object) => {
                let class = object.class();
                self.writer.write_all(class.key().as_bytes())?;
                self.struct_value(object)
            }
        }
    }
}

/// Encode an object, type key included, into a fresh buffer
pub fn encode_object(object: &dyn BinaryObject) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new(Vec::new());
    encoder.object(Some(object))?;
    Ok(encoder.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitives_are_little_endian() {
        let mut e = Encoder::new(Vec::new());
        e.uint32(0x0403_0201).unwrap();
        e.uint16(0x0605).unwrap();
        e.int8(-1).unwrap();
        e.bool(true).unwrap();
        assert_eq!(e.into_inner(), vec![1, 2, 3, 4, 5, 6, 0xff, 1]);
    }

    #[test]
    fn test_string_is_length_prefixed() {
        let mut e = Encoder::new(Vec::new());
        e.string("spy").unwrap();
        assert_eq!(e.into_inner(), vec![3, 0, 0, 0, b's', b'p', b'y']);
    }

    #[test]
    fn test_array_length_mismatch() {
        let mut e = Encoder::new(Vec::new());
        let id = Type::id("ID", 20);
        let short = Value::bytes(&[0u8; 19]);

        let err = e.value(&id, &short).unwrap_err();
        assert!(matches!(err, CodecError::SchemaViolation(_)));
        // Nothing is written for a rejected array
        assert!(e.into_inner().is_empty());
    }

    #[test]
    fn test_array_writes_no_prefix() {
        let mut e = Encoder::new(Vec::new());
        e.value(&Type::id("ID", 4), &Value::bytes(&[9, 8, 7, 6])).unwrap();
        assert_eq!(e.into_inner(), vec![9, 8, 7, 6]);
    }

    #[test]
    fn test_type_mismatch() {
        let mut e = Encoder::new(Vec::new());
        let err = e
            .value(&Type::primitive("uint32", Method::Uint32), &Value::String("x".into()))
            .unwrap_err();
        assert!(matches!(err, CodecError::SchemaViolation(_)));
    }

    #[test]
    fn test_null_object() {
        let mut e = Encoder::new(Vec::new());
        e.object(None).unwrap();
        assert_eq!(e.into_inner(), vec![0u8; 20]);
    }
}
