//! Binary Objects
//!
//! [`BinaryObject`] is the object-safe face of a serializable value: enough
//! to encode it, compare it and recover the concrete type. Concrete types
//! implement [`BinaryType`] and get `BinaryObject` for free.

use std::any::Any;
use std::fmt;

use once_cell::sync::OnceCell;

use crate::error::Result;
use crate::schema::{Entity, Field, TypeKey};
use crate::value::{FieldReader, Value};

/// Builds a class's field list on first use
pub type FieldsFn = fn() -> Vec<Field>;

/// Rebuilds an object from its decoded field values
pub type DecodeFn = fn(&mut FieldReader) -> Result<Box<dyn BinaryObject>>;

/// Codec singleton for one serializable type
///
/// Declared as a `static`; the entity is built lazily so classes may
/// reference each other (and themselves) in their field lists.
pub struct BinaryClass {
    package: &'static str,
    name: &'static str,
    fields: FieldsFn,
    decode: DecodeFn,
    entity: OnceCell<Entity>,
}

impl BinaryClass {
    pub const fn new(
        package: &'static str,
        name: &'static str,
        fields: FieldsFn,
        decode: DecodeFn,
    ) -> Self {
        Self {
            package,
            name,
            fields,
            decode,
            entity: OnceCell::new(),
        }
    }

    pub fn package(&self) -> &'static str {
        self.package
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.package, self.name)
    }

    pub fn entity(&self) -> &Entity {
        self.entity
            .get_or_init(|| Entity::new(self.package, self.name, (self.fields)()))
    }

    pub fn key(&self) -> TypeKey {
        self.entity().key()
    }

    /// Construct an instance from values laid out in entity order
    pub fn create(&self, reader: &mut FieldReader) -> Result<Box<dyn BinaryObject>> {
        let object = (self.decode)(reader)?;
        reader.finish()?;
        Ok(object)
    }
}

impl fmt::Debug for BinaryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BinaryClass({}.{})", self.package, self.name)
    }
}

/// Object-safe view of a serializable value
pub trait BinaryObject: Any + fmt::Debug + Send + Sync {
    /// The codec singleton for this object's concrete type
    fn class(&self) -> &'static BinaryClass;

    /// Field values in entity order
    fn field_values(&self) -> Vec<Value>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn clone_object(&self) -> Box<dyn BinaryObject>;

    /// Equality as the concrete type defines it
    fn dyn_eq(&self, other: &dyn BinaryObject) -> bool;
}

/// A concrete serializable type
///
/// `to_values` and `from_values` must agree with the field order of the
/// class's entity.
pub trait BinaryType: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    fn binary_class() -> &'static BinaryClass;

    fn to_values(&self) -> Vec<Value>;

    fn from_values(reader: &mut FieldReader) -> Result<Self>;
}

impl<T: BinaryType> BinaryObject for T {
    fn class(&self) -> &'static BinaryClass {
        T::binary_class()
    }

    fn field_values(&self) -> Vec<Value> {
        self.to_values()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_object(&self) -> Box<dyn BinaryObject> {
        Box::new(self.clone())
    }

    fn dyn_eq(&self, other: &dyn BinaryObject) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }
}

/// Generic [`DecodeFn`] for any [`BinaryType`]
pub fn decode_boxed<T: BinaryType>(reader: &mut FieldReader) -> Result<Box<dyn BinaryObject>> {
    Ok(Box::new(T::from_values(reader)?))
}

impl dyn BinaryObject {
    pub fn is<T: BinaryObject>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: BinaryObject>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Recover the concrete type, `None` if the object is something else
    pub fn downcast<T: BinaryObject>(self: Box<Self>) -> Option<Box<T>> {
        self.into_any().downcast::<T>().ok()
    }
}

impl Clone for Box<dyn BinaryObject> {
    fn clone(&self) -> Self {
        self.clone_object()
    }
}

impl PartialEq for dyn BinaryObject {
    fn eq(&self, other: &Self) -> bool {
        self.dyn_eq(other)
    }
}
