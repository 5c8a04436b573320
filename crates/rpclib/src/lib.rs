//! GfxTrace RPC Library - Binary object codec
//!
//! A reflection-free serialization scheme for graphs of typed records.
//!
//! ## Model
//!
//! - Every serializable type implements [`BinaryType`] and owns a static
//!   [`BinaryClass`], whose [`Entity`] lists the fields in wire order.
//! - Field types are drawn from the closed [`Type`] set: primitives, fixed
//!   arrays, slices, nested structs, pointers and interfaces.
//! - One generic [`Encoder`]/[`Decoder`] pair walks those descriptors; no
//!   type carries hand-written byte handling.
//! - Objects travel as a 20-byte [`TypeKey`] followed by their body. The
//!   decoder resolves the key through the [`Namespace`], so interface
//!   fields decode to their concrete type.

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod namespace;
pub mod object;
pub mod schema;
pub mod value;

pub use decoder::{decode_as, decode_object, Decoder};
pub use encoder::{encode_object, Encoder};
pub use error::{CodecError, Result};
pub use namespace::Namespace;
pub use object::{decode_boxed, BinaryClass, BinaryObject, BinaryType};
pub use schema::{Entity, Field, Method, Type, TypeKey, TYPE_KEY_SIZE};
pub use value::{FieldReader, Value};

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Point {
        x: i32,
        y: i32,
    }

    static POINT: BinaryClass = BinaryClass::new("test", "Point", point_fields, decode_boxed::<Point>);

    fn point_fields() -> Vec<Field> {
        vec![
            Field::new("X", Type::primitive("int32", Method::Int32)),
            Field::new("Y", Type::primitive("int32", Method::Int32)),
        ]
    }

    impl BinaryType for Point {
        fn binary_class() -> &'static BinaryClass {
            &POINT
        }

        fn to_values(&self) -> Vec<Value> {
            vec![Value::Int32(self.x), Value::Int32(self.y)]
        }

        fn from_values(r: &mut FieldReader) -> Result<Self> {
            Ok(Self {
                x: r.int32()?,
                y: r.int32()?,
            })
        }
    }

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Label {
        text: String,
    }

    static LABEL: BinaryClass = BinaryClass::new("test", "Label", label_fields, decode_boxed::<Label>);

    fn label_fields() -> Vec<Field> {
        vec![Field::new("Text", Type::primitive("string", Method::String))]
    }

    impl BinaryType for Label {
        fn binary_class() -> &'static BinaryClass {
            &LABEL
        }

        fn to_values(&self) -> Vec<Value> {
            vec![Value::String(self.text.clone())]
        }

        fn from_values(r: &mut FieldReader) -> Result<Self> {
            Ok(Self { text: r.string()? })
        }
    }

    /// Exercises every descriptor kind at once
    #[derive(Debug, Clone, Default)]
    struct Shape {
        id: [u8; 4],
        origin: Point,
        outline: Vec<Point>,
        parent: Option<Box<Shape>>,
        tag: Option<Box<dyn BinaryObject>>,
        visible: bool,
        scale: f64,
    }

    impl PartialEq for Shape {
        fn eq(&self, other: &Self) -> bool {
            let tags_equal = match (&self.tag, &other.tag) {
                (Some(a), Some(b)) => a.dyn_eq(&**b),
                (None, None) => true,
                _ => false,
            };
            self.id == other.id
                && self.origin == other.origin
                && self.outline == other.outline
                && self.parent == other.parent
                && tags_equal
                && self.visible == other.visible
                && self.scale == other.scale
        }
    }

    static SHAPE: BinaryClass = BinaryClass::new("test", "Shape", shape_fields, decode_boxed::<Shape>);

    fn shape_fields() -> Vec<Field> {
        vec![
            Field::new("ID", Type::id("ShapeID", 4)),
            Field::new("Origin", Type::Struct(&POINT)),
            Field::new("Outline", Type::slice("", Type::Struct(&POINT))),
            Field::new("Parent", Type::Pointer(&SHAPE)),
            Field::new("Tag", Type::Interface("Tag")),
            Field::new("Visible", Type::primitive("bool", Method::Bool)),
            Field::new("Scale", Type::primitive("float64", Method::Float64)),
        ]
    }

    impl BinaryType for Shape {
        fn binary_class() -> &'static BinaryClass {
            &SHAPE
        }

        fn to_values(&self) -> Vec<Value> {
            vec![
                Value::bytes(&self.id),
                Value::structure(&self.origin),
                Value::structs(&self.outline),
                Value::optional(self.parent.as_deref().map(|p| p as &dyn BinaryObject)),
                Value::optional(self.tag.as_deref()),
                Value::Bool(self.visible),
                Value::Float64(self.scale),
            ]
        }

        fn from_values(r: &mut FieldReader) -> Result<Self> {
            Ok(Self {
                id: r.bytes()?,
                origin: r.structure()?,
                outline: r.structs()?,
                parent: r.pointer::<Shape>()?.map(Box::new),
                tag: r.object()?,
                visible: r.bool()?,
                scale: r.float64()?,
            })
        }
    }

    fn namespace() -> Namespace {
        let namespace = Namespace::new();
        namespace.register_all(&[&POINT, &LABEL, &SHAPE]).unwrap();
        namespace
    }

    fn round_trip(object: &dyn BinaryObject, namespace: &Namespace) -> Box<dyn BinaryObject> {
        let bytes = encode_object(object).unwrap();
        Decoder::with_namespace(&bytes[..], namespace)
            .object()
            .unwrap()
            .unwrap()
    }

    fn sample() -> Shape {
        Shape {
            id: [1, 2, 3, 4],
            origin: Point { x: -5, y: 7 },
            outline: vec![Point { x: 0, y: 0 }, Point { x: 10, y: 20 }],
            parent: Some(Box::new(Shape {
                id: [9, 9, 9, 9],
                scale: 0.5,
                ..Default::default()
            })),
            tag: Some(Box::new(Label { text: "wheel".into() })),
            visible: true,
            scale: 2.25,
        }
    }

    #[test]
    fn test_round_trip_all_descriptor_kinds() {
        let namespace = namespace();
        let shape = sample();

        let decoded = round_trip(&shape, &namespace);
        let decoded = decoded.downcast_ref::<Shape>().unwrap();
        assert_eq!(decoded, &shape);
    }

    #[test]
    fn test_interface_keeps_concrete_type() {
        let namespace = namespace();
        let mut shape = sample();
        shape.tag = Some(Box::new(Point { x: 3, y: 4 }));

        let decoded = round_trip(&shape, &namespace);
        let tag = decoded.downcast_ref::<Shape>().unwrap().tag.as_ref().unwrap();
        assert_eq!(tag.class().key(), POINT.key());
        assert_eq!(tag.downcast_ref::<Point>(), Some(&Point { x: 3, y: 4 }));
    }

    #[test]
    fn test_decoding_unregistered_type_fails() {
        let namespace = Namespace::new();
        namespace.register(&SHAPE).unwrap();
        namespace.register(&POINT).unwrap();

        // Label is not registered, so the tag cannot be resolved
        let bytes = encode_object(&sample()).unwrap();
        let err = Decoder::with_namespace(&bytes[..], &namespace)
            .object()
            .unwrap_err();
        assert!(matches!(err, CodecError::UnknownType(key) if key == LABEL.key()));
    }

    #[test]
    fn test_pointer_rejects_other_class() {
        let mut values = sample().to_values();
        values[3] = Value::object(&Label { text: "nope".into() });

        let mut encoder = Encoder::new(Vec::new());
        let err = encoder.fields(SHAPE.entity(), &values).unwrap_err();
        assert!(matches!(err, CodecError::SchemaViolation(_)));
    }

    #[test]
    fn test_truncated_object() {
        let namespace = namespace();
        let bytes = encode_object(&sample()).unwrap();
        let err = Decoder::with_namespace(&bytes[..bytes.len() - 3], &namespace)
            .object()
            .unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedEndOfStream));
    }

    #[test]
    fn test_struct_value_has_no_key() {
        let mut encoder = Encoder::new(Vec::new());
        encoder.struct_value(&Point { x: 1, y: 2 }).unwrap();
        let bytes = encoder.into_inner();
        assert_eq!(bytes, vec![1, 0, 0, 0, 2, 0, 0, 0]);

        let point: Point = Decoder::new(&bytes[..]).struct_value().unwrap();
        assert_eq!(point, Point { x: 1, y: 2 });
    }

    #[test]
    fn test_register_is_idempotent() {
        let namespace = Namespace::new();
        namespace.register(&POINT).unwrap();
        namespace.register(&POINT).unwrap();
        assert_eq!(namespace.len(), 1);
        assert!(namespace.contains(&POINT.key()));
    }

    #[test]
    fn test_register_conflict() {
        static IMPOSTOR: BinaryClass =
            BinaryClass::new("test", "Point", point_fields, decode_boxed::<Point>);

        let namespace = Namespace::new();
        namespace.register(&POINT).unwrap();
        let err = namespace.register(&IMPOSTOR).unwrap_err();
        assert!(matches!(err, CodecError::RegistrationConflict { .. }));
        assert!(std::ptr::eq(namespace.lookup(&POINT.key()).unwrap(), &POINT));
    }

    #[test]
    fn test_field_count_mismatch() {
        let mut encoder = Encoder::new(Vec::new());
        let err = encoder
            .fields(POINT.entity(), &[Value::Int32(1)])
            .unwrap_err();
        assert!(matches!(err, CodecError::SchemaViolation(_)));
    }
}
