//! Object paths
//!
//! A path names an object in the service by chaining segments from a
//! capture root, e.g. `capture<id>.Contexts<id>`.

use gfxtrace_rpclib::{
    decode_boxed, BinaryClass, BinaryObject, BinaryType, Field, FieldReader, Result, Type, Value,
};

use crate::id::{CaptureID, ContextID};

/// A node in a path chain
pub trait Path {
    /// This node's own segment
    fn segment_string(&self) -> String;

    fn parent(&self) -> Option<&dyn Path>;

    /// Append this node's segment to a path built from its parents
    fn append_segment(&self, out: &mut String) {
        out.push('.');
        out.push_str(&self.segment_string());
    }

    /// The full path from the root
    fn path_string(&self) -> String {
        let mut out = match self.parent() {
            Some(parent) => parent.path_string(),
            None => return self.segment_string(),
        };
        self.append_segment(&mut out);
        out
    }
}

/// Root path naming a capture
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CapturePath {
    pub id: CaptureID,
}

pub static CAPTURE_PATH_CLASS: BinaryClass =
    BinaryClass::new("path", "Capture", capture_fields, decode_boxed::<CapturePath>);

fn capture_fields() -> Vec<Field> {
    vec![Field::new("ID", CaptureID::field_type())]
}

impl CapturePath {
    pub fn new(id: CaptureID) -> Self {
        Self { id }
    }

    /// Path to this capture's context list
    pub fn contexts(&self) -> ContextsPath {
        ContextsPath {
            capture: Some(self.clone()),
        }
    }
}

impl Path for CapturePath {
    fn segment_string(&self) -> String {
        format!("capture<{}>", self.id)
    }

    fn parent(&self) -> Option<&dyn Path> {
        None
    }
}

impl BinaryType for CapturePath {
    fn binary_class() -> &'static BinaryClass {
        &CAPTURE_PATH_CLASS
    }

    fn to_values(&self) -> Vec<Value> {
        vec![self.id.to_value()]
    }

    fn from_values(r: &mut FieldReader) -> Result<Self> {
        Ok(Self {
            id: CaptureID::read(r)?,
        })
    }
}

/// The contexts of a capture
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContextsPath {
    pub capture: Option<CapturePath>,
}

pub static CONTEXTS_PATH_CLASS: BinaryClass =
    BinaryClass::new("path", "Contexts", contexts_fields, decode_boxed::<ContextsPath>);

fn contexts_fields() -> Vec<Field> {
    vec![Field::new("Capture", Type::Pointer(&CAPTURE_PATH_CLASS))]
}

impl ContextsPath {
    /// Path to the context `id` in this list
    pub fn context(&self, id: ContextID) -> ContextPath {
        ContextPath {
            contexts: Some(self.clone()),
            id,
        }
    }
}

impl Path for ContextsPath {
    fn segment_string(&self) -> String {
        "Contexts".to_string()
    }

    fn parent(&self) -> Option<&dyn Path> {
        self.capture.as_ref().map(|p| p as &dyn Path)
    }
}

impl BinaryType for ContextsPath {
    fn binary_class() -> &'static BinaryClass {
        &CONTEXTS_PATH_CLASS
    }

    fn to_values(&self) -> Vec<Value> {
        vec![Value::Object(self.capture.as_ref().map(BinaryObject::clone_object))]
    }

    fn from_values(r: &mut FieldReader) -> Result<Self> {
        Ok(Self {
            capture: r.pointer()?,
        })
    }
}

/// One context of a capture
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContextPath {
    pub contexts: Option<ContextsPath>,
    pub id: ContextID,
}

pub static CONTEXT_PATH_CLASS: BinaryClass =
    BinaryClass::new("path", "Context", context_fields, decode_boxed::<ContextPath>);

fn context_fields() -> Vec<Field> {
    vec![
        Field::new("Contexts", Type::Pointer(&CONTEXTS_PATH_CLASS)),
        Field::new("ID", ContextID::field_type()),
    ]
}

impl Path for ContextPath {
    fn segment_string(&self) -> String {
        format!("<{}>", self.id)
    }

    fn parent(&self) -> Option<&dyn Path> {
        self.contexts.as_ref().map(|p| p as &dyn Path)
    }

    // Indexes its parent rather than naming a member
    fn append_segment(&self, out: &mut String) {
        out.push_str(&self.segment_string());
    }
}

impl BinaryType for ContextPath {
    fn binary_class() -> &'static BinaryClass {
        &CONTEXT_PATH_CLASS
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Object(self.contexts.as_ref().map(BinaryObject::clone_object)),
            self.id.to_value(),
        ]
    }

    fn from_values(r: &mut FieldReader) -> Result<Self> {
        Ok(Self {
            contexts: r.pointer()?,
            id: ContextID::read(r)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_path() -> ContextPath {
        CapturePath::new(CaptureID([0xaa; 20]))
            .contexts()
            .context(ContextID([0x01; 20]))
    }

    #[test]
    fn test_path_string() {
        let path = context_path();
        assert_eq!(
            path.path_string(),
            format!("capture<{}>.Contexts<{}>", "aa".repeat(20), "01".repeat(20))
        );
    }

    #[test]
    fn test_segments_and_parents() {
        let path = context_path();
        assert_eq!(path.segment_string(), format!("<{}>", "01".repeat(20)));

        let contexts = path.parent().unwrap();
        assert_eq!(contexts.segment_string(), "Contexts");
        let capture = contexts.parent().unwrap();
        assert!(capture.parent().is_none());
    }

    #[test]
    fn test_detached_context_path() {
        let path = ContextPath {
            contexts: None,
            id: ContextID([2; 20]),
        };
        assert_eq!(path.path_string(), format!("<{}>", "02".repeat(20)));
    }
}
