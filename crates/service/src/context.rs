//! Graphics contexts
//!
//! A context owns the atoms issued against it. Two contexts are the same
//! context when their IDs match; name, API and ranges are descriptive and
//! do not take part in equality.

use std::fmt;
use std::hash::{Hash, Hasher};

use gfxtrace_rpclib::{decode_boxed, BinaryClass, BinaryType, Field, FieldReader, Method, Result, Type, Value};

use crate::atom::{Range, RANGE_CLASS};
use crate::id::{ApiID, ContextID};

/// Display name of the context covering every atom
pub const ALL_CONTEXTS: &str = "All contexts";

#[derive(Debug, Clone, Default)]
pub struct Context {
    pub id: ContextID,
    pub name: String,
    pub api: ApiID,
    pub ranges: Vec<Range>,
}

pub static CONTEXT_CLASS: BinaryClass =
    BinaryClass::new("service", "Context", context_fields, decode_boxed::<Context>);

fn context_fields() -> Vec<Field> {
    vec![
        Field::new("ID", ContextID::field_type()),
        Field::new("Name", Type::primitive("string", Method::String)),
        Field::new("Api", ApiID::field_type()),
        Field::new("Ranges", Type::slice("atom.RangeList", Type::Struct(&RANGE_CLASS))),
    ]
}

impl Context {
    pub fn new(id: ContextID, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_api(mut self, api: ApiID) -> Self {
        self.api = api;
        self
    }

    pub fn with_ranges(mut self, ranges: Vec<Range>) -> Self {
        self.ranges = ranges;
        self
    }

    /// The context that stands for every context
    pub fn all() -> Self {
        Self::new(ContextID::INVALID, ALL_CONTEXTS)
    }

    pub fn is_all(&self) -> bool {
        self.id == ContextID::INVALID
    }

    /// Whether the atom at `index` belongs to this context
    pub fn contains(&self, index: u64) -> bool {
        self.is_all() || Range::contains(&self.ranges, index)
    }

    /// Atom ranges of this context in a capture of `atom_count` atoms
    pub fn ranges_for(&self, atom_count: u64) -> Vec<Range> {
        if self.is_all() {
            vec![Range::new(0, atom_count)]
        } else {
            self.ranges.clone()
        }
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Context {}

impl Hash for Context {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl BinaryType for Context {
    fn binary_class() -> &'static BinaryClass {
        &CONTEXT_CLASS
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            self.id.to_value(),
            Value::String(self.name.clone()),
            self.api.to_value(),
            Value::structs(&self.ranges),
        ]
    }

    fn from_values(r: &mut FieldReader) -> Result<Self> {
        Ok(Self {
            id: ContextID::read(r)?,
            name: r.string()?,
            api: ApiID::read(r)?,
            ranges: r.structs()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_uses_id_only() {
        let id = ContextID([7; 20]);
        let a = Context::new(id, "GL context").with_ranges(vec![Range::new(0, 5)]);
        let b = Context::new(id, "renamed");
        let c = Context::new(ContextID([8; 20]), "GL context");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_all_contains_everything() {
        let all = Context::all();
        assert!(all.contains(0));
        assert!(all.contains(u64::MAX));
        assert_eq!(all.ranges_for(42), vec![Range::new(0, 42)]);
        assert_eq!(all.to_string(), ALL_CONTEXTS);
    }

    #[test]
    fn test_contains_uses_ranges() {
        let ctx = Context::new(ContextID([1; 20]), "ctx")
            .with_ranges(vec![Range::new(2, 4), Range::new(8, 9)]);
        assert!(ctx.contains(3));
        assert!(!ctx.contains(5));
        assert!(ctx.contains(8));
        assert_eq!(ctx.ranges_for(100).len(), 2);
    }
}
