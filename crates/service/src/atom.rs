//! Atom ranges

use gfxtrace_rpclib::{decode_boxed, BinaryClass, BinaryType, Field, FieldReader, Method, Result, Type, Value};

/// Half-open interval `[start, end)` of atom indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Range {
    pub start: u64,
    pub end: u64,
}

pub static RANGE_CLASS: BinaryClass = BinaryClass::new("atom", "Range", range_fields, decode_boxed::<Range>);

fn range_fields() -> Vec<Field> {
    vec![
        Field::new("Start", Type::primitive("uint64", Method::Uint64)),
        Field::new("End", Type::primitive("uint64", Method::Uint64)),
    ]
}

impl Range {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_index(&self, index: u64) -> bool {
        index >= self.start && index < self.end
    }

    /// Whether `index` falls in any of `ranges`, which must be sorted and disjoint
    pub fn contains(ranges: &[Range], index: u64) -> bool {
        let pos = ranges.partition_point(|r| r.end <= index);
        ranges.get(pos).map_or(false, |r| r.contains_index(index))
    }
}

impl BinaryType for Range {
    fn binary_class() -> &'static BinaryClass {
        &RANGE_CLASS
    }

    fn to_values(&self) -> Vec<Value> {
        vec![Value::Uint64(self.start), Value::Uint64(self.end)]
    }

    fn from_values(r: &mut FieldReader) -> Result<Self> {
        Ok(Self {
            start: r.uint64()?,
            end: r.uint64()?,
        })
    }
}
