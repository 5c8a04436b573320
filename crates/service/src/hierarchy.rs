//! Atom hierarchies
//!
//! Each hierarchy groups the atoms of one context under a name.

use gfxtrace_rpclib::{decode_boxed, BinaryClass, BinaryType, Field, FieldReader, Method, Result, Type, Value};

use crate::id::ContextID;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Hierarchy {
    pub name: String,
    pub context: ContextID,
}

pub static HIERARCHY_CLASS: BinaryClass =
    BinaryClass::new("service", "Hierarchy", hierarchy_fields, decode_boxed::<Hierarchy>);

fn hierarchy_fields() -> Vec<Field> {
    vec![
        Field::new("Name", Type::primitive("string", Method::String)),
        Field::new("Context", ContextID::field_type()),
    ]
}

impl Hierarchy {
    pub fn new(name: impl Into<String>, context: ContextID) -> Self {
        Self {
            name: name.into(),
            context,
        }
    }
}

impl BinaryType for Hierarchy {
    fn binary_class() -> &'static BinaryClass {
        &HIERARCHY_CLASS
    }

    fn to_values(&self) -> Vec<Value> {
        vec![Value::String(self.name.clone()), self.context.to_value()]
    }

    fn from_values(r: &mut FieldReader) -> Result<Self> {
        Ok(Self {
            name: r.string()?,
            context: ContextID::read(r)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HierarchyList {
    pub hierarchies: Vec<Hierarchy>,
}

pub static HIERARCHY_LIST_CLASS: BinaryClass =
    BinaryClass::new("service", "HierarchyList", hierarchy_list_fields, decode_boxed::<HierarchyList>);

fn hierarchy_list_fields() -> Vec<Field> {
    vec![Field::new("Hierarchies", Type::slice("", Type::Struct(&HIERARCHY_CLASS)))]
}

impl HierarchyList {
    pub fn new(hierarchies: Vec<Hierarchy>) -> Self {
        Self { hierarchies }
    }

    pub fn get(&self, index: usize) -> Option<&Hierarchy> {
        self.hierarchies.get(index)
    }

    /// Number of hierarchies in this list
    pub fn count(&self) -> usize {
        self.hierarchies.len()
    }

    /// The hierarchy most like `old`
    ///
    /// Prefers a match on both context and name, then the first match on
    /// context alone, then the first hierarchy in the list.
    pub fn find_similar(&self, old: Option<&Hierarchy>) -> Option<&Hierarchy> {
        if let Some(old) = old {
            let mut first_matching = None;
            for hierarchy in self.hierarchies.iter().filter(|h| h.context == old.context) {
                if hierarchy.name == old.name {
                    return Some(hierarchy);
                }
                first_matching.get_or_insert(hierarchy);
            }
            if first_matching.is_some() {
                return first_matching;
            }
        }
        self.hierarchies.first()
    }

    pub fn first_with_context(&self, context: &ContextID) -> Option<&Hierarchy> {
        self.hierarchies.iter().find(|h| &h.context == context)
    }
}

impl BinaryType for HierarchyList {
    fn binary_class() -> &'static BinaryClass {
        &HIERARCHY_LIST_CLASS
    }

    fn to_values(&self) -> Vec<Value> {
        vec![Value::structs(&self.hierarchies)]
    }

    fn from_values(r: &mut FieldReader) -> Result<Self> {
        Ok(Self {
            hierarchies: r.structs()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list() -> HierarchyList {
        let a = ContextID([1; 20]);
        let b = ContextID([2; 20]);
        HierarchyList::new(vec![
            Hierarchy::new("frames", a),
            Hierarchy::new("draws", b),
            Hierarchy::new("frames", b),
        ])
    }

    #[test]
    fn test_find_similar_prefers_name_and_context() {
        let list = list();
        let old = Hierarchy::new("frames", ContextID([2; 20]));
        assert_eq!(list.find_similar(Some(&old)), list.get(2));
    }

    #[test]
    fn test_find_similar_falls_back_to_context() {
        let list = list();
        let old = Hierarchy::new("passes", ContextID([2; 20]));
        assert_eq!(list.find_similar(Some(&old)), list.get(1));
    }

    #[test]
    fn test_find_similar_falls_back_to_first() {
        let list = list();
        let old = Hierarchy::new("frames", ContextID([9; 20]));
        assert_eq!(list.find_similar(Some(&old)), list.get(0));
        assert_eq!(list.find_similar(None), list.get(0));
        assert_eq!(HierarchyList::default().find_similar(None), None);
    }

    #[test]
    fn test_first_with_context() {
        let list = list();
        assert_eq!(list.first_with_context(&ContextID([2; 20])), list.get(1));
        assert!(list.first_with_context(&ContextID::INVALID).is_none());
        assert_eq!(list.count(), 3);
    }
}
