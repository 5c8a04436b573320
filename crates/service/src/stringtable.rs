//! String tables
//!
//! Localizable messages are trees of [`Text`], [`Parameter`] and [`Block`]
//! nodes. Parameters are filled in from an argument map at render time.

use std::collections::HashMap;

use gfxtrace_rpclib::{
    decode_boxed, BinaryClass, BinaryObject, BinaryType, Field, FieldReader, Method, Result, Type,
    Value,
};

/// Interface tag of every node entity
pub const NODE_INTERFACE: &str = "Node";
/// Interface tag of every formatter entity
pub const FORMATTER_INTERFACE: &str = "Formatter";

/// Literal text
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Text {
    pub text: String,
}

pub static TEXT_CLASS: BinaryClass =
    BinaryClass::new("stringtable", "Text", text_fields, decode_boxed::<Text>);

fn text_fields() -> Vec<Field> {
    vec![Field::new("Text", Type::primitive("string", Method::String))]
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl BinaryType for Text {
    fn binary_class() -> &'static BinaryClass {
        &TEXT_CLASS
    }

    fn to_values(&self) -> Vec<Value> {
        vec![Value::String(self.text.clone())]
    }

    fn from_values(r: &mut FieldReader) -> Result<Self> {
        Ok(Self { text: r.string()? })
    }
}

/// Placeholder replaced by the argument named `key`
#[derive(Debug, Clone, Default)]
pub struct Parameter {
    pub formatter: Option<Box<dyn BinaryObject>>,
    pub key: String,
}

pub static PARAMETER_CLASS: BinaryClass =
    BinaryClass::new("stringtable", "Parameter", parameter_fields, decode_boxed::<Parameter>);

fn parameter_fields() -> Vec<Field> {
    vec![
        Field::new("Formatter", Type::Interface(FORMATTER_INTERFACE)),
        Field::new("Key", Type::primitive("string", Method::String)),
    ]
}

impl Parameter {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            formatter: None,
            key: key.into(),
        }
    }

    pub fn with_formatter<F: BinaryObject>(mut self, formatter: F) -> Self {
        self.formatter = Some(Box::new(formatter));
        self
    }

    fn render(&self, arguments: &HashMap<String, String>) -> String {
        let Some(argument) = arguments.get(&self.key) else {
            return format!("<{}>", self.key);
        };
        match self.formatter.as_deref().and_then(as_formatter) {
            Some(formatter) => formatter.format(argument),
            None => argument.clone(),
        }
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        let formatters_equal = match (&self.formatter, &other.formatter) {
            (Some(a), Some(b)) => a.dyn_eq(&**b),
            (None, None) => true,
            _ => false,
        };
        formatters_equal && self.key == other.key
    }
}

impl BinaryType for Parameter {
    fn binary_class() -> &'static BinaryClass {
        &PARAMETER_CLASS
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::optional(self.formatter.as_deref()),
            Value::String(self.key.clone()),
        ]
    }

    fn from_values(r: &mut FieldReader) -> Result<Self> {
        Ok(Self {
            formatter: r.object()?,
            key: r.string()?,
        })
    }
}

/// Sequence of child nodes rendered back to back
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub children: Vec<Box<dyn BinaryObject>>,
}

pub static BLOCK_CLASS: BinaryClass =
    BinaryClass::new("stringtable", "Block", block_fields, decode_boxed::<Block>);

fn block_fields() -> Vec<Field> {
    vec![Field::new(
        "Children",
        Type::slice("", Type::Interface(NODE_INTERFACE)),
    )]
}

impl Block {
    pub fn new(children: Vec<Box<dyn BinaryObject>>) -> Self {
        Self { children }
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.dyn_eq(&**b))
    }
}

impl BinaryType for Block {
    fn binary_class() -> &'static BinaryClass {
        &BLOCK_CLASS
    }

    fn to_values(&self) -> Vec<Value> {
        vec![Value::Slice(
            self.children
                .iter()
                .map(|child| Value::optional(Some(&**child)))
                .collect(),
        )]
    }

    fn from_values(r: &mut FieldReader) -> Result<Self> {
        Ok(Self {
            children: r.objects()?,
        })
    }
}

/// Formats a parameter argument
pub trait Formatter {
    fn format(&self, argument: &str) -> String;
}

/// Cuts arguments longer than `max_len` characters, marking the cut with `...`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Truncate {
    pub max_len: u32,
}

pub static TRUNCATE_CLASS: BinaryClass =
    BinaryClass::new("stringtable", "Truncate", truncate_fields, decode_boxed::<Truncate>);

fn truncate_fields() -> Vec<Field> {
    vec![Field::new("MaxLen", Type::primitive("uint32", Method::Uint32))]
}

impl Formatter for Truncate {
    fn format(&self, argument: &str) -> String {
        let max_len = self.max_len as usize;
        if argument.chars().count() <= max_len {
            return argument.to_string();
        }
        let mut out: String = argument.chars().take(max_len).collect();
        out.push_str("...");
        out
    }
}

impl BinaryType for Truncate {
    fn binary_class() -> &'static BinaryClass {
        &TRUNCATE_CLASS
    }

    fn to_values(&self) -> Vec<Value> {
        vec![Value::Uint32(self.max_len)]
    }

    fn from_values(r: &mut FieldReader) -> Result<Self> {
        Ok(Self {
            max_len: r.uint32()?,
        })
    }
}

fn as_formatter(object: &dyn BinaryObject) -> Option<&dyn Formatter> {
    object.downcast_ref::<Truncate>().map(|t| t as &dyn Formatter)
}

/// Render a node tree, substituting `arguments` into its parameters
///
/// Objects that are not string table nodes render as nothing.
pub fn node_string(node: &dyn BinaryObject, arguments: &HashMap<String, String>) -> String {
    let mut out = String::new();
    append_node(node, arguments, &mut out);
    out
}

fn append_node(node: &dyn BinaryObject, arguments: &HashMap<String, String>, out: &mut String) {
    if let Some(text) = node.downcast_ref::<Text>() {
        out.push_str(&text.text);
    } else if let Some(parameter) = node.downcast_ref::<Parameter>() {
        out.push_str(&parameter.render(arguments));
    } else if let Some(block) = node.downcast_ref::<Block>() {
        for child in &block.children {
            append_node(&**child, arguments, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arguments(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn message() -> Block {
        Block::new(vec![
            Box::new(Text::new("Texture ")),
            Box::new(Parameter::new("name").with_formatter(Truncate { max_len: 4 })),
            Box::new(Text::new(" is ")),
            Box::new(Parameter::new("state")),
        ])
    }

    #[test]
    fn test_node_string_substitutes_arguments() {
        let args = arguments(&[("name", "sky"), ("state", "bound")]);
        assert_eq!(node_string(&message(), &args), "Texture sky is bound");
    }

    #[test]
    fn test_missing_argument_renders_key() {
        let args = arguments(&[("name", "sky")]);
        assert_eq!(node_string(&message(), &args), "Texture sky is <state>");
    }

    #[test]
    fn test_formatter_applied() {
        let args = arguments(&[("name", "skybox_front"), ("state", "bound")]);
        assert_eq!(node_string(&message(), &args), "Texture skyb... is bound");
    }

    #[test]
    fn test_truncate_counts_characters() {
        let truncate = Truncate { max_len: 2 };
        assert_eq!(truncate.format("éàü"), "éà...");
        assert_eq!(truncate.format("ab"), "ab");
    }

    #[test]
    fn test_nested_blocks() {
        let inner = Block::new(vec![Box::new(Text::new("b")), Box::new(Text::new("c"))]);
        let outer = Block::new(vec![Box::new(Text::new("a")), Box::new(inner)]);
        assert_eq!(node_string(&outer, &HashMap::new()), "abc");
    }
}
