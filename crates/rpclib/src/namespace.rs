//! Type Namespace
//!
//! Maps type keys to their codec singletons so polymorphic fields can be
//! decoded without knowing the concrete type up front. Types are added
//! during an explicit registration pass at startup; entries are never
//! removed.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{CodecError, Result};
use crate::object::BinaryClass;
use crate::schema::TypeKey;

static GLOBAL: Lazy<Namespace> = Lazy::new(Namespace::new);

/// Registry of decodable classes
pub struct Namespace {
    classes: RwLock<HashMap<TypeKey, &'static BinaryClass>>,
}

impl Namespace {
    /// Create an empty namespace
    pub fn new() -> Self {
        Self {
            classes: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide namespace
    pub fn global() -> &'static Namespace {
        &GLOBAL
    }

    /// Register a class under its type key
    ///
    /// Registering the same class twice is a no-op. A different class whose
    /// key collides with an existing entry is rejected.
    pub fn register(&self, class: &'static BinaryClass) -> Result<()> {
        let key = class.key();
        let mut classes = self.classes.write();

        if let Some(existing) = classes.get(&key) {
            if std::ptr::eq(*existing, class) {
                return Ok(());
            }
            return Err(CodecError::RegistrationConflict {
                key,
                existing: existing.qualified_name(),
                attempted: class.qualified_name(),
            });
        }

        debug!("Registered {} as {}", class.qualified_name(), key);
        classes.insert(key, class);
        Ok(())
    }

    /// Register several classes, stopping at the first conflict
    pub fn register_all(&self, classes: &[&'static BinaryClass]) -> Result<()> {
        for class in classes {
            self.register(class)?;
        }
        Ok(())
    }

    /// Find the class registered under `key`
    pub fn lookup(&self, key: &TypeKey) -> Option<&'static BinaryClass> {
        self.classes.read().get(key).copied()
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.classes.read().contains_key(key)
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new()
    }
}
