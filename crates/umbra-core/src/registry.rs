//! Type registry mapping type tags to constructor functions.
//!
//! Populated once at start-up; afterwards objects are created by tag.

use std::collections::BTreeMap;

use crate::error::{Result, UmbraError};

/// Constructor stored in a [`TypeRegistry`].
pub type Factory<C, T> = fn(&mut C) -> Result<T>;

/// Registry of constructors keyed by type tag.
///
/// `C` is the construction context handed to every factory (devices,
/// options...), `T` is what the factories produce.
pub struct TypeRegistry<C, T> {
    factories: BTreeMap<&'static str, Factory<C, T>>,
}

impl<C, T> Default for TypeRegistry<C, T> {
    fn default() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }
}

impl<C, T> TypeRegistry<C, T> {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructor.
    ///
    /// Returns an error if the tag is already taken.
    pub fn register(&mut self, tag: &'static str, factory: Factory<C, T>) -> Result<()> {
        if self.factories.contains_key(tag) {
            return Err(UmbraError::TypeExists(tag.to_string()));
        }
        self.factories.insert(tag, factory);
        log::trace!("registered type '{tag}'");
        Ok(())
    }

    /// Creates an object by tag.
    pub fn create(&self, tag: &str, context: &mut C) -> Result<T> {
        let factory = self
            .factories
            .get(tag)
            .ok_or_else(|| UmbraError::TypeNotFound(tag.to_string()))?;
        factory(context)
    }

    /// Checks if a tag is registered.
    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    /// Returns all registered tags in sorted order.
    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    /// Returns the number of registered tags.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
