use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;

use crate::schema::Element;

/// Computes a directive from the element it is applied to
pub type DirectiveFn = dyn Fn(&Element) -> Result<Value, MappingError>;

/// Derives a per-element property table
pub type PropertyTableFn = dyn Fn(&Element) -> Result<PropertyTable, MappingError>;

/// Failure raised inside a caller-supplied mapping function
#[derive(Debug, Clone, PartialEq, Error)]
#[error("mapping function failed: {message}")]
pub struct MappingError {
    pub message: String,
}

impl MappingError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// How a single property is rewritten
#[derive(Clone)]
pub enum Directive {
    /// Move the value under a new property name
    Rename(String),
    /// Drop the property, adding nothing in its place
    Delete,
    /// Ask a function for the new name. A falsy answer leaves the property
    /// alone; it never deletes.
    Computed(Rc<DirectiveFn>),
}

impl Directive {
    pub fn rename(target: impl Into<String>) -> Self {
        Directive::Rename(target.into())
    }

    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Element) -> Result<Value, MappingError> + 'static,
    {
        Directive::Computed(Rc::new(f))
    }
}

impl fmt::Debug for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Rename(target) => f.debug_tuple("Rename").field(target).finish(),
            Directive::Delete => f.write_str("Delete"),
            Directive::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl From<&str> for Directive {
    fn from(target: &str) -> Self {
        Directive::Rename(target.to_string())
    }
}

impl From<String> for Directive {
    fn from(target: String) -> Self {
        Directive::Rename(target)
    }
}

/// Ordered property name to directive table. Entries apply in insertion
/// order; re-inserting a name replaces its directive in place.
#[derive(Debug, Clone, Default)]
pub struct PropertyTable {
    entries: Vec<(String, Directive)>,
}

impl PropertyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, property: impl Into<String>, directive: impl Into<Directive>) {
        let property = property.into();
        let directive = directive.into();
        match self.entries.iter_mut().find(|(name, _)| *name == property) {
            Some(entry) => entry.1 = directive,
            None => self.entries.push((property, directive)),
        }
    }

    pub fn with(mut self, property: impl Into<String>, directive: impl Into<Directive>) -> Self {
        self.insert(property, directive);
        self
    }

    pub fn rename(self, property: impl Into<String>, target: impl Into<String>) -> Self {
        self.with(property, Directive::Rename(target.into()))
    }

    pub fn delete(self, property: impl Into<String>) -> Self {
        self.with(property, Directive::Delete)
    }

    pub fn get(&self, property: &str) -> Option<&Directive> {
        self.entries
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, directive)| directive)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Directive)> {
        self.entries.iter().map(|(name, d)| (name.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, D: Into<Directive>> FromIterator<(K, D)> for PropertyTable {
    fn from_iter<I: IntoIterator<Item = (K, D)>>(iter: I) -> Self {
        let mut table = PropertyTable::new();
        for (property, directive) in iter {
            table.insert(property, directive);
        }
        table
    }
}

/// Property remapping, either one table for the whole schema or a table
/// derived per element
#[derive(Clone)]
pub enum PropertyMappingSpec {
    Static(PropertyTable),
    Dynamic(Rc<PropertyTableFn>),
}

impl PropertyMappingSpec {
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&Element) -> Result<PropertyTable, MappingError> + 'static,
    {
        PropertyMappingSpec::Dynamic(Rc::new(f))
    }
}

impl fmt::Debug for PropertyMappingSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyMappingSpec::Static(table) => f.debug_tuple("Static").field(table).finish(),
            PropertyMappingSpec::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<PropertyTable> for PropertyMappingSpec {
    fn from(table: PropertyTable) -> Self {
        PropertyMappingSpec::Static(table)
    }
}

/// Loose truthiness used for computed directives: `null`, `false`, `0` and
/// the empty string are falsy, everything else is truthy.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Property name a truthy computed directive stands for
pub fn directive_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
