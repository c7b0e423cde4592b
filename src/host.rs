use std::ops::Deref;

use serde_json::{Map, Value};

use crate::{pipeline::Binding, reactive::Ref, schema::Schema};

/// A host that hands its parsed schema to the lookup and accepts the
/// transformed one back. Everything else on the host is left alone.
pub trait SchemaHost {
    fn parsed_schema(&self) -> &Ref<Schema>;

    fn set_parsed_schema(&mut self, schema: Ref<Schema>);
}

/// Ready-made host: the parsed schema plus arbitrary pass-through fields
#[derive(Debug, Clone)]
pub struct FormContext {
    pub parsed_schema: Ref<Schema>,
    pub fields: Map<String, Value>,
}

impl FormContext {
    pub fn new(parsed_schema: Ref<Schema>) -> Self {
        Self {
            parsed_schema,
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }
}

impl SchemaHost for FormContext {
    fn parsed_schema(&self) -> &Ref<Schema> {
        &self.parsed_schema
    }

    fn set_parsed_schema(&mut self, schema: Ref<Schema>) {
        self.parsed_schema = schema;
    }
}

/// A host whose parsed schema now points at a live lookup output
#[derive(Debug)]
pub struct Installed<H> {
    host: H,
    binding: Binding,
}

impl<H: SchemaHost> Installed<H> {
    pub(crate) fn new(host: H, binding: Binding) -> Self {
        Self { host, binding }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Dropping the returned binding stops recomputation
    pub fn into_parts(self) -> (H, Binding) {
        (self.host, self.binding)
    }
}

impl<H> Deref for Installed<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.host
    }
}

/// Lets lookups stack: the next one reads this one's output
impl<H: SchemaHost> SchemaHost for Installed<H> {
    fn parsed_schema(&self) -> &Ref<Schema> {
        self.host.parsed_schema()
    }

    fn set_parsed_schema(&mut self, schema: Ref<Schema>) {
        self.host.set_parsed_schema(schema);
    }
}
