use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use serde_yaml::Value;
use thiserror::Error;

use crate::{
    component_mapper::ComponentTable,
    diagnostics::Verbosity,
    property_rule::{Directive, PropertyMappingSpec, PropertyTable},
};

/// Construction-time configuration of a [`crate::SchemaLookup`]
#[derive(Debug, Clone, Default)]
pub struct LookupConfig {
    pub map_components: ComponentTable,
    pub map_props: Option<PropertyMappingSpec>,
    pub verbosity: Verbosity,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid directive for property '{property}': expected a property name or false")]
    InvalidDirective { property: String },

    #[error("Property names in mapProps must be strings")]
    InvalidPropertyName,
}

/// On-disk shape. JSON parses as well since it is valid YAML.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    #[serde(default)]
    map_components: ComponentTable,
    #[serde(default)]
    map_props: Value,
    #[serde(default)]
    verbosity: Option<Verbosity>,
}

impl LookupConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_component(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.map_components.insert(source.into(), target.into());
        self
    }

    pub fn with_components(mut self, table: ComponentTable) -> Self {
        self.map_components = table;
        self
    }

    pub fn with_props(mut self, spec: impl Into<PropertyMappingSpec>) -> Self {
        self.map_props = Some(spec.into());
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        source.parse()
    }
}

impl FromStr for LookupConfig {
    type Err = ConfigError;

    /// Parse a YAML or JSON document with `mapComponents`, `mapProps` and
    /// an optional `verbosity`
    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let raw: RawConfig = serde_yaml::from_str(source)?;

        Ok(Self {
            map_components: raw.map_components,
            map_props: parse_map_props(&raw.map_props)?,
            verbosity: raw.verbosity.unwrap_or_default(),
        })
    }
}

/// Anything other than a mapping means no property remapping
fn parse_map_props(value: &Value) -> Result<Option<PropertyMappingSpec>, ConfigError> {
    let Value::Mapping(map) = value else {
        return Ok(None);
    };

    let mut table = PropertyTable::new();
    for (key, directive) in map {
        let property = key.as_str().ok_or(ConfigError::InvalidPropertyName)?;
        let directive = match directive {
            Value::String(target) => Directive::Rename(target.clone()),
            Value::Bool(false) => Directive::Delete,
            _ => {
                return Err(ConfigError::InvalidDirective {
                    property: property.to_string(),
                })
            }
        };
        table.insert(property, directive);
    }

    Ok(Some(PropertyMappingSpec::Static(table)))
}
