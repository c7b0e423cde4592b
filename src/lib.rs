// Declarative schema lookup: remap element properties and component tags
pub mod schema;
pub mod property_rule;
pub mod rewriter;
pub mod property_mapper;
pub mod component_mapper;
pub mod diagnostics;
pub mod report;
pub mod config;
pub mod reactive;
pub mod host;
pub mod pipeline;

// Re-export core types for convenience
pub use schema::{walk, try_walk, Element, Row, Schema, COMPONENT_KEY};
pub use property_rule::{Directive, MappingError, PropertyMappingSpec, PropertyTable};
pub use rewriter::{rewrite_property, Rewrite, RewriteOutcome};
pub use property_mapper::map_properties;
pub use component_mapper::{map_components, ComponentTable};
pub use diagnostics::{DiagnosticSink, Diagnostics, LogSink, MemorySink, Notice, NoticeKind, TransformContext, Verbosity};
pub use report::{LookupReport, LookupReporter, ReportFormat, TransformSummary};
pub use config::{ConfigError, LookupConfig};
pub use reactive::{batch, effect, BatchScope, Effect, Ref};
pub use host::{FormContext, Installed, SchemaHost};
pub use pipeline::{Binding, LookupError, LookupResult, SchemaLookup};
