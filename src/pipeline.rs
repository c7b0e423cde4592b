use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::{
    component_mapper::map_components,
    config::LookupConfig,
    diagnostics::{DiagnosticSink, Diagnostics, LogSink, Notice, TransformContext},
    host::{Installed, SchemaHost},
    property_mapper::map_properties,
    property_rule::MappingError,
    reactive::{self, Effect, Ref},
    report::{LookupReport, LookupReporter, TransformSummary},
    schema::{element_count, Schema},
};

/// Engine that remaps properties, then component tags, of every element
#[derive(Debug, Clone)]
pub struct SchemaLookup {
    config: LookupConfig,
    diagnostics: Diagnostics,
}

/// Transformed schema plus the counters and notices of the run that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct LookupResult {
    pub schema: Schema,
    pub summary: TransformSummary,
    pub notices: Vec<Notice>,
}

impl LookupResult {
    pub fn report(&self, reporter: &LookupReporter) -> LookupReport {
        reporter.generate_report(self.summary.clone(), self.notices.clone())
    }
}

/// Errors that can occur during a transformation run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    #[error("Property mapping failed: {0}")]
    Mapping(#[from] MappingError),
}

impl SchemaLookup {
    /// Notices go to the `log` facade at the configured verbosity
    pub fn new(config: LookupConfig) -> Self {
        let diagnostics = Diagnostics::new(Rc::new(LogSink), config.verbosity);
        Self { config, diagnostics }
    }

    /// Send notices to `sink` instead, keeping the configured verbosity
    pub fn with_sink<S: DiagnosticSink + 'static>(mut self, sink: S) -> Self {
        self.diagnostics = Diagnostics::new(Rc::new(sink), self.config.verbosity);
        self
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// Run the whole pipeline once. Property remapping always comes first so
    /// that a renamed property can feed the component table.
    pub fn transform(&self, schema: &Schema) -> Result<Schema, LookupError> {
        self.transform_with_report(schema).map(|result| result.schema)
    }

    pub fn transform_with_report(&self, schema: &Schema) -> Result<LookupResult, LookupError> {
        let mut ctx = TransformContext::new(self.diagnostics.clone());
        ctx.summary.rows = schema.len();
        ctx.summary.elements = element_count(schema);

        let mapped = map_properties(schema, self.config.map_props.as_ref(), &mut ctx)?;
        let mapped = map_components(&mapped, &self.config.map_components, &mut ctx);

        log::debug!(
            "Schema lookup: {} rows, {} elements, {} properties rewritten, {} components remapped",
            ctx.summary.rows,
            ctx.summary.elements,
            ctx.summary.properties_rewritten(),
            ctx.summary.components_remapped
        );

        Ok(LookupResult {
            schema: mapped,
            summary: ctx.summary,
            notices: ctx.notices,
        })
    }

    /// Keep a transformed copy of `source` up to date. The transformation runs
    /// once now and again, in full, every time `source` changes.
    pub fn bind(&self, source: &Ref<Schema>) -> Binding {
        let output = Ref::new(Schema::new());
        let last_error = Rc::new(RefCell::new(None));

        let lookup = self.clone();
        let source = source.clone();
        let (out, error_slot) = (output.clone(), Rc::clone(&last_error));

        let effect = reactive::effect(move || match source.with(|schema| lookup.transform(schema)) {
            Ok(schema) => {
                *error_slot.borrow_mut() = None;
                out.set(schema);
            }
            Err(err) => {
                log::error!("Schema lookup recomputation failed: {}", err);
                *error_slot.borrow_mut() = Some(err);
            }
        });

        Binding {
            output,
            last_error,
            effect,
        }
    }

    /// Point the host's parsed schema at a live transformed copy of it
    pub fn install<H: SchemaHost>(&self, mut host: H) -> Installed<H> {
        let binding = self.bind(host.parsed_schema());
        host.set_parsed_schema(binding.output());
        Installed::new(host, binding)
    }
}

/// A live recomputation: its output cell and the outcome of the last run.
/// Dropping it stops recomputation; the output keeps its last value.
#[derive(Debug)]
pub struct Binding {
    output: Ref<Schema>,
    last_error: Rc<RefCell<Option<LookupError>>>,
    effect: Effect,
}

impl Binding {
    pub fn output(&self) -> Ref<Schema> {
        self.output.clone()
    }

    /// Error from the most recent run, cleared by the next successful one
    pub fn last_error(&self) -> Option<LookupError> {
        self.last_error.borrow().clone()
    }

    /// Re-run the transformation without waiting for a change
    pub fn recompute(&self) {
        self.effect.run();
    }

    pub fn recomputations(&self) -> u64 {
        self.effect.run_count()
    }
}
