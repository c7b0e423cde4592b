use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::report::TransformSummary;

/// Non-fatal diagnostic raised while transforming a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub property: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeKind {
    /// A directive targeted a property the element does not have
    MissingProperty,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: String) -> Self {
        Self {
            kind,
            message,
            property: None,
        }
    }

    pub fn with_property(mut self, property: String) -> Self {
        self.property = Some(property);
        self
    }

    pub fn missing_property(property: &str) -> Self {
        Notice::new(
            NoticeKind::MissingProperty,
            format!("Property '{}' does not exist on element, skipping", property),
        )
        .with_property(property.to_string())
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Destination for notices
pub trait DiagnosticSink {
    fn emit(&self, notice: &Notice);
}

/// Forwards notices to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&self, notice: &Notice) {
        log::warn!("{}", notice);
    }
}

/// Keeps every notice in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    notices: Rc<RefCell<Vec<Notice>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.notices.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.notices.borrow_mut().clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, notice: &Notice) {
        self.notices.borrow_mut().push(notice.clone());
    }
}

/// Whether notices reach the sink at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Quiet,
    Verbose,
}

impl Default for Verbosity {
    /// Verbose in debug builds, quiet in release builds
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Verbosity::Verbose
        } else {
            Verbosity::Quiet
        }
    }
}

/// Sink plus verbosity, injected into the engine at construction
#[derive(Clone)]
pub struct Diagnostics {
    sink: Rc<dyn DiagnosticSink>,
    verbosity: Verbosity,
}

impl Diagnostics {
    pub fn new(sink: Rc<dyn DiagnosticSink>, verbosity: Verbosity) -> Self {
        Self { sink, verbosity }
    }

    pub fn with_sink<S: DiagnosticSink + 'static>(sink: S) -> Self {
        Self::new(Rc::new(sink), Verbosity::default())
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn notify(&self, notice: Notice) {
        if self.verbosity == Verbosity::Verbose {
            self.sink.emit(&notice);
        }
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::with_sink(LogSink)
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("verbosity", &self.verbosity)
            .finish_non_exhaustive()
    }
}

/// State threaded through a single transformation run
#[derive(Debug, Default)]
pub struct TransformContext {
    pub diagnostics: Diagnostics,
    pub summary: TransformSummary,
    /// Every notice raised during the run, whatever the verbosity
    pub notices: Vec<Notice>,
}

impl TransformContext {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self {
            diagnostics,
            summary: TransformSummary::default(),
            notices: Vec::new(),
        }
    }

    pub fn notify(&mut self, notice: Notice) {
        self.notices.push(notice.clone());
        self.diagnostics.notify(notice);
    }
}
