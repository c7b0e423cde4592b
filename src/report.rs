use serde::{Deserialize, Serialize};

use crate::{diagnostics::Notice, rewriter::RewriteOutcome};

/// Counters for one transformation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformSummary {
    pub rows: usize,
    pub elements: usize,
    pub properties_renamed: usize,
    pub properties_deleted: usize,
    pub directives_skipped: usize,
    pub properties_missing: usize,
    pub components_remapped: usize,
}

impl TransformSummary {
    pub fn record(&mut self, outcome: &RewriteOutcome) {
        match outcome {
            RewriteOutcome::Renamed { .. } => self.properties_renamed += 1,
            RewriteOutcome::Deleted { .. } => self.properties_deleted += 1,
            RewriteOutcome::Skipped { .. } => self.directives_skipped += 1,
            RewriteOutcome::Missing { .. } => self.properties_missing += 1,
        }
    }

    pub fn properties_rewritten(&self) -> usize {
        self.properties_renamed + self.properties_deleted
    }
}

/// Renders transformation reports in various formats
pub struct LookupReporter {
    output_format: ReportFormat,
}

/// Available output formats for lookup reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Console,
    Json,
    Yaml,
}

/// Summary of one run plus the notices it raised
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupReport {
    pub summary: TransformSummary,
    pub notices: Vec<Notice>,
    pub recommendations: Vec<String>,
}

impl LookupReporter {
    pub fn new() -> Self {
        Self {
            output_format: ReportFormat::Console,
        }
    }

    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn generate_report(&self, summary: TransformSummary, notices: Vec<Notice>) -> LookupReport {
        let recommendations = self.generate_recommendations(&summary);
        LookupReport {
            summary,
            notices,
            recommendations,
        }
    }

    /// Format the report according to the configured output format
    pub fn format_report(&self, report: &LookupReport) -> Result<String, ReportError> {
        match self.output_format {
            ReportFormat::Console => Ok(self.format_console_report(report)),
            ReportFormat::Json => serde_json::to_string_pretty(report)
                .map_err(|e| ReportError::SerializationError(e.to_string())),
            ReportFormat::Yaml => serde_yaml::to_string(report)
                .map_err(|e| ReportError::SerializationError(e.to_string())),
        }
    }

    fn generate_recommendations(&self, summary: &TransformSummary) -> Vec<String> {
        let mut recommendations = Vec::new();

        if summary.properties_missing > 0 {
            recommendations.push(
                "Some directives target properties that elements do not have; check mapProps for stale names"
                    .to_string(),
            );
        }

        if summary.elements > 0 && summary.properties_rewritten() == 0 && summary.components_remapped == 0 {
            recommendations.push("No element was changed by the configured mappings".to_string());
        }

        recommendations
    }

    fn format_console_report(&self, report: &LookupReport) -> String {
        let summary = &report.summary;
        let mut output = String::new();

        output.push_str("=== Schema Lookup Report ===\n\n");
        output.push_str(&format!("Rows: {}\n", summary.rows));
        output.push_str(&format!("Elements: {}\n", summary.elements));
        output.push_str(&format!("Properties renamed: {}\n", summary.properties_renamed));
        output.push_str(&format!("Properties deleted: {}\n", summary.properties_deleted));
        output.push_str(&format!("Directives skipped: {}\n", summary.directives_skipped));
        output.push_str(&format!("Properties missing: {}\n", summary.properties_missing));
        output.push_str(&format!("Components remapped: {}\n", summary.components_remapped));

        if !report.notices.is_empty() {
            output.push_str("\nNotices:\n");
            for notice in &report.notices {
                output.push_str(&format!("  • {}\n", notice));
            }
        }

        if !report.recommendations.is_empty() {
            output.push_str("\nRecommendations:\n");
            for rec in &report.recommendations {
                output.push_str(&format!("  • {}\n", rec));
            }
        }

        output
    }
}

impl Default for LookupReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Serialization error: {0}")]
    SerializationError(String),
}
