// sentri-core/src/infrastructure/output/mod.rs

pub mod csv;
pub mod html;
pub mod json;

use crate::domain::config::OutputFormat;
use crate::domain::report::AggregatedResults;
use crate::infrastructure::error::InfrastructureError;

pub use self::csv::CsvWriter;
pub use html::HtmlWriter;
pub use json::JsonWriter;

/// Serializes aggregated results into one report format.
pub trait ReportWriter: Send + Sync {
    fn format(&self) -> OutputFormat;

    fn render(&self, results: &AggregatedResults) -> Result<Vec<u8>, InfrastructureError>;
}

pub fn writer_for(format: OutputFormat, pretty: bool) -> Box<dyn ReportWriter> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter { pretty }),
        OutputFormat::Csv => Box::new(CsvWriter),
        OutputFormat::Html => Box::new(HtmlWriter::new()),
    }
}
