// sentri-core/src/infrastructure/output/csv.rs

use serde_json::Value as JsonValue;

use super::ReportWriter;
use crate::domain::checks::ResultRecord;
use crate::domain::config::OutputFormat;
use crate::domain::report::AggregatedResults;
use crate::infrastructure::error::InfrastructureError;

const HEADER: [&str; 16] = [
    "check_type",
    "column",
    "measure",
    "date",
    "metric_value",
    "status",
    "severity",
    "exceeded_threshold",
    "thresholds",
    "description",
    "filter_applied",
    "column_alias",
    "additional_metrics",
    "error_message",
    "error_type",
    "timestamp",
];

/// One row per record; nested values are written as JSON text.
pub struct CsvWriter;

impl ReportWriter for CsvWriter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Csv
    }

    fn render(&self, results: &AggregatedResults) -> Result<Vec<u8>, InfrastructureError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(HEADER)?;
        for record in &results.results {
            wtr.write_record(flatten(record))?;
        }
        wtr.into_inner()
            .map_err(|e| InfrastructureError::Io(std::io::Error::other(e.to_string())))
    }
}

fn flatten(r: &ResultRecord) -> [String; 16] {
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();
    [
        r.check_type.clone(),
        opt(&r.column),
        opt(&r.measure),
        r.date.clone(),
        r.metric_value.map(|v| v.to_string()).unwrap_or_default(),
        r.status.to_string(),
        r.severity.to_string(),
        r.exceeded_threshold.as_ref().map(json_text).unwrap_or_default(),
        json_text(&r.thresholds),
        opt(&r.description),
        opt(&r.filter_applied),
        opt(&r.column_alias),
        if r.additional_metrics.is_empty() {
            String::new()
        } else {
            json_text(&JsonValue::Object(r.additional_metrics.clone()))
        },
        r.error.as_ref().map(|e| e.message.clone()).unwrap_or_default(),
        r.error.as_ref().map(|e| e.error_type.clone()).unwrap_or_default(),
        r.timestamp.clone(),
    ]
}

fn json_text(v: &JsonValue) -> String {
    match v {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
