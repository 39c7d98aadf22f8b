// sentri-core/src/infrastructure/output/json.rs

use super::ReportWriter;
use crate::domain::config::OutputFormat;
use crate::domain::report::AggregatedResults;
use crate::infrastructure::error::InfrastructureError;

pub struct JsonWriter {
    pub pretty: bool,
}

impl ReportWriter for JsonWriter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Json
    }

    fn render(&self, results: &AggregatedResults) -> Result<Vec<u8>, InfrastructureError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(results)?
        } else {
            serde_json::to_vec(results)?
        };
        Ok(bytes)
    }
}
