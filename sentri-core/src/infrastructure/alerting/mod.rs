// sentri-core/src/infrastructure/alerting/mod.rs

pub mod email;
pub mod file;
pub mod log;

pub use email::EmailAlertPlugin;
pub use file::FileAlertPlugin;
pub use log::LogAlertPlugin;

use serde::Serialize;

use crate::domain::checks::ResultRecord;
use crate::domain::report::{AggregatedResults, Summary};

/// Body shared by the alert channels.
#[derive(Debug, Serialize)]
pub struct AlertPayload<'a> {
    pub check_name: Option<&'a str>,
    pub generated_at: String,
    pub summary: &'a Summary,
    pub failed_checks: &'a [ResultRecord],
    pub warning_checks: &'a [ResultRecord],
}

impl<'a> AlertPayload<'a> {
    pub fn new(
        results: &'a AggregatedResults,
        failed: &'a [ResultRecord],
        warnings: &'a [ResultRecord],
    ) -> Self {
        Self {
            check_name: results.metadata.dq_check_name.as_deref(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            summary: &results.summary,
            failed_checks: failed,
            warning_checks: warnings,
        }
    }
}

/// `check/column` label used in alert lines.
pub(crate) fn label(record: &ResultRecord) -> String {
    match (&record.column, &record.measure) {
        (Some(c), Some(m)) => format!("{}/{c}/{m}", record.check_type),
        (Some(c), None) => format!("{}/{c}", record.check_type),
        (None, _) => record.check_type.clone(),
    }
}
