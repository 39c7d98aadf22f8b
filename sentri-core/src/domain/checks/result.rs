// sentri-core/src/domain/checks/result.rs

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

use super::threshold::Evaluation;
use crate::domain::error::CheckEvaluationError;

/// Largest number of sample values kept in `additional_metrics`.
pub const MAX_SAMPLE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Warning,
    Fail,
    Error,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Warning => "WARNING",
            Self::Fail => "FAIL",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
            Self::Error => "ERROR",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    pub error_type: String,
    #[serde(default)]
    pub context: Map<String, JsonValue>,
}

/// The atomic output unit: one check evaluated on one column (and measure).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub check_type: String,
    pub column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure: Option<String>,
    pub date: String,
    pub metric_value: Option<f64>,
    pub status: CheckStatus,
    pub severity: Severity,
    pub exceeded_threshold: Option<JsonValue>,
    #[serde(default)]
    pub additional_metrics: Map<String, JsonValue>,
    #[serde(default)]
    pub thresholds: JsonValue,
    pub description: Option<String>,
    pub filter_applied: Option<String>,
    pub column_alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
    pub timestamp: String,
}

/// Configuration echoed into every record of a column.
#[derive(Debug, Clone, Default)]
pub struct RecordEcho {
    pub thresholds: JsonValue,
    pub description: Option<String>,
    pub filter_applied: Option<String>,
    pub column_alias: Option<String>,
}

impl ResultRecord {
    /// Builds a record from an evaluation. The metric is rounded to 6 decimals.
    pub fn new(
        check_type: &str,
        column: &str,
        date: NaiveDate,
        metric_value: f64,
        evaluation: Evaluation,
        additional_metrics: Map<String, JsonValue>,
        echo: &RecordEcho,
    ) -> Self {
        Self {
            check_type: check_type.to_string(),
            column: Some(column.to_string()),
            measure: None,
            date: format_date(date),
            metric_value: Some(round6(metric_value)),
            status: evaluation.status,
            severity: evaluation.severity,
            exceeded_threshold: evaluation.exceeded_threshold,
            additional_metrics,
            thresholds: echo.thresholds.clone(),
            description: echo.description.clone(),
            filter_applied: echo.filter_applied.clone(),
            column_alias: echo.column_alias.clone(),
            error: None,
            timestamp: now(),
        }
    }

    /// ERROR record for a column-level failure inside a check.
    pub fn column_error(
        check_type: &str,
        column: &str,
        date: NaiveDate,
        err: &CheckEvaluationError,
        echo: &RecordEcho,
    ) -> Self {
        let mut context = err.context();
        context.insert("check".into(), JsonValue::String(check_type.to_string()));
        Self {
            error: Some(ErrorDetail {
                message: err.to_string(),
                error_type: err.error_type().to_string(),
                context,
            }),
            ..Self::error_shell(check_type, Some(column), date, echo)
        }
    }

    /// ERROR record for a whole check type that failed outside its own error handling.
    pub fn check_failure(check_type: &str, date: NaiveDate, message: &str, error_type: &str) -> Self {
        let mut context = Map::new();
        context.insert("check".into(), JsonValue::String(check_type.to_string()));
        Self {
            error: Some(ErrorDetail {
                message: message.to_string(),
                error_type: error_type.to_string(),
                context,
            }),
            ..Self::error_shell(check_type, None, date, &RecordEcho::default())
        }
    }

    fn error_shell(check_type: &str, column: Option<&str>, date: NaiveDate, echo: &RecordEcho) -> Self {
        Self {
            check_type: check_type.to_string(),
            column: column.map(str::to_string),
            measure: None,
            date: format_date(date),
            metric_value: None,
            status: CheckStatus::Error,
            severity: Severity::Error,
            exceeded_threshold: None,
            additional_metrics: Map::new(),
            thresholds: echo.thresholds.clone(),
            description: echo.description.clone(),
            filter_applied: echo.filter_applied.clone(),
            column_alias: echo.column_alias.clone(),
            error: None,
            timestamp: now(),
        }
    }

    pub fn with_measure(mut self, measure: &str) -> Self {
        self.measure = Some(measure.to_string());
        self
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

pub fn round6(v: f64) -> f64 {
    round_to(v, 6)
}

/// `ratio * 100` rounded to 2 decimals.
pub fn percent(ratio: f64) -> f64 {
    round_to(ratio * 100.0, 2)
}

pub fn round_to(v: f64, digits: i32) -> f64 {
    if !v.is_finite() {
        return v;
    }
    let factor = 10f64.powi(digits);
    (v * factor).round() / factor
}
