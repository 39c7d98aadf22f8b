// sentri-core/src/domain/error.rs

use miette::Diagnostic;
use serde_json::{Map, Value as JsonValue, json};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Dataset Error: {0}")]
    #[diagnostic(
        code(sentri::domain::dataset),
        help("Every column of a dataset must hold the same number of rows.")
    )]
    Dataset(String),

    #[error("Invalid '{check}' configuration for column '{column}': {reason}")]
    #[diagnostic(
        code(sentri::domain::check_config),
        help("Check the option names and value types under `checks.{check}.{column}`.")
    )]
    CheckConfig {
        check: String,
        column: String,
        reason: String,
    },
}

/// Expected, column-level failures raised while evaluating a check.
///
/// These never escape a check's `run()`: the check shell turns each one into
/// an ERROR result record for the offending column.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum CheckEvaluationError {
    #[error("Invalid configuration for column '{column}': {reason}")]
    #[diagnostic(
        code(sentri::check::configuration),
        help("Check the option names and value types of this column.")
    )]
    Configuration { column: String, reason: String },

    #[error("Invalid filter: {filter} ({reason})")]
    #[diagnostic(code(sentri::check::filter))]
    InvalidFilter { filter: String, reason: String },

    #[error("Column '{column}' not found in dataset")]
    #[diagnostic(code(sentri::check::missing_column))]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("Correlation column '{}' not found", .column.as_deref().unwrap_or("None"))]
    #[diagnostic(
        code(sentri::check::correlation_target),
        help("Cross-column correlation needs `correlation_with` naming an existing column.")
    )]
    MissingCorrelationTarget { column: Option<String> },

    #[error("Column '{column}' holds a non-numeric value: {value}")]
    #[diagnostic(code(sentri::check::non_numeric))]
    NonNumeric { column: String, value: String },

    #[error("Calculation failed: {0}")]
    #[diagnostic(code(sentri::check::calculation))]
    Calculation(String),
}

impl CheckEvaluationError {
    /// Stable name of the error kind, echoed in ERROR records.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "ConfigurationError",
            Self::InvalidFilter { .. } => "InvalidFilter",
            Self::MissingColumn { .. } => "MissingColumn",
            Self::MissingCorrelationTarget { .. } => "MissingCorrelationTarget",
            Self::NonNumeric { .. } => "NonNumeric",
            Self::Calculation(_) => "Calculation",
        }
    }

    /// Structured context attached to the ERROR record.
    pub fn context(&self) -> Map<String, JsonValue> {
        let mut ctx = Map::new();
        match self {
            Self::Configuration { column, .. } => {
                ctx.insert("column".into(), json!(column));
            }
            Self::InvalidFilter { filter, .. } => {
                ctx.insert("filter_condition".into(), json!(filter));
            }
            Self::MissingColumn { available, .. } => {
                ctx.insert("available_columns".into(), json!(available));
            }
            Self::MissingCorrelationTarget { column } => {
                ctx.insert("correlation_with".into(), json!(column));
            }
            Self::NonNumeric { column, .. } => {
                ctx.insert("column".into(), json!(column));
            }
            Self::Calculation(_) => {}
        }
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_target_message_without_column() {
        let err = CheckEvaluationError::MissingCorrelationTarget { column: None };
        assert_eq!(err.to_string(), "Correlation column 'None' not found");
        assert_eq!(err.error_type(), "MissingCorrelationTarget");
    }

    #[test]
    fn test_missing_column_context_lists_available() {
        let err = CheckEvaluationError::MissingColumn {
            column: "ghost".into(),
            available: vec!["id".into(), "amount".into()],
        };
        let ctx = err.context();
        assert_eq!(ctx["available_columns"], json!(["id", "amount"]));
    }
}
