// sentri-core/src/infrastructure/config/loader.rs

use std::fs;
use std::path::Path;
use tracing::{info, instrument, warn};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use super::env::substitute_env;
use crate::domain::config::DqConfig;
use crate::infrastructure::error::InfrastructureError;

/// Reads, expands, decodes and validates a configuration file.
#[instrument]
pub fn load_config(path: &Path) -> Result<DqConfig, InfrastructureError> {
    if !path.exists() {
        return Err(InfrastructureError::ConfigNotFound(path.display().to_string()));
    }
    info!(path = ?path, "Loading data quality configuration");
    let content = fs::read_to_string(path)?;
    load_config_from_str(&content)
}

#[instrument(skip(yaml))]
pub fn load_config_from_str(yaml: &str) -> Result<DqConfig, InfrastructureError> {
    let mut raw: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    if raw.is_null() {
        return Err(InfrastructureError::ConfigError("Configuration file is empty".into()));
    }
    substitute_env(&mut raw)?;

    let config: DqConfig = serde_yaml::from_value(raw)?;
    config.validate()?;

    let report = config.check_rules();
    for warning in &report.warnings {
        warn!("{warning}");
    }
    if !report.is_valid() {
        return Err(InfrastructureError::Validation(
            report
                .errors
                .iter()
                .map(|e| format!("  - {e}"))
                .collect::<Vec<_>>()
                .join("\n"),
        ));
    }

    info!(
        name = %config.metadata.dq_check_name,
        check_types = config.checks.len(),
        "Configuration validated"
    );
    Ok(config)
}

/// One `  - a -> b: message` line per field error, sorted.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut lines = Vec::new();
    collect(errors, &mut Vec::new(), &mut lines);
    lines.sort();
    lines.join("\n")
}

fn collect(errors: &ValidationErrors, loc: &mut Vec<String>, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let field = field.to_string();
        let pushed = field != "__all__";
        if pushed {
            loc.push(field);
        }
        match kind {
            ValidationErrorsKind::Field(errs) => {
                for e in errs {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    out.push(format!("  - {}: {msg}", render_loc(loc)));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, loc, out),
            ValidationErrorsKind::List(items) => {
                for (i, inner) in items {
                    loc.push(i.to_string());
                    collect(inner, loc, out);
                    loc.pop();
                }
            }
        }
        if pushed {
            loc.pop();
        }
    }
}

fn render_loc(loc: &[String]) -> String {
    if loc.is_empty() {
        "<root>".to_string()
    } else {
        loc.join(" -> ")
    }
}
