// sentri-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("DuckDB Engine Error: {0}")]
    #[diagnostic(
        code(sentri::infra::database::duckdb),
        help("An error occurred inside the SQL engine while reading the source.")
    )]
    DuckDB(#[from] duckdb::Error),
}

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- DATABASE ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DatabaseError),

    // --- FILESYSTEM ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(sentri::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(sentri::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("Configuration Error: {0}")]
    #[diagnostic(code(sentri::infra::config))]
    ConfigError(String),

    #[error("Configuration file not found at '{0}'")]
    #[diagnostic(code(sentri::infra::config_missing))]
    ConfigNotFound(String),

    #[error("Configuration validation failed:\n{0}")]
    #[diagnostic(
        code(sentri::infra::config_validation),
        help("Fix the fields listed above; each line is `path: reason`.")
    )]
    Validation(String),

    #[error("Environment variable '{var}' is not set (referenced at '{path}')")]
    #[diagnostic(
        code(sentri::infra::env_var),
        help("Set the environment variable: export {var}=value")
    )]
    EnvVarMissing { var: String, path: String },

    // --- CONNECTORS ---
    #[error("Connector '{connector}' failed: {reason}")]
    #[diagnostic(
        code(sentri::infra::connector),
        help("Check the `source` section and that the data file or database is reachable.")
    )]
    Connector { connector: String, reason: String },

    // --- WRITERS ---
    #[error("Template Rendering Error: {0}")]
    #[diagnostic(
        code(sentri::infra::template),
        help("The HTML report template failed to render.")
    )]
    TemplateError(#[from] minijinja::Error),

    #[error("CSV Error: {0}")]
    #[diagnostic(code(sentri::infra::csv))]
    Csv(#[from] csv::Error),

    #[error("JSON Error: {0}")]
    #[diagnostic(code(sentri::infra::json))]
    Json(#[from] serde_json::Error),

    // --- ALERTING ---
    #[error("Alert delivery failed: {0}")]
    #[diagnostic(
        code(sentri::infra::alerting),
        help("Check the SMTP settings and addresses under `output.alerting.plugins`.")
    )]
    Alerting(String),
}

// Shortcut for `?` on duckdb calls
impl From<duckdb::Error> for InfrastructureError {
    fn from(err: duckdb::Error) -> Self {
        InfrastructureError::Database(DatabaseError::DuckDB(err))
    }
}

impl From<validator::ValidationErrors> for InfrastructureError {
    fn from(errors: validator::ValidationErrors) -> Self {
        InfrastructureError::Validation(crate::infrastructure::config::format_validation_errors(
            &errors,
        ))
    }
}
