// sentri-core/src/domain/config.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError};

use crate::domain::checks::{
    CheckKind, ColumnCheckConfig, CorrelationType, MeasureThresholds, ThresholdBound,
    ThresholdSpec, decode_columns,
};

// --- ROOT ---

/// A complete data-quality run description, as read from YAML.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DqConfig {
    #[validate(nested)]
    pub source: SourceConfig,

    #[validate(nested)]
    pub metadata: MetadataConfig,

    /// `check_type -> column -> options`, kept raw so each check type decodes
    /// (and fails) on its own. Mapping order is preserved.
    #[serde(default)]
    pub checks: serde_yaml::Mapping,

    #[validate(nested)]
    pub output: OutputConfig,

    #[validate(nested)]
    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

// --- SOURCE ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Csv,
    Parquet,
    Duckdb,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
            Self::Duckdb => "duckdb",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_source_section"))]
pub struct SourceConfig {
    #[serde(rename = "type")]
    pub kind: SourceKind,

    #[validate(nested)]
    #[serde(default)]
    pub csv: Option<CsvSourceConfig>,

    #[validate(nested)]
    #[serde(default)]
    pub parquet: Option<ParquetSourceConfig>,

    #[validate(nested)]
    #[serde(default)]
    pub duckdb: Option<DuckDbSourceConfig>,

    #[validate(nested)]
    #[serde(default)]
    pub connection_retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CsvSourceConfig {
    #[validate(length(min = 1, message = "CSV file path cannot be empty"))]
    pub file_path: String,
    /// Overrides `metadata.date_column` for row selection.
    #[serde(default)]
    pub date_column: Option<String>,
    #[serde(default = "default_delimiter")]
    #[validate(length(equal = 1, message = "Delimiter must be a single character"))]
    pub delimiter: String,
    #[serde(default = "default_true")]
    pub header: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ParquetSourceConfig {
    #[validate(length(min = 1, message = "Parquet file path cannot be empty"))]
    pub file_path: String,
    #[serde(default)]
    pub date_column: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DuckDbSourceConfig {
    /// Database file, or `:memory:`.
    #[serde(default = "default_database")]
    pub database: String,
    #[validate(length(min = 1, message = "SQL query cannot be empty"))]
    pub sql: String,
    #[serde(default)]
    pub date_column: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RetryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_attempts")]
    #[validate(range(min = 1, max = 10))]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_factor")]
    #[validate(range(min = 1.0, max = 10.0))]
    pub backoff_factor: f64,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: default_max_attempts(),
            backoff_factor: default_backoff_factor(),
            initial_delay_ms: default_initial_delay_ms(),
        }
    }
}

impl SourceConfig {
    /// Date column used for row selection by the connector.
    pub fn date_column_override(&self) -> Option<&str> {
        match self.kind {
            SourceKind::Csv => self.csv.as_ref().and_then(|c| c.date_column.as_deref()),
            SourceKind::Parquet => self.parquet.as_ref().and_then(|c| c.date_column.as_deref()),
            SourceKind::Duckdb => self.duckdb.as_ref().and_then(|c| c.date_column.as_deref()),
        }
    }
}

fn validate_source_section(source: &SourceConfig) -> Result<(), ValidationError> {
    let present = [
        (SourceKind::Csv, source.csv.is_some()),
        (SourceKind::Parquet, source.parquet.is_some()),
        (SourceKind::Duckdb, source.duckdb.is_some()),
    ];
    for (kind, is_set) in present {
        if kind == source.kind && !is_set {
            let mut err = ValidationError::new("missing_source_section");
            err.message = Some(format!("'{kind}' configuration required when type is '{kind}'").into());
            return Err(err);
        }
        if kind != source.kind && is_set {
            let mut err = ValidationError::new("extra_source_section");
            err.message = Some(
                format!("Only '{}' configuration should be provided when type is '{}'", source.kind, source.kind)
                    .into(),
            );
            return Err(err);
        }
    }
    Ok(())
}

// --- METADATA ---

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MetadataConfig {
    #[validate(length(min = 1, message = "Check name cannot be empty"))]
    pub dq_check_name: String,
    #[validate(length(min = 1, message = "Date column cannot be empty"))]
    pub date_column: String,
    #[validate(length(min = 1, message = "ID column cannot be empty"))]
    pub id_column: String,
    #[serde(default)]
    pub description: Option<String>,
}

// --- OUTPUT ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Csv,
    Html,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Html => "html",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OutputConfig {
    #[serde(default = "default_formats")]
    #[validate(length(min = 1, message = "At least one output format is required"))]
    pub formats: Vec<OutputFormat>,
    #[validate(length(min = 1, message = "Output destination cannot be empty"))]
    pub destination: String,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    #[serde(default = "default_true")]
    pub include_timestamp: bool,
    #[serde(default = "default_true")]
    pub include_check_name: bool,
    #[serde(default = "default_true")]
    pub include_passed_checks: bool,
    #[serde(default = "default_true")]
    pub pretty_print: bool,
    #[validate(nested)]
    #[serde(default)]
    pub alerting: Option<AlertingConfig>,
    #[serde(default)]
    pub exit_code: ExitCodeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AlertingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[validate(nested)]
    #[serde(default)]
    pub plugins: Vec<AlertPluginConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AlertPluginConfig {
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "Plugin type cannot be empty"))]
    pub kind: String,
    #[serde(default)]
    pub config: AlertPluginOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AlertPluginOptions {
    #[serde(default)]
    pub alert_on_failure: Option<bool>,
    #[serde(default)]
    pub alert_on_warning: Option<bool>,
    /// Target file of the `file` plugin.
    #[serde(default)]
    pub path: Option<String>,

    // --- email plugin ---
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default)]
    pub smtp_port: Option<u16>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub from_address: Option<String>,
    #[serde(default)]
    pub to_addresses: Vec<String>,
    #[serde(default)]
    pub subject_prefix: Option<String>,
    #[serde(default)]
    pub use_tls: Option<bool>,
}

impl AlertPluginOptions {
    pub fn alert_on_failure(&self) -> bool {
        self.alert_on_failure.unwrap_or(true)
    }

    pub fn alert_on_warning(&self) -> bool {
        self.alert_on_warning.unwrap_or(false)
    }

    pub fn smtp_host(&self) -> &str {
        self.smtp_host.as_deref().unwrap_or("localhost")
    }

    pub fn smtp_port(&self) -> u16 {
        self.smtp_port.unwrap_or(587)
    }

    pub fn from_address(&self) -> &str {
        self.from_address.as_deref().unwrap_or("dq-framework@company.com")
    }

    pub fn subject_prefix(&self) -> &str {
        self.subject_prefix.as_deref().unwrap_or("[DQ Alert]")
    }

    pub fn use_tls(&self) -> bool {
        self.use_tls.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExitCodeConfig {
    #[serde(default = "default_true")]
    pub exit_on_critical: bool,
    #[serde(default)]
    pub exit_on_warning: bool,
    #[serde(default = "default_true")]
    pub exit_on_error: bool,
}

impl Default for ExitCodeConfig {
    fn default() -> Self {
        Self {
            exit_on_critical: true,
            exit_on_warning: false,
            exit_on_error: true,
        }
    }
}

// --- EXECUTION & LOGGING ---

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub parallel_enabled: bool,
    #[serde(default = "default_max_workers")]
    #[validate(range(min = 1, max = 16))]
    pub max_workers: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            parallel_enabled: false,
            max_workers: default_max_workers(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// --- SEMANTIC RULES ---

/// Outcome of the cross-field rules on `checks`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CheckRuleReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl CheckRuleReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl DqConfig {
    /// `(check_type, raw config)` pairs in file order. Non-string keys are dropped.
    pub fn check_entries(&self) -> Vec<(String, serde_yaml::Value)> {
        self.checks
            .iter()
            .filter_map(|(k, v)| k.as_str().map(|name| (name.to_string(), v.clone())))
            .collect()
    }

    /// Decodes every known check type and applies the rules the schema alone cannot express.
    pub fn check_rules(&self) -> CheckRuleReport {
        let mut report = CheckRuleReport::default();

        for (name, raw) in self.check_entries() {
            let Some(kind) = CheckKind::from_name(&name) else {
                report
                    .warnings
                    .push(format!("Unknown check type '{name}' will be skipped"));
                continue;
            };

            if kind == CheckKind::Statistical {
                match decode_columns::<MeasureThresholds>(kind, &raw) {
                    Ok(columns) => {
                        for (column, cfg) in &columns {
                            match cfg {
                                Ok(cfg) => statistical_rules(&name, column, cfg, &mut report),
                                Err(e) => report.errors.push(format!("checks.{name}.{column}: {e}")),
                            }
                        }
                    }
                    Err(e) => report.errors.push(e.to_string()),
                }
                continue;
            }

            match decode_columns::<ThresholdSpec>(kind, &raw) {
                Ok(columns) => {
                    for (column, cfg) in &columns {
                        match cfg {
                            Ok(cfg) => column_rules(kind, column, cfg, &mut report),
                            Err(e) => report.errors.push(format!("checks.{name}.{column}: {e}")),
                        }
                    }
                }
                Err(e) => report.errors.push(e.to_string()),
            }
        }

        report
    }
}

fn column_rules(kind: CheckKind, column: &str, cfg: &ColumnCheckConfig, report: &mut CheckRuleReport) {
    let at = format!("checks.{kind}.{column}");

    for (key, value) in cfg.thresholds.values() {
        if value < 0.0 || !value.is_finite() {
            report
                .errors
                .push(format!("{at}.thresholds.{key}: must be a non-negative number (got {value})"));
        }
    }

    match kind {
        CheckKind::Range => match (cfg.min_value, cfg.max_value) {
            (None, None) => report
                .errors
                .push(format!("{at}: at least one of min_value or max_value must be specified")),
            (Some(min), Some(max)) if min > max => report
                .errors
                .push(format!("{at}: min_value ({min}) is greater than max_value ({max})")),
            _ => {}
        },
        CheckKind::Correlation => {
            if cfg.correlation_type == CorrelationType::CrossColumn
                && cfg.correlation_with.as_deref().is_none_or(|c| c.trim().is_empty())
            {
                report
                    .errors
                    .push(format!("{at}: cross_column correlation requires correlation_with"));
            }
        }
        _ => {}
    }
}

fn statistical_rules(
    check: &str,
    column: &str,
    cfg: &ColumnCheckConfig<MeasureThresholds>,
    report: &mut CheckRuleReport,
) {
    const KNOWN: [&str; 8] = ["mean", "median", "std", "min", "max", "count", "skew", "kurtosis"];
    let at = format!("checks.{check}.{column}");

    for measure in cfg.measures.iter().flatten() {
        if !KNOWN.contains(&measure.to_lowercase().as_str()) {
            report
                .warnings
                .push(format!("{at}.measures: unknown measure '{measure}' will be skipped"));
        }
    }

    for (measure, threshold) in &cfg.thresholds {
        let bounds = [
            ("absolute_critical", threshold.absolute_critical),
            ("absolute_warning", threshold.absolute_warning),
        ];
        for (key, bound) in bounds {
            if let Some(ThresholdBound::Range([min, max])) = bound
                && min > max
            {
                report
                    .errors
                    .push(format!("{at}.thresholds.{measure}.{key}: range min ({min}) exceeds max ({max})"));
            }
        }
    }
}

// --- DEFAULTS ---

fn default_true() -> bool {
    true
}
fn default_delimiter() -> String {
    ",".to_string()
}
fn default_database() -> String {
    ":memory:".to_string()
}
fn default_max_attempts() -> u32 {
    3
}
fn default_backoff_factor() -> f64 {
    2.0
}
fn default_initial_delay_ms() -> u64 {
    1000
}
fn default_formats() -> Vec<OutputFormat> {
    vec![OutputFormat::Json]
}
fn default_file_prefix() -> String {
    "dq_report".to_string()
}
fn default_max_workers() -> usize {
    4
}
fn default_log_level() -> String {
    "info".to_string()
}
