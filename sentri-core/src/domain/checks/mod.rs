// sentri-core/src/domain/checks/mod.rs

// The ten data-quality checks and the shell they share.
// A check never fails as a whole: every column-level problem becomes an
// ERROR record and the remaining columns are still evaluated.

pub mod completeness;
pub mod config;
pub mod correlation;
pub mod distribution;
pub mod drift;
pub mod frequency;
pub mod range;
pub mod result;
pub mod statistical;
pub mod threshold;
pub mod turnover;
pub mod uniqueness;
pub mod value_spike;

pub use config::{
    ColumnCheckConfig, CorrelationType, MeasureThreshold, MeasureThresholds, ThresholdBound,
    ThresholdSpec,
};
pub use result::{CheckStatus, ErrorDetail, RecordEcho, ResultRecord, Severity};
pub use threshold::{Evaluation, ThresholdKind, evaluate};

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::{debug, error};

use crate::domain::dataset::{Dataset, RowFilter, Value, ValueKey};
use crate::domain::error::{CheckEvaluationError, DomainError};

// --- CONTRACT ---

pub trait Check: Send {
    fn kind(&self) -> CheckKind;

    /// Evaluates every configured column. Never fails.
    fn run(&self) -> Vec<ResultRecord>;
}

/// The closed set of check types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CheckKind {
    Completeness,
    Uniqueness,
    Range,
    Turnover,
    ValueSpike,
    Frequency,
    Correlation,
    Statistical,
    Distribution,
    Drift,
}

impl CheckKind {
    pub const ALL: [CheckKind; 10] = [
        CheckKind::Completeness,
        CheckKind::Uniqueness,
        CheckKind::Range,
        CheckKind::Turnover,
        CheckKind::ValueSpike,
        CheckKind::Frequency,
        CheckKind::Correlation,
        CheckKind::Statistical,
        CheckKind::Distribution,
        CheckKind::Drift,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Completeness => "completeness",
            Self::Uniqueness => "uniqueness",
            Self::Range => "range",
            Self::Turnover => "turnover",
            Self::ValueSpike => "value_spike",
            Self::Frequency => "frequency",
            Self::Correlation => "correlation",
            Self::Statistical => "statistical",
            Self::Distribution => "distribution",
            Self::Drift => "drift",
        }
    }

    /// Exact, case-sensitive lookup of a configured check type.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Instantiates the check over a lowercase copy of `dataset`.
    pub fn build(
        &self,
        dataset: &Dataset,
        date_col: &str,
        id_col: &str,
        config: &serde_yaml::Value,
    ) -> Result<Box<dyn Check>, DomainError> {
        let ctx = CheckContext::new(dataset, date_col, id_col)?;
        let check: Box<dyn Check> = match self {
            Self::Completeness => Box::new(completeness::CompletenessCheck::new(
                ctx,
                decode_columns(*self, config)?,
            )),
            Self::Uniqueness => Box::new(uniqueness::UniquenessCheck::new(
                ctx,
                decode_columns(*self, config)?,
            )),
            Self::Range => Box::new(range::RangeCheck::new(ctx, decode_columns(*self, config)?)),
            Self::Turnover => Box::new(turnover::TurnoverCheck::new(
                ctx,
                decode_columns(*self, config)?,
            )),
            Self::ValueSpike => Box::new(value_spike::ValueSpikeCheck::new(
                ctx,
                decode_columns(*self, config)?,
            )),
            Self::Frequency => Box::new(frequency::FrequencyCheck::new(
                ctx,
                decode_columns(*self, config)?,
            )),
            Self::Correlation => Box::new(correlation::CorrelationCheck::new(
                ctx,
                decode_columns(*self, config)?,
            )),
            Self::Statistical => Box::new(statistical::StatisticalCheck::new(
                ctx,
                decode_columns(*self, config)?,
            )),
            Self::Distribution => Box::new(distribution::DistributionCheck::new(
                ctx,
                decode_columns(*self, config)?,
            )),
            Self::Drift => Box::new(drift::DriftCheck::new(ctx, decode_columns(*self, config)?)),
        };
        Ok(check)
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-column configurations in order of appearance. A column whose options
/// failed to decode keeps its error and is reported on its own.
pub type ColumnConfigs<T = ThresholdSpec> =
    Vec<(String, Result<ColumnCheckConfig<T>, CheckEvaluationError>)>;

/// Decodes a `column -> options` mapping. Column names are lowercased.
///
/// Only a config that is not a mapping fails the check type.
pub fn decode_columns<T>(
    kind: CheckKind,
    config: &serde_yaml::Value,
) -> Result<ColumnConfigs<T>, DomainError>
where
    T: DeserializeOwned + Default,
{
    let mapping = match config {
        serde_yaml::Value::Mapping(m) => m,
        serde_yaml::Value::Null => return Ok(Vec::new()),
        other => {
            return Err(DomainError::CheckConfig {
                check: kind.name().into(),
                column: "*".into(),
                reason: format!("expected a mapping of columns, got {other:?}"),
            });
        }
    };

    let mut columns = Vec::with_capacity(mapping.len());
    for (key, raw) in mapping {
        let (column, cfg) = match key {
            serde_yaml::Value::String(s) => {
                let column = s.to_lowercase();
                let cfg = match raw {
                    serde_yaml::Value::Null => Ok(ColumnCheckConfig::<T>::default()),
                    _ => serde_yaml::from_value(raw.clone()).map_err(|e| {
                        CheckEvaluationError::Configuration {
                            column: column.clone(),
                            reason: e.to_string(),
                        }
                    }),
                };
                (column, cfg)
            }
            other => {
                let column = format!("{other:?}");
                let err = CheckEvaluationError::Configuration {
                    column: column.clone(),
                    reason: "column names must be strings".into(),
                };
                (column, Err(err))
            }
        };
        columns.push((column, cfg));
    }
    Ok(columns)
}

// --- SHARED STATE ---

/// Private snapshot a check works on.
#[derive(Debug, Clone)]
pub struct CheckContext {
    pub data: Dataset,
    pub date_col: String,
    pub id_col: String,
}

impl CheckContext {
    pub fn new(dataset: &Dataset, date_col: &str, id_col: &str) -> Result<Self, DomainError> {
        Ok(Self {
            data: dataset.to_lowercase_columns()?,
            date_col: date_col.to_lowercase(),
            id_col: id_col.to_lowercase(),
        })
    }

    /// Latest date in the snapshot, today when there is none.
    pub fn report_date(&self) -> NaiveDate {
        latest_or_today(&self.data.distinct_dates(&self.date_col))
    }
}

pub fn latest_or_today(dates: &[NaiveDate]) -> NaiveDate {
    dates
        .last()
        .copied()
        .unwrap_or_else(|| Utc::now().date_naive())
}

/// Rows of one configured column after filtering, decoded once.
pub struct ColumnView<'a> {
    pub data: Dataset,
    pub column: &'a str,
    values: Vec<Value>,
    ids: Vec<Value>,
    dates: Vec<Option<NaiveDate>>,
}

impl<'a> ColumnView<'a> {
    pub fn new(data: Dataset, column: &'a str, date_col: &str, id_col: &str) -> Self {
        let rows = data.num_rows();
        let values = data.column(column).unwrap_or_default();
        let ids = data
            .column(id_col)
            .unwrap_or_else(|| vec![Value::Null; rows]);
        let dates = data.dates(date_col).unwrap_or_else(|| vec![None; rows]);
        Self {
            data,
            column,
            values,
            ids,
            dates,
        }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Distinct dates of the filtered rows, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.dates
            .iter()
            .flatten()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn rows_on(&self, date: NaiveDate) -> impl Iterator<Item = usize> + '_ {
        self.dates
            .iter()
            .enumerate()
            .filter(move |(_, d)| **d == Some(date))
            .map(|(i, _)| i)
    }

    pub fn non_null_on(&self, date: NaiveDate) -> Vec<&Value> {
        self.rows_on(date)
            .map(|row| &self.values[row])
            .filter(|v| !v.is_null())
            .collect()
    }

    pub fn numeric_on(&self, date: NaiveDate) -> Result<Vec<f64>, CheckEvaluationError> {
        numeric(self.column, self.non_null_on(date))
    }

    /// `(id, value)` pairs on `date`, first occurrence per id, nulls on either side skipped.
    pub fn keyed_on(&self, date: NaiveDate) -> Vec<(ValueKey, &Value)> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for row in self.rows_on(date) {
            let value = &self.values[row];
            if value.is_null() {
                continue;
            }
            if let Some(key) = self.ids[row].key()
                && seen.insert(key.clone())
            {
                out.push((key, value));
            }
        }
        out
    }
}

/// Non-null values as `f64`. Booleans count as 0/1; anything else non-numeric is an error.
pub fn numeric<'v>(
    column: &str,
    values: impl IntoIterator<Item = &'v Value>,
) -> Result<Vec<f64>, CheckEvaluationError> {
    values
        .into_iter()
        .filter(|v| !v.is_null())
        .map(|v| match v {
            Value::Bool(b) => Ok(f64::from(u8::from(*b))),
            other => other
                .as_f64()
                .ok_or_else(|| CheckEvaluationError::NonNumeric {
                    column: column.to_string(),
                    value: format!("{other} ({})", other.type_name()),
                }),
        })
        .collect()
}

/// Echo of the column configuration carried by each record.
pub fn echo_of<T: Serialize>(cfg: &ColumnCheckConfig<T>) -> RecordEcho {
    RecordEcho {
        thresholds: serde_json::to_value(&cfg.thresholds).unwrap_or_default(),
        description: cfg.description.clone(),
        filter_applied: cfg.filter_condition.clone(),
        column_alias: cfg.column_alias.clone(),
    }
}

/// Runs `eval` for every enabled column, converting configuration errors,
/// filter errors, missing columns and evaluation failures (panics included)
/// into ERROR records.
pub fn run_columns<T, F>(
    kind: CheckKind,
    ctx: &CheckContext,
    columns: &ColumnConfigs<T>,
    mut eval: F,
) -> Vec<ResultRecord>
where
    T: Serialize,
    F: FnMut(&ColumnView<'_>, &ColumnCheckConfig<T>, &RecordEcho) -> Result<Vec<ResultRecord>, CheckEvaluationError>,
{
    let mut records = Vec::new();

    for (column, decoded) in columns {
        let cfg = match decoded {
            Ok(cfg) => cfg,
            Err(err) => {
                error!(check = %kind, column = %column, error = %err, "Column configuration rejected");
                records.push(ResultRecord::column_error(
                    kind.name(),
                    column,
                    ctx.report_date(),
                    err,
                    &RecordEcho::default(),
                ));
                continue;
            }
        };
        if !cfg.enabled {
            debug!(check = %kind, column = %column, "Column disabled, skipping");
            continue;
        }
        let echo = echo_of(cfg);

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let data = match cfg.filter_condition.as_deref() {
                Some(src) if !src.trim().is_empty() => {
                    RowFilter::compile(src, &ctx.data)?.apply(&ctx.data)?
                }
                _ => ctx.data.clone(),
            };

            if !data.has_column(column) {
                return Err(CheckEvaluationError::MissingColumn {
                    column: column.clone(),
                    available: data.column_names(),
                });
            }

            let view = ColumnView::new(data, column, &ctx.date_col, &ctx.id_col);
            eval(&view, cfg, &echo)
        }))
        .unwrap_or_else(|payload| Err(CheckEvaluationError::Calculation(panic_message(&*payload))));

        match outcome {
            Ok(mut produced) => records.append(&mut produced),
            Err(err) => {
                error!(check = %kind, column = %column, error = %err, "Column check failed");
                records.push(ResultRecord::column_error(
                    kind.name(),
                    column,
                    ctx.report_date(),
                    &err,
                    &echo,
                ));
            }
        }
    }

    records
}

pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// PASS record explaining why the metric could not be computed.
pub fn insufficient(
    kind: CheckKind,
    column: &str,
    date: NaiveDate,
    metric: f64,
    message: &str,
    extra: serde_json::Map<String, serde_json::Value>,
    echo: &RecordEcho,
) -> ResultRecord {
    let mut metrics = extra;
    metrics.insert("message".into(), serde_json::Value::String(message.into()));
    ResultRecord::new(kind.name(), column, date, metric, Evaluation::pass(), metrics, echo)
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_kind_names_match_exactly() {
        for kind in CheckKind::ALL {
            assert_eq!(CheckKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(CheckKind::from_name("Value_Spike"), None);
        assert_eq!(CheckKind::from_name("value_spike "), None);
        assert_eq!(CheckKind::from_name("freshness"), None);
    }

    #[test]
    fn test_config_keys_are_lowercased() {
        let config: serde_yaml::Value = serde_yaml::from_str("Amount: {}\nREGION:\n").unwrap();
        let cols = decode_columns::<ThresholdSpec>(CheckKind::Completeness, &config).unwrap();
        let names: Vec<_> = cols.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(names, ["amount", "region"]);
        assert!(cols.iter().all(|(_, cfg)| cfg.is_ok()));
    }

    #[test]
    fn test_bad_column_options_do_not_sink_the_check() {
        let ds = frame("amount", &[(1, 1, Value::Int(1)), (2, 1, Value::Null)]);
        let records = run(
            CheckKind::Completeness,
            &ds,
            "amount: {}\nother: { thresholds: { absolute_critical: high } }",
        );
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].column.as_deref(), Some("amount"));
        assert_ne!(records[0].status, CheckStatus::Error);

        let bad = &records[1];
        assert_eq!(bad.column.as_deref(), Some("other"));
        assert_eq!(bad.status, CheckStatus::Error);
        let err = bad.error.as_ref().unwrap();
        assert_eq!(err.error_type, "ConfigurationError");
        assert_eq!(err.context["column"], serde_json::json!("other"));
    }

    #[test]
    fn test_non_mapping_config_is_a_build_error() {
        let config: serde_yaml::Value = serde_yaml::from_str("[amount]").unwrap();
        let ds = frame("amount", &[(1, 1, Value::Int(1))]);
        let res = CheckKind::Completeness.build(&ds, "date", "id", &config);
        assert!(matches!(res, Err(DomainError::CheckConfig { .. })));
    }

    #[test]
    fn test_panicking_column_becomes_one_error_record() {
        let ds = Dataset::from_rows(
            vec!["id".into(), "date".into(), "amount".into(), "price".into()],
            vec![vec![Value::Int(1), Value::Date(day(1)), Value::Int(5), Value::Int(7)]],
        )
        .unwrap();
        let ctx = CheckContext::new(&ds, "date", "id").unwrap();
        let columns: ColumnConfigs = vec![
            ("amount".into(), Ok(ColumnCheckConfig::default())),
            ("price".into(), Ok(ColumnCheckConfig::default())),
        ];

        let records = run_columns(CheckKind::Range, &ctx, &columns, |view, _cfg, echo| {
            if view.column == "amount" {
                let empty: Vec<f64> = Vec::new();
                let _ = empty[view.values().len()];
            }
            Ok(vec![insufficient(
                CheckKind::Range,
                view.column,
                day(1),
                0.0,
                "evaluated",
                serde_json::Map::new(),
                echo,
            )])
        });

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, CheckStatus::Error);
        assert_eq!(records[0].column.as_deref(), Some("amount"));
        let err = records[0].error.as_ref().unwrap();
        assert_eq!(err.error_type, "Calculation");
        assert!(err.message.contains("index out of bounds"), "{}", err.message);
        assert_eq!(records[1].status, CheckStatus::Pass);
        assert_eq!(records[1].column.as_deref(), Some("price"));
    }

    #[test]
    fn test_filter_runs_before_column_lookup() {
        let ds = frame(
            "amount",
            &[(1, 1, Value::Int(5)), (2, 1, Value::Null), (3, 1, Value::Int(9))],
        );
        let records = run(
            CheckKind::Completeness,
            &ds,
            "amount: { filter_condition: \"id <> 2\" }",
        );
        assert_eq!(records[0].metric_value, Some(0.0));
        assert_eq!(records[0].filter_applied.as_deref(), Some("id <> 2"));
    }

    #[test]
    fn test_numeric_rejects_text() {
        let vals = [Value::Int(1), Value::from("x")];
        let err = numeric("amount", vals.iter()).unwrap_err();
        assert_eq!(err.error_type(), "NonNumeric");
    }
}
