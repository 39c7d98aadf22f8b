// sentri-core/src/domain/checks/correlation.rs

use serde_json::{Map, json};
use std::collections::HashMap;

use super::{
    Check, CheckContext, CheckKind, ColumnCheckConfig, ColumnConfigs, ColumnView, CorrelationType,
    Evaluation, RecordEcho, ResultRecord, ThresholdSpec, insufficient, numeric, result::round_to, run_columns,
};
use crate::domain::error::CheckEvaluationError;
use crate::domain::stats;

pub const DEFAULT_CORRELATION_CRITICAL: f64 = 0.8;

/// Pearson correlation that is expected to stay HIGH.
///
/// Polarity is inverted relative to the other checks: the record fails when
/// `|r|` drops below the critical limit (and warns below the optional warning
/// limit). `temporal` correlates a column with itself across the two most
/// recent dates, matched by identifier; `cross_column` correlates it with
/// `correlation_with` over rows where both are present.
pub struct CorrelationCheck {
    ctx: CheckContext,
    columns: ColumnConfigs,
}

impl CorrelationCheck {
    pub fn new(ctx: CheckContext, columns: ColumnConfigs) -> Self {
        Self { ctx, columns }
    }
}

/// Low correlation is the failure condition.
pub fn evaluate_correlation(r: f64, thresholds: &ThresholdSpec) -> Evaluation {
    let strength = r.abs();
    let critical = thresholds
        .absolute_critical
        .unwrap_or(DEFAULT_CORRELATION_CRITICAL);
    if strength < critical {
        return Evaluation::fail(critical);
    }
    if let Some(warning) = thresholds.absolute_warning
        && strength < warning
    {
        return Evaluation::warning(warning);
    }
    Evaluation::pass()
}

enum Pairs {
    Ready(Vec<f64>, Vec<f64>),
    Insufficient(&'static str),
}

fn cross_column_pairs(
    view: &ColumnView<'_>,
    cfg: &ColumnCheckConfig,
) -> Result<Pairs, CheckEvaluationError> {
    let other = cfg.correlation_with.as_deref().map(str::to_lowercase);
    let Some(other_values) = other.as_deref().and_then(|o| view.data.column(o)) else {
        return Err(CheckEvaluationError::MissingCorrelationTarget { column: other });
    };

    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for (a, b) in view.values().iter().zip(other_values) {
        if a.is_null() || b.is_null() {
            continue;
        }
        let pair = numeric(view.column, [a, &b])?;
        xs.push(pair[0]);
        ys.push(pair[1]);
    }
    if xs.len() < 2 {
        return Ok(Pairs::Insufficient("Insufficient paired values for correlation"));
    }
    Ok(Pairs::Ready(xs, ys))
}

fn temporal_pairs(view: &ColumnView<'_>) -> Result<Pairs, CheckEvaluationError> {
    let dates = view.dates();
    let [.., prev, curr] = dates[..] else {
        return Ok(Pairs::Insufficient("Insufficient dates for temporal correlation"));
    };

    let curr_rows: HashMap<_, _> = view.keyed_on(curr).into_iter().collect();
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for (id, before) in view.keyed_on(prev) {
        if let Some(after) = curr_rows.get(&id) {
            let pair = numeric(view.column, [before, *after])?;
            xs.push(pair[0]);
            ys.push(pair[1]);
        }
    }
    if xs.len() < 2 {
        return Ok(Pairs::Insufficient("Insufficient matching records for correlation"));
    }
    Ok(Pairs::Ready(xs, ys))
}

impl Check for CorrelationCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Correlation
    }

    fn run(&self) -> Vec<ResultRecord> {
        let date = self.ctx.report_date();
        run_columns(self.kind(), &self.ctx, &self.columns, |view, cfg, echo: &RecordEcho| {
            let pairs = match cfg.correlation_type {
                CorrelationType::CrossColumn => cross_column_pairs(view, cfg)?,
                CorrelationType::Temporal => temporal_pairs(view)?,
            };

            let undefined = |message: &str| {
                let mut extra = Map::new();
                extra.insert("correlation_type".into(), json!(cfg.correlation_type.as_str()));
                insufficient(self.kind(), view.column, date, 1.0, message, extra, echo)
            };

            let (xs, ys) = match pairs {
                Pairs::Ready(xs, ys) => (xs, ys),
                Pairs::Insufficient(message) => return Ok(vec![undefined(message)]),
            };

            let Some(r) = stats::pearson(&xs, &ys) else {
                return Ok(vec![undefined("Correlation is undefined for a constant series")]);
            };

            let mut metrics = Map::new();
            metrics.insert("correlation_type".into(), json!(cfg.correlation_type.as_str()));
            metrics.insert("correlation_value".into(), json!(round_to(r, 4)));

            Ok(vec![ResultRecord::new(
                self.kind().name(),
                view.column,
                date,
                r,
                evaluate_correlation(r, &cfg.thresholds),
                metrics,
                echo,
            )])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::checks::CheckStatus;
    use crate::domain::checks::test_support::{day, frame, run};
    use crate::domain::dataset::{Dataset, Value};

    fn paired(xs: &[f64], ys: &[f64]) -> anyhow::Result<Dataset> {
        let rows = xs
            .iter()
            .zip(ys)
            .enumerate()
            .map(|(i, (x, y))| {
                vec![
                    Value::Int(i as i64),
                    Value::Date(day(1)),
                    Value::Float(*x),
                    Value::Float(*y),
                ]
            })
            .collect();
        Ok(Dataset::from_rows(
            vec!["id".into(), "date".into(), "price".into(), "demand".into()],
            rows,
        )?)
    }

    #[test]
    fn test_strong_negative_correlation_passes() -> anyhow::Result<()> {
        // r is about -0.95
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let ys = [10.0, 9.5, 7.0, 7.2, 4.0, 3.9];
        let r = stats::pearson(&xs, &ys).unwrap_or_default();
        assert!(r < -0.9 && r > -1.0);

        let ds = paired(&xs, &ys)?;
        let yaml = r#"
price:
  correlation_type: cross_column
  correlation_with: Demand
  thresholds: { absolute_critical: 0.8 }
"#;
        let records = run(CheckKind::Correlation, &ds, yaml);
        assert_eq!(records[0].status, CheckStatus::Pass);
        assert!(records[0].metric_value.unwrap_or_default() < 0.0);
        assert_eq!(records[0].additional_metrics["correlation_type"], "cross_column");
        Ok(())
    }

    #[test]
    fn test_weak_correlation_fails_with_default_limit() -> anyhow::Result<()> {
        let ds = paired(&[1.0, 2.0, 3.0, 4.0], &[2.0, 1.0, 2.0, 1.0])?;
        let yaml = "price: { correlation_type: cross_column, correlation_with: demand }";
        let records = run(CheckKind::Correlation, &ds, yaml);
        assert_eq!(records[0].status, CheckStatus::Fail);
        assert_eq!(records[0].exceeded_threshold, Some(json!(0.8)));
        Ok(())
    }

    #[test]
    fn test_missing_target_is_column_error() -> anyhow::Result<()> {
        let ds = paired(&[1.0, 2.0], &[2.0, 1.0])?;
        for yaml in [
            "price: { correlation_type: cross_column }",
            "price: { correlation_type: cross_column, correlation_with: ghost }",
        ] {
            let records = run(CheckKind::Correlation, &ds, yaml);
            assert_eq!(records[0].status, CheckStatus::Error);
            let kind = records[0].error.as_ref().map(|e| e.error_type.clone());
            assert_eq!(kind.as_deref(), Some("MissingCorrelationTarget"));
        }
        Ok(())
    }

    #[test]
    fn test_temporal_matches_ids_across_dates() {
        let ds = frame(
            "score",
            &[
                (1, 1, Value::Int(10)),
                (2, 1, Value::Int(20)),
                (3, 1, Value::Int(30)),
                (3, 2, Value::Int(31)),
                (1, 2, Value::Int(11)),
                (2, 2, Value::Int(19)),
            ],
        );
        let records = run(CheckKind::Correlation, &ds, "score: {}");
        let r = &records[0];
        assert_eq!(r.status, CheckStatus::Pass);
        assert!(r.metric_value.unwrap_or_default() > 0.95);
        assert_eq!(r.additional_metrics["correlation_type"], "temporal");
    }

    #[test]
    fn test_temporal_single_date_reports_one() {
        let ds = frame("score", &[(1, 1, Value::Int(10)), (2, 1, Value::Int(12))]);
        let records = run(CheckKind::Correlation, &ds, "score: {}");
        assert_eq!(records[0].metric_value, Some(1.0));
        assert_eq!(records[0].status, CheckStatus::Pass);
    }

    #[test]
    fn test_constant_series_passes_with_message() {
        let ds = frame(
            "score",
            &[
                (1, 1, Value::Float(5.0)),
                (2, 1, Value::Float(5.0)),
                (3, 1, Value::Float(5.0)),
                (1, 2, Value::Float(5.0)),
                (2, 2, Value::Float(5.0)),
                (3, 2, Value::Float(5.0)),
            ],
        );
        let records = run(CheckKind::Correlation, &ds, "score: {}");
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.status, CheckStatus::Pass);
        assert!(r.error.is_none());
        assert_eq!(r.metric_value, Some(1.0));
        assert_eq!(
            r.additional_metrics["message"],
            "Correlation is undefined for a constant series"
        );
    }

    #[test]
    fn test_warning_tier_sits_above_critical() {
        let t = ThresholdSpec {
            absolute_critical: Some(0.8),
            absolute_warning: Some(0.9),
            ..ThresholdSpec::default()
        };
        assert_eq!(evaluate_correlation(0.85, &t).status, CheckStatus::Warning);
        assert_eq!(evaluate_correlation(-0.95, &t).status, CheckStatus::Pass);
        assert_eq!(evaluate_correlation(0.5, &t).status, CheckStatus::Fail);
    }
}
