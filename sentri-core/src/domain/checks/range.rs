// sentri-core/src/domain/checks/range.rs

use serde_json::{Map, json};

use super::{
    Check, CheckContext, CheckKind, CheckStatus, ColumnConfigs, Evaluation, ResultRecord,
    Severity, numeric,
    result::{MAX_SAMPLE_SIZE, percent},
    run_columns,
};
use crate::domain::stats;

/// Share of values outside `[min_value, max_value]`. Any violation fails.
pub struct RangeCheck {
    ctx: CheckContext,
    columns: ColumnConfigs,
}

impl RangeCheck {
    pub fn new(ctx: CheckContext, columns: ColumnConfigs) -> Self {
        Self { ctx, columns }
    }
}

impl Check for RangeCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Range
    }

    fn run(&self) -> Vec<ResultRecord> {
        let date = self.ctx.report_date();
        run_columns(self.kind(), &self.ctx, &self.columns, |view, cfg, echo| {
            let values = numeric(view.column, view.values())?;
            let total = values.len();

            if total == 0 {
                let mut metrics = Map::new();
                metrics.insert("out_of_range_count".into(), json!(0));
                metrics.insert("total_count".into(), json!(0));
                metrics.insert("message".into(), json!("No non-null values to check"));
                return Ok(vec![ResultRecord::new(
                    self.kind().name(),
                    view.column,
                    date,
                    0.0,
                    Evaluation::pass(),
                    metrics,
                    echo,
                )]);
            }

            let below: Vec<f64> = match cfg.min_value {
                Some(min) => values.iter().copied().filter(|v| *v < min).collect(),
                None => Vec::new(),
            };
            let above: Vec<f64> = match cfg.max_value {
                Some(max) => values.iter().copied().filter(|v| *v > max).collect(),
                None => Vec::new(),
            };

            let out_of_range = below.len() + above.len();
            let ratio = out_of_range as f64 / total as f64;
            let evaluation = if out_of_range > 0 {
                Evaluation {
                    status: CheckStatus::Fail,
                    severity: Severity::Critical,
                    exceeded_threshold: None,
                }
            } else {
                Evaluation::pass()
            };

            let mut metrics = Map::new();
            metrics.insert("out_of_range_count".into(), json!(out_of_range));
            metrics.insert("total_count".into(), json!(total));
            metrics.insert("out_of_range_percentage".into(), json!(percent(ratio)));
            metrics.insert("dataset_min".into(), json!(stats::min(&values)));
            metrics.insert("dataset_max".into(), json!(stats::max(&values)));
            metrics.insert("configured_min".into(), json!(cfg.min_value));
            metrics.insert("configured_max".into(), json!(cfg.max_value));
            metrics.insert(
                "below_min_sample".into(),
                json!(below.iter().take(MAX_SAMPLE_SIZE).collect::<Vec<_>>()),
            );
            metrics.insert(
                "above_max_sample".into(),
                json!(above.iter().take(MAX_SAMPLE_SIZE).collect::<Vec<_>>()),
            );

            Ok(vec![ResultRecord::new(
                self.kind().name(),
                view.column,
                date,
                ratio,
                evaluation,
                metrics,
                echo,
            )])
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::checks::test_support::{frame, run};
    use crate::domain::checks::{CheckKind, CheckStatus, Severity};
    use crate::domain::dataset::Value;

    fn readings() -> crate::domain::dataset::Dataset {
        let rows: Vec<_> = [-2i64, 5, 7, 12]
            .iter()
            .enumerate()
            .map(|(i, v)| (i as i64, 1, Value::Int(*v)))
            .collect();
        frame("reading", &rows)
    }

    #[test]
    fn test_both_bounds() {
        let records = run(CheckKind::Range, &readings(), "reading: { min_value: 0, max_value: 10 }");
        let r = &records[0];
        assert_eq!(r.additional_metrics["out_of_range_count"], 2);
        assert_eq!(r.status, CheckStatus::Fail);
        assert_eq!(r.severity, Severity::Critical);
        assert_eq!(r.metric_value, Some(0.5));
        assert_eq!(r.additional_metrics["below_min_sample"], serde_json::json!([-2.0]));
    }

    #[test]
    fn test_missing_lower_bound_never_flags() {
        let records = run(CheckKind::Range, &readings(), "reading: { max_value: 10 }");
        let r = &records[0];
        assert_eq!(r.additional_metrics["out_of_range_count"], 1);
        assert_eq!(r.additional_metrics["above_max_sample"], serde_json::json!([12.0]));
        assert_eq!(r.additional_metrics["configured_min"], serde_json::Value::Null);
    }

    #[test]
    fn test_all_null_passes() {
        let ds = frame("reading", &[(1, 1, Value::Null)]);
        let records = run(CheckKind::Range, &ds, "reading: { min_value: 0 }");
        assert_eq!(records[0].status, CheckStatus::Pass);
        assert_eq!(records[0].metric_value, Some(0.0));
    }

    #[test]
    fn test_text_values_are_a_column_error() {
        let ds = frame("reading", &[(1, 1, Value::from("high"))]);
        let records = run(CheckKind::Range, &ds, "reading: { min_value: 0 }");
        assert_eq!(records[0].status, CheckStatus::Error);
    }
}
