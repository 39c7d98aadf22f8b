// sentri-core/src/domain/checks/uniqueness.rs

use serde_json::{Map, Value as JsonValue, json};
use std::collections::HashMap;

use super::{
    Check, CheckContext, CheckKind, ColumnConfigs, ResultRecord, ThresholdKind, evaluate,
    result::{MAX_SAMPLE_SIZE, percent},
    run_columns,
};
use crate::domain::dataset::ValueKey;

/// Counts surplus occurrences of repeated values.
///
/// A value seen `k > 1` times contributes `k - 1`, so `[1, 2, 3, 3, 3, 4]`
/// scores 2. Nulls never count as duplicates.
pub struct UniquenessCheck {
    ctx: CheckContext,
    columns: ColumnConfigs,
}

impl UniquenessCheck {
    pub fn new(ctx: CheckContext, columns: ColumnConfigs) -> Self {
        Self { ctx, columns }
    }
}

impl Check for UniquenessCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Uniqueness
    }

    fn run(&self) -> Vec<ResultRecord> {
        let date = self.ctx.report_date();
        run_columns(self.kind(), &self.ctx, &self.columns, |view, cfg, echo| {
            let values = view.values();
            let total_rows = values.len();

            // First-seen order is kept for the sample.
            let mut order: Vec<ValueKey> = Vec::new();
            let mut counts: HashMap<ValueKey, usize> = HashMap::new();
            for key in values.iter().filter_map(|v| v.key()) {
                let slot = counts.entry(key.clone()).or_insert(0);
                if *slot == 0 {
                    order.push(key);
                }
                *slot += 1;
            }

            let duplicated: Vec<&ValueKey> = order.iter().filter(|k| counts[*k] > 1).collect();
            let duplicated_rows: usize = duplicated.iter().map(|k| counts[*k]).sum();
            let duplicate_count = duplicated_rows - duplicated.len();

            let share = if total_rows > 0 {
                duplicate_count as f64 / total_rows as f64
            } else {
                0.0
            };
            let sample: Vec<JsonValue> = duplicated
                .iter()
                .take(MAX_SAMPLE_SIZE)
                .map(|k| k.to_json())
                .collect();

            let mut metrics = Map::new();
            metrics.insert("total_rows".into(), json!(total_rows));
            metrics.insert("unique_count".into(), json!(counts.len()));
            metrics.insert("duplicate_count".into(), json!(duplicate_count));
            metrics.insert("duplicate_percentage".into(), json!(percent(share)));
            metrics.insert("duplicated_values_sample".into(), JsonValue::Array(sample));

            let metric = duplicate_count as f64;
            Ok(vec![ResultRecord::new(
                self.kind().name(),
                view.column,
                date,
                metric,
                evaluate(metric, &cfg.thresholds, ThresholdKind::Absolute),
                metrics,
                echo,
            )])
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::checks::test_support::{frame, run};
    use crate::domain::checks::{CheckKind, CheckStatus};
    use crate::domain::dataset::Value;

    fn accounts() -> crate::domain::dataset::Dataset {
        let ids = [1i64, 2, 3, 3, 3, 4];
        let rows: Vec<_> = ids
            .iter()
            .enumerate()
            .map(|(i, acc)| (i as i64, 1, Value::Int(*acc)))
            .collect();
        frame("account", &rows)
    }

    #[test]
    fn test_extra_occurrences_are_counted() {
        let records = run(
            CheckKind::Uniqueness,
            &accounts(),
            "account: { thresholds: { absolute_critical: 0 } }",
        );
        let r = &records[0];
        assert_eq!(r.metric_value, Some(2.0));
        assert_eq!(r.status, CheckStatus::Fail);
        assert_eq!(r.additional_metrics["unique_count"], 4);
        assert_eq!(r.additional_metrics["duplicated_values_sample"], serde_json::json!([3]));
        assert_eq!(r.additional_metrics["duplicate_percentage"], 33.33);
    }

    #[test]
    fn test_loose_threshold_passes() {
        let records = run(
            CheckKind::Uniqueness,
            &accounts(),
            "account: { thresholds: { absolute_critical: 5 } }",
        );
        assert_eq!(records[0].status, CheckStatus::Pass);
    }

    #[test]
    fn test_nulls_are_not_duplicates() {
        let ds = frame(
            "account",
            &[(1, 1, Value::Null), (2, 1, Value::Null), (3, 1, Value::Int(7))],
        );
        let records = run(CheckKind::Uniqueness, &ds, "account: {}");
        assert_eq!(records[0].metric_value, Some(0.0));
    }
}
