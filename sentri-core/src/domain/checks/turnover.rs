// sentri-core/src/domain/checks/turnover.rs

use serde_json::{Map, Value as JsonValue, json};
use std::collections::BTreeSet;

use super::{
    Check, CheckContext, CheckKind, ColumnConfigs, ResultRecord, ThresholdKind, evaluate,
    insufficient, latest_or_today,
    result::{MAX_SAMPLE_SIZE, format_date, percent},
    run_columns,
};
use crate::domain::dataset::ValueKey;

/// Churn of the identifier set between the two most recent dates:
/// `(added + dropped) / |union|`.
pub struct TurnoverCheck {
    ctx: CheckContext,
    columns: ColumnConfigs,
}

impl TurnoverCheck {
    pub fn new(ctx: CheckContext, columns: ColumnConfigs) -> Self {
        Self { ctx, columns }
    }
}

impl Check for TurnoverCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Turnover
    }

    fn run(&self) -> Vec<ResultRecord> {
        run_columns(self.kind(), &self.ctx, &self.columns, |view, cfg, echo| {
            let dates = view.dates();
            let [.., prev, curr] = dates[..] else {
                let mut extra = Map::new();
                extra.insert("date_count".into(), json!(dates.len()));
                return Ok(vec![insufficient(
                    self.kind(),
                    view.column,
                    latest_or_today(&dates),
                    0.0,
                    "Insufficient dates for turnover comparison",
                    extra,
                    echo,
                )]);
            };

            let ids_on = |date| -> BTreeSet<ValueKey> {
                view.non_null_on(date).into_iter().filter_map(|v| v.key()).collect()
            };
            let prev_ids = ids_on(prev);
            let curr_ids = ids_on(curr);

            let added: Vec<&ValueKey> = curr_ids.difference(&prev_ids).collect();
            let dropped: Vec<&ValueKey> = prev_ids.difference(&curr_ids).collect();
            let union = prev_ids.union(&curr_ids).count();

            let rate = if union > 0 {
                (added.len() + dropped.len()) as f64 / union as f64
            } else {
                0.0
            };

            let sample = |keys: &[&ValueKey]| -> JsonValue {
                JsonValue::Array(keys.iter().take(MAX_SAMPLE_SIZE).map(|k| k.to_json()).collect())
            };

            let mut metrics = Map::new();
            metrics.insert("added_count".into(), json!(added.len()));
            metrics.insert("dropped_count".into(), json!(dropped.len()));
            metrics.insert("turnover_rate".into(), json!(percent(rate)));
            metrics.insert("total_unique_ids".into(), json!(union));
            metrics.insert("previous_date".into(), json!(format_date(prev)));
            metrics.insert("current_date".into(), json!(format_date(curr)));
            metrics.insert("added_ids_sample".into(), sample(&added));
            metrics.insert("dropped_ids_sample".into(), sample(&dropped));

            Ok(vec![ResultRecord::new(
                self.kind().name(),
                view.column,
                curr,
                rate,
                evaluate(rate, &cfg.thresholds, ThresholdKind::Absolute),
                metrics,
                echo,
            )])
        })
    }
}
