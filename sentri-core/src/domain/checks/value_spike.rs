// sentri-core/src/domain/checks/value_spike.rs

use serde_json::{Map, json};
use std::collections::HashMap;

use super::{
    Check, CheckContext, CheckKind, ColumnConfigs, ResultRecord, insufficient,
    latest_or_today, numeric, result::percent, run_columns, ThresholdKind, evaluate,
};

/// Count of spikes is reported against this ratio when no critical limit is configured.
pub const DEFAULT_SPIKE_CRITICAL: f64 = 10.0;

/// Largest relative change of a record's value between the two most recent dates.
///
/// Records are matched by identifier (first occurrence per date). Pairs whose
/// previous value is zero have no defined ratio and are left out.
pub struct ValueSpikeCheck {
    ctx: CheckContext,
    columns: ColumnConfigs,
}

impl ValueSpikeCheck {
    pub fn new(ctx: CheckContext, columns: ColumnConfigs) -> Self {
        Self { ctx, columns }
    }
}

impl Check for ValueSpikeCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::ValueSpike
    }

    fn run(&self) -> Vec<ResultRecord> {
        run_columns(self.kind(), &self.ctx, &self.columns, |view, cfg, echo| {
            let dates = view.dates();
            let [.., prev, curr] = dates[..] else {
                return Ok(vec![insufficient(
                    self.kind(),
                    view.column,
                    latest_or_today(&dates),
                    0.0,
                    "Insufficient dates for comparison",
                    Map::new(),
                    echo,
                )]);
            };

            let prev_rows = view.keyed_on(prev);
            let curr_rows: HashMap<_, _> = view.keyed_on(curr).into_iter().collect();

            let mut pairs = Vec::new();
            for (id, before) in &prev_rows {
                if let Some(after) = curr_rows.get(id) {
                    let values = numeric(view.column, [*before, *after])?;
                    pairs.push((values[0], values[1]));
                }
            }

            if pairs.is_empty() {
                return Ok(vec![insufficient(
                    self.kind(),
                    view.column,
                    curr,
                    0.0,
                    "No matching records between periods",
                    Map::new(),
                    echo,
                )]);
            }

            let changes: Vec<f64> = pairs
                .iter()
                .filter(|(p, _)| *p != 0.0)
                .map(|(p, c)| ((c - p) / p).abs())
                .filter(|r| r.is_finite())
                .collect();
            let max_spike = changes.iter().copied().fold(0.0, f64::max);

            let critical = cfg.thresholds.absolute_critical.unwrap_or(DEFAULT_SPIKE_CRITICAL);
            let above = changes.iter().filter(|c| **c > critical).count();

            let mut metrics = Map::new();
            metrics.insert("max_spike_percentage".into(), json!(percent(max_spike)));
            metrics.insert("records_analyzed".into(), json!(pairs.len()));
            metrics.insert("spikes_above_critical".into(), json!(above));

            Ok(vec![ResultRecord::new(
                self.kind().name(),
                view.column,
                curr,
                max_spike,
                evaluate(max_spike, &cfg.thresholds, ThresholdKind::Absolute),
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

    #[test]
    fn test_max_relative_change_over_matched_ids() {
        let ds = frame(
            "balance",
            &[
                (1, 1, Value::Int(100)),
                (2, 1, Value::Int(50)),
                (3, 1, Value::Int(0)),
                (1, 2, Value::Int(110)),
                (2, 2, Value::Int(150)),
                (3, 2, Value::Int(999)),
                (4, 2, Value::Int(10)),
            ],
        );
        let records = run(
            CheckKind::ValueSpike,
            &ds,
            "balance: { thresholds: { absolute_critical: 1.5, absolute_warning: 0.5 } }",
        );
        let r = &records[0];
        assert_eq!(r.metric_value, Some(2.0));
        assert_eq!(r.status, CheckStatus::Fail);
        assert_eq!(r.additional_metrics["records_analyzed"], 3);
        assert_eq!(r.additional_metrics["spikes_above_critical"], 1);
        assert_eq!(r.additional_metrics["max_spike_percentage"], 200.0);
    }

    #[test]
    fn test_no_overlap_passes() {
        let ds = frame("balance", &[(1, 1, Value::Int(1)), (2, 2, Value::Int(5))]);
        let records = run(CheckKind::ValueSpike, &ds, "balance: {}");
        assert_eq!(records[0].status, CheckStatus::Pass);
        assert_eq!(records[0].metric_value, Some(0.0));
    }

    #[test]
    fn test_absolute_limit_holds_next_to_delta_limits() {
        let ds = frame("balance", &[(1, 1, Value::Int(10)), (1, 2, Value::Int(13))]);
        let records = run(
            CheckKind::ValueSpike,
            &ds,
            "balance: { thresholds: { absolute_critical: 0.1, delta_critical: 0.5 } }",
        );
        assert_eq!(records[0].metric_value, Some(0.3));
        assert_eq!(records[0].status, CheckStatus::Fail);
        assert_eq!(records[0].exceeded_threshold, Some(serde_json::json!(0.1)));
    }

    #[test]
    fn test_delta_only_limits_are_ignored() {
        let ds = frame("balance", &[(1, 1, Value::Int(10)), (1, 2, Value::Int(13))]);
        let records = run(
            CheckKind::ValueSpike,
            &ds,
            "balance: { thresholds: { delta_warning: 0.2 } }",
        );
        assert_eq!(records[0].status, CheckStatus::Pass);
    }
}
