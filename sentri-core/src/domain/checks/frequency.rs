// sentri-core/src/domain/checks/frequency.rs

use serde_json::{Map, json};
use std::collections::{BTreeSet, HashMap};

use super::{
    Check, CheckContext, CheckKind, ColumnConfigs, ResultRecord, insufficient,
    latest_or_today, result::percent, run_columns, ThresholdKind, evaluate,
};
use crate::domain::dataset::{Value, ValueKey};

const TOP_CATEGORIES: usize = 10;

/// Largest shift in a category's share between the two most recent dates.
pub struct FrequencyCheck {
    ctx: CheckContext,
    columns: ColumnConfigs,
}

impl FrequencyCheck {
    pub fn new(ctx: CheckContext, columns: ColumnConfigs) -> Self {
        Self { ctx, columns }
    }
}

fn shares(values: &[&Value]) -> HashMap<ValueKey, f64> {
    let mut counts: HashMap<ValueKey, usize> = HashMap::new();
    for key in values.iter().filter_map(|v| v.key()) {
        *counts.entry(key).or_insert(0) += 1;
    }
    let total: usize = counts.values().sum();
    counts
        .into_iter()
        .map(|(k, c)| (k, c as f64 / total as f64))
        .collect()
}

impl Check for FrequencyCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Frequency
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

            let before = shares(&view.non_null_on(prev));
            let after = shares(&view.non_null_on(curr));
            let categories: BTreeSet<&ValueKey> = before.keys().chain(after.keys()).collect();

            let max_change = categories
                .iter()
                .map(|k| {
                    let p = before.get(*k).copied().unwrap_or(0.0);
                    let c = after.get(*k).copied().unwrap_or(0.0);
                    (c - p).abs()
                })
                .fold(0.0, f64::max);

            let mut top: Vec<(&ValueKey, f64)> = after.iter().map(|(k, v)| (k, *v)).collect();
            top.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            let distribution: Map<String, serde_json::Value> = top
                .into_iter()
                .take(TOP_CATEGORIES)
                .map(|(k, v)| (k.to_string(), json!(v)))
                .collect();

            let mut metrics = Map::new();
            metrics.insert("max_frequency_change".into(), json!(percent(max_change)));
            metrics.insert("category_count".into(), json!(categories.len()));
            metrics.insert("current_distribution".into(), serde_json::Value::Object(distribution));

            Ok(vec![ResultRecord::new(
                self.kind().name(),
                view.column,
                curr,
                max_change,
                evaluate(max_change, &cfg.thresholds, ThresholdKind::Absolute),
                metrics,
                echo,
            )])
        })
    }
}
