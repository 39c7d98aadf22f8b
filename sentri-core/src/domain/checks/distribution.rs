// sentri-core/src/domain/checks/distribution.rs

use serde_json::{Map, json};

use super::{
    Check, CheckContext, CheckKind, ColumnConfigs, Evaluation, ResultRecord, ThresholdSpec,
    insufficient, latest_or_today, result::round_to, run_columns,
};
use crate::domain::stats;

pub const DEFAULT_P_VALUE_CRITICAL: f64 = 0.05;

/// Two-sample Kolmogorov-Smirnov test between the two most recent dates.
/// The metric is the p-value; a small p-value means the distribution moved.
pub struct DistributionCheck {
    ctx: CheckContext,
    columns: ColumnConfigs,
}

impl DistributionCheck {
    pub fn new(ctx: CheckContext, columns: ColumnConfigs) -> Self {
        Self { ctx, columns }
    }
}

pub fn evaluate_p_value(p: f64, thresholds: &ThresholdSpec) -> Evaluation {
    let critical = thresholds
        .absolute_critical
        .unwrap_or(DEFAULT_P_VALUE_CRITICAL);
    if p < critical {
        return Evaluation::fail(critical);
    }
    if let Some(warning) = thresholds.absolute_warning
        && p < warning
    {
        return Evaluation::warning(warning);
    }
    Evaluation::pass()
}

impl Check for DistributionCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Distribution
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
                    "Insufficient dates for distribution comparison",
                    Map::new(),
                    echo,
                )]);
            };

            let before = view.numeric_on(prev)?;
            let after = view.numeric_on(curr)?;
            if before.len() < 2 || after.len() < 2 {
                return Ok(vec![insufficient(
                    self.kind(),
                    view.column,
                    curr,
                    0.0,
                    "Insufficient data for KS test",
                    Map::new(),
                    echo,
                )]);
            }

            let (statistic, p_value) = stats::ks_two_sample(&before, &after);

            let mut metrics = Map::new();
            metrics.insert("ks_statistic".into(), json!(round_to(statistic, 4)));
            metrics.insert("p_value".into(), json!(round_to(p_value, 4)));
            metrics.insert("prev_count".into(), json!(before.len()));
            metrics.insert("curr_count".into(), json!(after.len()));

            Ok(vec![ResultRecord::new(
                self.kind().name(),
                view.column,
                curr,
                p_value,
                evaluate_p_value(p_value, &cfg.thresholds),
                metrics,
                echo,
            )])
        })
    }
}
