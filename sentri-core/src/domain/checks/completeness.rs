// sentri-core/src/domain/checks/completeness.rs

use serde_json::{Map, json};

use super::{
    Check, CheckContext, CheckKind, ColumnConfigs, ResultRecord, ThresholdKind, evaluate,
    result::percent, run_columns,
};

/// Share of missing values per column.
pub struct CompletenessCheck {
    ctx: CheckContext,
    columns: ColumnConfigs,
}

impl CompletenessCheck {
    pub fn new(ctx: CheckContext, columns: ColumnConfigs) -> Self {
        Self { ctx, columns }
    }
}

impl Check for CompletenessCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Completeness
    }

    fn run(&self) -> Vec<ResultRecord> {
        let date = self.ctx.report_date();
        run_columns(self.kind(), &self.ctx, &self.columns, |view, cfg, echo| {
            let values = view.values();
            let total = values.len();
            let nulls = values.iter().filter(|v| v.is_null()).count();
            let ratio = if total > 0 {
                nulls as f64 / total as f64
            } else {
                0.0
            };

            let mut metrics = Map::new();
            metrics.insert("null_count".into(), json!(nulls));
            metrics.insert("total_count".into(), json!(total));
            metrics.insert("null_percentage".into(), json!(percent(ratio)));

            Ok(vec![ResultRecord::new(
                self.kind().name(),
                view.column,
                date,
                ratio,
                evaluate(ratio, &cfg.thresholds, ThresholdKind::Absolute),
                metrics,
                echo,
            )])
        })
    }
}
