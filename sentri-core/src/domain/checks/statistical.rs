// sentri-core/src/domain/checks/statistical.rs

use serde_json::{Map, json};

use super::{
    Check, CheckContext, CheckKind, ColumnConfigs, Evaluation, MeasureThreshold,
    MeasureThresholds, RecordEcho, ResultRecord, numeric, run_columns,
};
use crate::domain::stats;

pub const DEFAULT_MEASURES: [&str; 3] = ["mean", "std", "median"];

/// Summary statistics of a column, one record per requested measure.
///
/// Each measure may carry a scalar upper bound or an inclusive `[min, max]`
/// range as its critical/warning limit. Unknown measures are skipped and a
/// column without any non-null value produces no record.
pub struct StatisticalCheck {
    ctx: CheckContext,
    columns: ColumnConfigs<MeasureThresholds>,
}

impl StatisticalCheck {
    pub fn new(
        ctx: CheckContext,
        columns: ColumnConfigs<MeasureThresholds>,
    ) -> Self {
        Self { ctx, columns }
    }
}

fn measure(name: &str, values: &[f64]) -> Option<f64> {
    Some(match name {
        "mean" => stats::mean(values),
        "median" => stats::median(values),
        "std" => stats::std_dev(values),
        "min" => stats::min(values),
        "max" => stats::max(values),
        "count" => values.len() as f64,
        "skew" => stats::skewness(values),
        "kurtosis" => stats::kurtosis(values),
        _ => return None,
    })
}

pub fn evaluate_measure(value: f64, limits: &MeasureThreshold) -> Evaluation {
    if let Some(bound) = limits.absolute_critical
        && bound.is_violated_by(value)
    {
        return Evaluation::fail(bound.to_json());
    }
    if let Some(bound) = limits.absolute_warning
        && bound.is_violated_by(value)
    {
        return Evaluation::warning(bound.to_json());
    }
    Evaluation::pass()
}

impl Check for StatisticalCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Statistical
    }

    fn run(&self) -> Vec<ResultRecord> {
        let date = self.ctx.report_date();
        run_columns(self.kind(), &self.ctx, &self.columns, |view, cfg, echo| {
            let values = numeric(view.column, view.values())?;
            if values.is_empty() {
                return Ok(Vec::new());
            }

            let requested: Vec<String> = match &cfg.measures {
                Some(m) => m.iter().map(|s| s.to_lowercase()).collect(),
                None => DEFAULT_MEASURES.iter().map(|s| s.to_string()).collect(),
            };

            let mut records = Vec::new();
            for name in &requested {
                let Some(value) = measure(name, &values) else {
                    tracing::debug!(measure = %name, "Unknown statistical measure, skipping");
                    continue;
                };
                let limits = cfg.thresholds.get(name).copied().unwrap_or_default();
                let measure_echo = RecordEcho {
                    thresholds: serde_json::to_value(limits).unwrap_or_default(),
                    ..echo.clone()
                };

                let mut metrics = Map::new();
                metrics.insert("sample_size".into(), json!(values.len()));

                records.push(
                    ResultRecord::new(
                        self.kind().name(),
                        view.column,
                        date,
                        value,
                        evaluate_measure(value, &limits),
                        metrics,
                        &measure_echo,
                    )
                    .with_measure(name),
                );
            }
            Ok(records)
        })
    }
}
