// sentri-core/src/domain/checks/drift.rs

use serde_json::{Map, json};

use super::{
    Check, CheckContext, CheckKind, ColumnConfigs, Evaluation, ResultRecord, ThresholdSpec,
    insufficient, latest_or_today,
    result::{format_date, round_to},
    run_columns,
};
use crate::domain::stats::{self, PSI_MODERATE_DRIFT, PSI_NO_DRIFT};

const PSI_BINS: usize = 10;
const MIN_PSI_SAMPLE: usize = 10;

/// Population Stability Index of the latest date against the earliest one.
pub struct DriftCheck {
    ctx: CheckContext,
    columns: ColumnConfigs,
}

impl DriftCheck {
    pub fn new(ctx: CheckContext, columns: ColumnConfigs) -> Self {
        Self { ctx, columns }
    }
}

/// Limits are inclusive: `psi >= critical` fails, `psi >= warning` warns.
pub fn evaluate_psi(psi: f64, thresholds: &ThresholdSpec) -> (Evaluation, &'static str) {
    let critical = thresholds.absolute_critical.unwrap_or(PSI_MODERATE_DRIFT);
    let warning = thresholds.absolute_warning.unwrap_or(PSI_NO_DRIFT);
    if psi >= critical {
        (Evaluation::fail(critical), "Significant drift detected")
    } else if psi >= warning {
        (Evaluation::warning(warning), "Moderate drift detected")
    } else {
        (Evaluation::pass(), "No significant drift")
    }
}

impl Check for DriftCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Drift
    }

    fn run(&self) -> Vec<ResultRecord> {
        run_columns(self.kind(), &self.ctx, &self.columns, |view, cfg, echo| {
            let dates = view.dates();
            let [baseline_date, .., current_date] = dates[..] else {
                return Ok(vec![insufficient(
                    self.kind(),
                    view.column,
                    latest_or_today(&dates),
                    0.0,
                    "Insufficient dates for drift comparison",
                    Map::new(),
                    echo,
                )]);
            };

            let baseline = view.numeric_on(baseline_date)?;
            let current = view.numeric_on(current_date)?;
            if baseline.len() < MIN_PSI_SAMPLE || current.len() < MIN_PSI_SAMPLE {
                return Ok(vec![insufficient(
                    self.kind(),
                    view.column,
                    current_date,
                    0.0,
                    "Insufficient data for PSI calculation",
                    Map::new(),
                    echo,
                )]);
            }

            let psi = stats::psi(&baseline, &current, PSI_BINS);
            let (evaluation, interpretation) = evaluate_psi(psi, &cfg.thresholds);

            let mut metrics = Map::new();
            metrics.insert("psi".into(), json!(round_to(psi, 4)));
            metrics.insert("interpretation".into(), json!(interpretation));
            metrics.insert("baseline_date".into(), json!(format_date(baseline_date)));
            metrics.insert("current_date".into(), json!(format_date(current_date)));

            Ok(vec![ResultRecord::new(
                self.kind().name(),
                view.column,
                current_date,
                psi,
                evaluation,
                metrics,
                echo,
            )])
        })
    }
}
