// sentri-core/src/domain/checks/threshold.rs

use super::config::ThresholdSpec;
use super::result::{CheckStatus, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdKind {
    Absolute,
    Delta,
}

/// Outcome of comparing a metric against its limits.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub status: CheckStatus,
    pub severity: Severity,
    pub exceeded_threshold: Option<serde_json::Value>,
}

impl Evaluation {
    pub fn pass() -> Self {
        Self {
            status: CheckStatus::Pass,
            severity: Severity::Info,
            exceeded_threshold: None,
        }
    }

    pub fn fail(limit: impl Into<serde_json::Value>) -> Self {
        Self {
            status: CheckStatus::Fail,
            severity: Severity::Critical,
            exceeded_threshold: Some(limit.into()),
        }
    }

    pub fn warning(limit: impl Into<serde_json::Value>) -> Self {
        Self {
            status: CheckStatus::Warning,
            severity: Severity::Warning,
            exceeded_threshold: Some(limit.into()),
        }
    }
}

/// Critical is tested strictly before warning; both comparisons are strict `>`.
/// Delta limits compare the absolute value.
pub fn evaluate(value: f64, thresholds: &ThresholdSpec, kind: ThresholdKind) -> Evaluation {
    let (critical, warning) = match kind {
        ThresholdKind::Absolute => (thresholds.absolute_critical, thresholds.absolute_warning),
        ThresholdKind::Delta => (thresholds.delta_critical, thresholds.delta_warning),
    };
    let compare = match kind {
        ThresholdKind::Absolute => value,
        ThresholdKind::Delta => value.abs(),
    };

    if let Some(c) = critical
        && compare > c
    {
        return Evaluation::fail(c);
    }
    if let Some(w) = warning
        && compare > w
    {
        return Evaluation::warning(w);
    }
    Evaluation::pass()
}
