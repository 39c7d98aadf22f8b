// sentri-core/src/domain/checks/config.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-column options shared by every check type.
///
/// `T` is the threshold shape: a flat [`ThresholdSpec`] for most checks, a
/// per-measure map for the statistical check. Unknown keys are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnCheckConfig<T = ThresholdSpec> {
    #[serde(default)]
    pub thresholds: T,

    #[serde(default)]
    pub filter_condition: Option<String>,

    #[serde(default)]
    pub column_alias: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    // Range
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,

    // Correlation
    #[serde(default)]
    pub correlation_type: CorrelationType,
    #[serde(default)]
    pub correlation_with: Option<String>,

    // Statistical
    #[serde(default)]
    pub measures: Option<Vec<String>>,
}

impl<T: Default> Default for ColumnCheckConfig<T> {
    fn default() -> Self {
        Self {
            thresholds: T::default(),
            filter_condition: None,
            column_alias: None,
            description: None,
            enabled: true,
            min_value: None,
            max_value: None,
            correlation_type: CorrelationType::default(),
            correlation_with: None,
            measures: None,
        }
    }
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationType {
    #[default]
    Temporal,
    CrossColumn,
}

impl CorrelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Temporal => "temporal",
            Self::CrossColumn => "cross_column",
        }
    }
}

/// Critical/warning limits. A missing key means "no limit at that level".
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ThresholdSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute_critical: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute_warning: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_critical: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_warning: Option<f64>,
}

impl ThresholdSpec {
    pub fn is_empty(&self) -> bool {
        self.absolute_critical.is_none()
            && self.absolute_warning.is_none()
            && self.delta_critical.is_none()
            && self.delta_warning.is_none()
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        [
            ("absolute_critical", self.absolute_critical),
            ("absolute_warning", self.absolute_warning),
            ("delta_critical", self.delta_critical),
            ("delta_warning", self.delta_warning),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
    }
}

/// Thresholds of the statistical check, keyed by measure name.
pub type MeasureThresholds = BTreeMap<String, MeasureThreshold>;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct MeasureThreshold {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute_critical: Option<ThresholdBound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute_warning: Option<ThresholdBound>,
}

/// A scalar upper bound, or an inclusive `[min, max]` range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ThresholdBound {
    Scalar(f64),
    Range([f64; 2]),
}

impl ThresholdBound {
    /// True when `value` lies outside the bound.
    pub fn is_violated_by(&self, value: f64) -> bool {
        match self {
            Self::Scalar(max) => value > *max,
            Self::Range([min, max]) => value < *min || value > *max,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Scalar(v) => serde_json::json!(v),
            Self::Range(r) => serde_json::json!(r),
        }
    }
}
