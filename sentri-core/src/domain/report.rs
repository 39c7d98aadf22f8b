// sentri-core/src/domain/report.rs

// Aggregated view of one run. Derived entirely from the accumulated records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::checks::result::round_to;
use crate::domain::checks::{CheckStatus, ResultRecord};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub dq_check_name: Option<String>,
    pub date_column: String,
    pub id_column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub warnings: usize,
    pub failed: usize,
    pub errors: usize,
    /// Percentage of PASS records, one decimal. `0.0` when there are none.
    pub pass_rate: f64,
}

impl Summary {
    pub fn from_records(records: &[ResultRecord]) -> Self {
        let count = |s: CheckStatus| records.iter().filter(|r| r.status == s).count();
        let total = records.len();
        let passed = count(CheckStatus::Pass);
        let pass_rate = if total == 0 {
            0.0
        } else {
            round_to(passed as f64 / total as f64 * 100.0, 1)
        };
        Self {
            total,
            passed,
            warnings: count(CheckStatus::Warning),
            failed: count(CheckStatus::Fail),
            errors: count(CheckStatus::Error),
            pass_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResults {
    pub metadata: RunMetadata,
    pub summary: Summary,
    pub results: Vec<ResultRecord>,
    pub results_by_type: BTreeMap<String, Vec<ResultRecord>>,
}

impl AggregatedResults {
    pub fn from_records(metadata: RunMetadata, records: Vec<ResultRecord>) -> Self {
        let mut results_by_type: BTreeMap<String, Vec<ResultRecord>> = BTreeMap::new();
        for record in &records {
            results_by_type
                .entry(record.check_type.clone())
                .or_default()
                .push(record.clone());
        }
        Self {
            metadata,
            summary: Summary::from_records(&records),
            results: records,
            results_by_type,
        }
    }

    pub fn with_status(&self, status: CheckStatus) -> Vec<ResultRecord> {
        self.results
            .iter()
            .filter(|r| r.status == status)
            .cloned()
            .collect()
    }

    /// Copy without PASS records. The summary keeps the full counts.
    pub fn without_passed(&self) -> Self {
        let keep = |r: &&ResultRecord| r.status != CheckStatus::Pass;
        Self {
            metadata: self.metadata.clone(),
            summary: self.summary,
            results: self.results.iter().filter(keep).cloned().collect(),
            results_by_type: self
                .results_by_type
                .iter()
                .map(|(k, v)| (k.clone(), v.iter().filter(keep).cloned().collect::<Vec<_>>()))
                .filter(|(_, v)| !v.is_empty())
                .collect(),
        }
    }
}
