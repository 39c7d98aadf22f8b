// sentri-core/src/application/manager.rs

// Runs every configured check type against one dataset and aggregates the records.
// A check type that cannot be built, or that panics, contributes exactly one
// ERROR record with no column; unknown check types contribute nothing.

use futures::StreamExt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::domain::checks::{
    CheckKind, CheckStatus, ResultRecord, latest_or_today, panic_message,
};
use crate::domain::config::DqConfig;
use crate::domain::dataset::Dataset;
use crate::domain::error::DomainError;
use crate::domain::report::{AggregatedResults, RunMetadata, Summary};

/// Runs one check type: data, date column, id column, check type, config.
type Runner = fn(&Dataset, &str, &str, &str, &serde_yaml::Value) -> Result<Vec<ResultRecord>, DomainError>;

pub struct CheckManager {
    data: Arc<Dataset>,
    metadata: RunMetadata,
    checks: Vec<(String, serde_yaml::Value)>,
    results: Vec<ResultRecord>,
    runner: Runner,
}

impl CheckManager {
    pub fn new(
        data: impl Into<Arc<Dataset>>,
        metadata: RunMetadata,
        checks: Vec<(String, serde_yaml::Value)>,
    ) -> Self {
        Self {
            data: data.into(),
            metadata,
            checks,
            results: Vec::new(),
            runner: run_single,
        }
    }

    #[cfg(test)]
    fn with_runner(mut self, runner: Runner) -> Self {
        self.runner = runner;
        self
    }

    pub fn from_config(data: impl Into<Arc<Dataset>>, config: &DqConfig) -> Self {
        let metadata = RunMetadata {
            dq_check_name: Some(config.metadata.dq_check_name.clone()),
            date_column: config.metadata.date_column.clone(),
            id_column: config.metadata.id_column.clone(),
            description: config.metadata.description.clone(),
        };
        Self::new(data, metadata, config.check_entries())
    }

    // --- EXECUTION ---

    /// Runs the configured check types one after another.
    #[instrument(skip(self), fields(check_types = self.checks.len()))]
    pub fn run_all_checks(&mut self) -> AggregatedResults {
        info!("Starting check execution");
        for (check_type, config) in &self.checks {
            let mut produced = isolated(
                self.runner,
                &self.data,
                &self.metadata.date_column,
                &self.metadata.id_column,
                check_type,
                config,
            );
            self.results.append(&mut produced);
        }
        self.finish()
    }

    /// Runs every check type on the blocking pool, at most `max_workers` at a time.
    /// Records are appended here, on the calling task, as each check completes.
    #[instrument(skip(self), fields(check_types = self.checks.len()))]
    pub async fn run_all_checks_parallel(&mut self, max_workers: usize) -> AggregatedResults {
        info!(max_workers, "Starting parallel check execution");

        let shared = Arc::clone(&self.data);
        let date_column = self.metadata.date_column.clone();
        let id_column = self.metadata.id_column.clone();
        let runner = self.runner;

        let jobs = self.checks.clone().into_iter().map(|(check_type, config)| {
            let data = Arc::clone(&shared);
            let date_col = date_column.clone();
            let id_col = id_column.clone();
            async move {
                let name = check_type.clone();
                let handle = tokio::task::spawn_blocking(move || {
                    isolated(runner, &data, &date_col, &id_col, &check_type, &config)
                });
                (name, handle.await)
            }
        });

        let mut completed = futures::stream::iter(jobs).buffer_unordered(max_workers.max(1));
        while let Some((check_type, outcome)) = completed.next().await {
            match outcome {
                Ok(mut produced) => self.results.append(&mut produced),
                Err(join_err) => {
                    error!(check = %check_type, error = %join_err, "Check worker failed");
                    self.results.push(ResultRecord::check_failure(
                        &check_type,
                        failure_date(&self.data, &self.metadata.date_column),
                        &join_err.to_string(),
                        "WorkerFailure",
                    ));
                }
            }
        }

        self.finish()
    }

    /// Runs one check type without touching the accumulated results.
    /// Unknown types yield no records.
    pub fn run_single_check(
        &self,
        check_type: &str,
        config: &serde_yaml::Value,
    ) -> Result<Vec<ResultRecord>, DomainError> {
        (self.runner)(
            &self.data,
            &self.metadata.date_column,
            &self.metadata.id_column,
            check_type,
            config,
        )
    }

    fn finish(&self) -> AggregatedResults {
        let agg = self.aggregate_results();
        info!(
            total = agg.summary.total,
            passed = agg.summary.passed,
            warnings = agg.summary.warnings,
            failed = agg.summary.failed,
            errors = agg.summary.errors,
            "Check execution finished"
        );
        agg
    }

    // --- AGGREGATION ---

    pub fn aggregate_results(&self) -> AggregatedResults {
        AggregatedResults::from_records(self.metadata.clone(), self.results.clone())
    }

    pub fn get_summary_statistics(&self) -> Summary {
        Summary::from_records(&self.results)
    }

    pub fn get_failed_checks(&self) -> Vec<&ResultRecord> {
        self.with_status(CheckStatus::Fail)
    }

    pub fn get_warning_checks(&self) -> Vec<&ResultRecord> {
        self.with_status(CheckStatus::Warning)
    }

    pub fn results(&self) -> &[ResultRecord] {
        &self.results
    }

    fn with_status(&self, status: CheckStatus) -> Vec<&ResultRecord> {
        self.results.iter().filter(|r| r.status == status).collect()
    }
}

fn run_single(
    data: &Dataset,
    date_col: &str,
    id_col: &str,
    check_type: &str,
    config: &serde_yaml::Value,
) -> Result<Vec<ResultRecord>, DomainError> {
    let Some(kind) = CheckKind::from_name(check_type) else {
        warn!(check = %check_type, "Unknown check type, skipping");
        return Ok(Vec::new());
    };
    info!(check = %kind, "Running check");
    let records = kind.build(data, date_col, id_col, config)?.run();
    info!(check = %kind, records = records.len(), "Completed check");
    Ok(records)
}

/// `runner` with build errors and panics turned into one ERROR record.
fn isolated(
    runner: Runner,
    data: &Dataset,
    date_col: &str,
    id_col: &str,
    check_type: &str,
    config: &serde_yaml::Value,
) -> Vec<ResultRecord> {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        runner(data, date_col, id_col, check_type, config)
    }));
    let (message, error_type) = match outcome {
        Ok(Ok(records)) => return records,
        Ok(Err(err)) => (err.to_string(), "ConfigurationError"),
        Err(payload) => (panic_message(&*payload), "Panic"),
    };
    error!(check = %check_type, error = %message, "Check failed");
    vec![ResultRecord::check_failure(
        check_type,
        failure_date(data, date_col),
        &message,
        error_type,
    )]
}

fn failure_date(data: &Dataset, date_col: &str) -> chrono::NaiveDate {
    let column = data
        .column_names()
        .iter()
        .find(|c| c.eq_ignore_ascii_case(date_col))
        .cloned()
        .unwrap_or_else(|| date_col.to_string());
    latest_or_today(&data.distinct_dates(&column))
}
