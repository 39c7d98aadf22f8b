// Behavioural properties of the check engine, exercised through CheckManager.

use anyhow::{Context, Result};
use chrono::NaiveDate;

use sentri_core::application::CheckManager;
use sentri_core::domain::checks::{CheckStatus, ThresholdKind, ThresholdSpec, evaluate};
use sentri_core::domain::dataset::{Dataset, Value};
use sentri_core::domain::report::{AggregatedResults, RunMetadata};

fn date(d: u32) -> Result<Value> {
    Ok(Value::Date(NaiveDate::from_ymd_opt(2024, 1, d).context("bad day")?))
}

/// `(id, day, value)` triples into a three-column dataset named after `column`.
fn frame(column: &str, rows: &[(i64, u32, Value)]) -> Result<Dataset> {
    let rows = rows
        .iter()
        .map(|(id, d, v)| Ok(vec![Value::Int(*id), date(*d)?, v.clone()]))
        .collect::<Result<Vec<_>>>()?;
    Ok(Dataset::from_rows(
        vec!["id".into(), "date".into(), column.into()],
        rows,
    )?)
}

fn run(data: Dataset, yaml: &str) -> Result<AggregatedResults> {
    let mapping: serde_yaml::Mapping = serde_yaml::from_str(yaml)?;
    let checks = mapping
        .into_iter()
        .filter_map(|(k, v)| k.as_str().map(|k| (k.to_string(), v)))
        .collect();
    let metadata = RunMetadata {
        dq_check_name: Some("properties".into()),
        date_column: "date".into(),
        id_column: "id".into(),
        description: None,
    };
    Ok(CheckManager::new(data, metadata, checks).run_all_checks())
}

#[test]
fn test_threshold_ordering() {
    let t = ThresholdSpec {
        absolute_critical: Some(0.3),
        absolute_warning: Some(0.1),
        delta_critical: Some(0.3),
        delta_warning: Some(0.1),
    };
    for (value, absolute, delta) in [
        (0.5, CheckStatus::Fail, CheckStatus::Fail),
        (0.2, CheckStatus::Warning, CheckStatus::Warning),
        (-0.2, CheckStatus::Pass, CheckStatus::Warning),
        (-0.5, CheckStatus::Pass, CheckStatus::Fail),
        (0.1, CheckStatus::Pass, CheckStatus::Pass),
    ] {
        assert_eq!(evaluate(value, &t, ThresholdKind::Absolute).status, absolute, "{value}");
        assert_eq!(evaluate(value, &t, ThresholdKind::Delta).status, delta, "{value}");
    }
}

#[test]
fn test_missing_column_is_isolated() -> Result<()> {
    let data = frame(
        "amount",
        &[(1, 1, Value::Float(1.0)), (2, 1, Value::Null), (3, 1, Value::Float(3.0))],
    )?;
    let results = run(
        data,
        "completeness:\n  amount: { thresholds: { absolute_critical: 0.5, absolute_warning: 0.2 } }\n  ghost: {}\n",
    )?;

    let records = &results.results_by_type["completeness"];
    assert_eq!(records.len(), 2);
    let ghost = records
        .iter()
        .find(|r| r.column.as_deref() == Some("ghost"))
        .context("no ghost record")?;
    assert_eq!(ghost.status, CheckStatus::Error);
    let amount = records
        .iter()
        .find(|r| r.column.as_deref() == Some("amount"))
        .context("no amount record")?;
    assert_eq!(amount.status, CheckStatus::Warning);
    assert_eq!(results.summary.errors, 1);
    Ok(())
}

#[test]
fn test_empty_run_summary() -> Result<()> {
    let results = run(frame("amount", &[])?, "{}")?;
    assert_eq!(results.summary.total, 0);
    assert_eq!(results.summary.pass_rate, 0.0);
    assert!(results.results_by_type.is_empty());
    Ok(())
}

#[test]
fn test_uniqueness_counts_extra_occurrences() -> Result<()> {
    let ids = [1, 2, 3, 3, 3, 4];
    let rows: Vec<_> = ids
        .iter()
        .enumerate()
        .map(|(i, v)| (i as i64, 1, Value::Int(*v)))
        .collect();

    for (critical, expected) in [(0, CheckStatus::Fail), (5, CheckStatus::Pass)] {
        let yaml = format!("uniqueness:\n  account: {{ thresholds: {{ absolute_critical: {critical} }} }}\n");
        let results = run(frame("account", &rows)?, &yaml)?;
        let record = &results.results[0];
        assert_eq!(record.metric_value, Some(2.0));
        assert_eq!(record.status, expected);
    }
    Ok(())
}

#[test]
fn test_range_bounds() -> Result<()> {
    let rows: Vec<_> = [-2.0, 5.0, 7.0, 12.0]
        .iter()
        .enumerate()
        .map(|(i, v)| (i as i64, 1, Value::Float(*v)))
        .collect();

    let both = run(
        frame("score", &rows)?,
        "range:\n  score: { min_value: 0, max_value: 10 }\n",
    )?;
    assert_eq!(both.results[0].additional_metrics["out_of_range_count"], 2);
    assert_eq!(both.results[0].metric_value, Some(0.5));
    assert_eq!(both.results[0].status, CheckStatus::Fail);

    let upper = run(frame("score", &rows)?, "range:\n  score: { max_value: 10 }\n")?;
    assert_eq!(upper.results[0].additional_metrics["out_of_range_count"], 1);
    Ok(())
}

#[test]
fn test_turnover_between_snapshots() -> Result<()> {
    let mut rows = Vec::new();
    for (i, acc) in [1i64, 2, 3, 4, 5].into_iter().enumerate() {
        rows.push((i as i64, 1, Value::Int(acc)));
    }
    for (i, acc) in [1i64, 2, 3, 6, 7].into_iter().enumerate() {
        rows.push((i as i64 + 10, 2, Value::Int(acc)));
    }
    let results = run(frame("account", &rows)?, "turnover:\n  account: {}\n")?;
    let record = &results.results[0];
    assert_eq!(record.metric_value, Some(0.571_429));
    assert_eq!(record.additional_metrics["added_count"], 2);
    assert_eq!(record.additional_metrics["dropped_count"], 2);
    Ok(())
}

#[test]
fn test_constant_series_has_no_drift() -> Result<()> {
    let mut rows = Vec::new();
    for day in [1, 2] {
        for i in 0..10 {
            rows.push((i, day, Value::Float(7.5)));
        }
    }
    let results = run(frame("ratio", &rows)?, "drift:\n  ratio: {}\n")?;
    assert_eq!(results.results[0].metric_value, Some(0.0));
    assert_eq!(results.results[0].status, CheckStatus::Pass);
    Ok(())
}

#[test]
fn test_strong_negative_correlation_passes() -> Result<()> {
    let xs = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let ys = [10.0, 9.5, 7.0, 7.2, 4.0, 3.9];
    let rows = xs
        .iter()
        .zip(ys)
        .enumerate()
        .map(|(i, (x, y))| Ok(vec![Value::Int(i as i64), date(1)?, Value::Float(*x), Value::Float(y)]))
        .collect::<Result<Vec<_>>>()?;
    let data = Dataset::from_rows(
        vec!["id".into(), "date".into(), "price".into(), "demand".into()],
        rows,
    )?;

    let results = run(
        data,
        "correlation:\n  price: { correlation_type: cross_column, correlation_with: demand, thresholds: { absolute_critical: 0.8 } }\n",
    )?;
    let record = &results.results[0];
    assert_eq!(record.status, CheckStatus::Pass);
    assert!(record.metric_value.unwrap_or_default() < -0.9);
    Ok(())
}
