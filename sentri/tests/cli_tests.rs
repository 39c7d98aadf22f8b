use anyhow::{Context, Result};
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const ORDERS: &str = "\
order_id,order_date,amount,status
1,2024-01-01,10.5,open
2,2024-01-01,12.0,open
3,2024-01-02,11.0,closed
4,2024-01-02,,closed
5,2024-01-03,9.5,open
";

/// A scratch directory holding `orders.csv` and a `dq.yaml` next to it.
struct SentriTestEnv {
    _tmp: TempDir,
    root: PathBuf,
}

impl SentriTestEnv {
    fn new(checks: &str) -> Result<Self> {
        let tmp = tempfile::tempdir()?;
        let root = tmp.path().to_path_buf();
        std::fs::write(root.join("orders.csv"), ORDERS)?;
        let env = Self { _tmp: tmp, root };
        env.write_config(checks)?;
        Ok(env)
    }

    fn write_config(&self, checks: &str) -> Result<()> {
        let yaml = format!(
            r#"source:
  type: csv
  csv:
    file_path: orders.csv
  connection_retry:
    enabled: false
metadata:
  dq_check_name: Orders
  date_column: order_date
  id_column: order_id
checks:
{checks}
output:
  formats: [json, csv]
  destination: reports
"#
        );
        std::fs::write(self.root.join("dq.yaml"), yaml)?;
        Ok(())
    }

    fn sentri(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sentri"));
        cmd.current_dir(&self.root);
        cmd
    }

    fn run(&self) -> Command {
        let mut cmd = self.sentri();
        cmd.args([
            "run",
            "-c",
            "dq.yaml",
            "--start-date",
            "2024-01-01",
            "--end-date",
            "2024-01-31",
        ]);
        cmd
    }

    fn report(&self, dir: &Path, extension: &str) -> Result<PathBuf> {
        std::fs::read_dir(self.root.join(dir))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .find(|p| p.extension().and_then(|s| s.to_str()) == Some(extension))
            .with_context(|| format!("No .{extension} report in {}", dir.display()))
    }
}

const PASSING: &str = "  uniqueness:\n    order_id: {}\n  range:\n    amount: { min_value: 0, max_value: 100 }\n";

#[test]
fn test_run_writes_reports() -> Result<()> {
    let env = SentriTestEnv::new(PASSING)?;

    env.run()
        .assert()
        .success()
        .stdout(predicate::str::contains("SUCCESS"));

    let json_path = env.report(Path::new("reports"), "json")?;
    let name = json_path
        .file_name()
        .and_then(|n| n.to_str())
        .context("Report name is not UTF-8")?;
    assert!(name.starts_with("dq_report_orders_"), "{name}");

    let report: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&json_path)?)?;
    assert_eq!(report["metadata"]["dq_check_name"], "Orders");
    assert_eq!(report["summary"]["total"], 2);
    assert_eq!(report["summary"]["passed"], 2);
    assert_eq!(report["results_by_type"]["uniqueness"][0]["metric_value"], 0.0);

    let csv = std::fs::read_to_string(env.report(Path::new("reports"), "csv")?)?;
    assert_eq!(csv.lines().count(), 3);
    Ok(())
}

#[test]
fn test_run_fails_on_critical_result() -> Result<()> {
    let env = SentriTestEnv::new(
        "  completeness:\n    amount: { thresholds: { absolute_critical: 0.1 } }\n",
    )?;

    env.run()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("1 failed"));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(env.report(Path::new("reports"), "json")?)?)?;
    let record = &report["results"][0];
    assert_eq!(record["status"], "FAIL");
    assert_eq!(record["metric_value"], 0.2);
    Ok(())
}

#[test]
fn test_warnings_only_trip_when_requested() -> Result<()> {
    let env = SentriTestEnv::new(
        "  completeness:\n    amount: { thresholds: { absolute_critical: 0.5, absolute_warning: 0.1 } }\n",
    )?;

    env.run().assert().success();
    env.run().arg("--exit-on-warning").assert().code(1);
    Ok(())
}

#[test]
fn test_parallel_run_and_output_override() -> Result<()> {
    let env = SentriTestEnv::new(PASSING)?;

    env.run()
        .args(["--parallel", "--max-workers", "2", "-o", "elsewhere"])
        .assert()
        .success();

    assert!(env.report(Path::new("elsewhere"), "json").is_ok());
    assert!(!env.root.join("reports").exists());
    Ok(())
}

#[test]
fn test_run_rejects_inverted_dates() -> Result<()> {
    let env = SentriTestEnv::new(PASSING)?;

    env.sentri()
        .args([
            "run",
            "-c",
            "dq.yaml",
            "--start-date",
            "2024-02-01",
            "--end-date",
            "2024-01-01",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("after end date"));
    Ok(())
}

#[test]
fn test_run_missing_source_file() -> Result<()> {
    let env = SentriTestEnv::new(PASSING)?;
    std::fs::remove_file(env.root.join("orders.csv"))?;

    env.run()
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
    Ok(())
}

#[test]
fn test_validate_command() -> Result<()> {
    let env = SentriTestEnv::new(PASSING)?;

    env.sentri()
        .args(["validate", "-c", "dq.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("order_id"));
    Ok(())
}

#[test]
fn test_validate_reports_field_errors() -> Result<()> {
    let env = SentriTestEnv::new(PASSING)?;
    let broken = std::fs::read_to_string(env.root.join("dq.yaml"))?
        .replace("dq_check_name: Orders", "dq_check_name: \"\"");
    std::fs::write(env.root.join("dq.yaml"), broken)?;

    env.sentri()
        .args(["validate", "-c", "dq.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Check name cannot be empty"));
    Ok(())
}

#[test]
fn test_missing_config_file() -> Result<()> {
    let env = SentriTestEnv::new(PASSING)?;

    env.sentri()
        .args(["validate", "-c", "nope.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
    Ok(())
}
