// sentri-core/src/application/output.rs

use chrono::{DateTime, Local};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::domain::config::{OutputConfig, OutputFormat};
use crate::domain::report::AggregatedResults;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::write_into;
use crate::infrastructure::output::writer_for;

/// Writes one report file per configured format.
pub struct OutputManager {
    config: OutputConfig,
    destination: PathBuf,
}

impl OutputManager {
    pub fn new(config: OutputConfig) -> Self {
        let destination = PathBuf::from(&config.destination);
        Self {
            config,
            destination,
        }
    }

    /// Overrides `output.destination`.
    pub fn with_destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination = destination.into();
        self
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// `prefix[_check_name][_YYYYMMDD_HHMMSS].ext`
    pub fn file_name(&self, format: OutputFormat, check_name: Option<&str>, at: DateTime<Local>) -> String {
        let mut name = self.config.file_prefix.clone();
        if self.config.include_check_name
            && let Some(check) = check_name.map(str::trim).filter(|c| !c.is_empty())
        {
            name.push('_');
            name.push_str(&check.to_lowercase().replace(' ', "_"));
        }
        if self.config.include_timestamp {
            name.push('_');
            name.push_str(&at.format("%Y%m%d_%H%M%S").to_string());
        }
        format!("{name}.{}", format.extension())
    }

    /// Returns the written path per format. A format that fails is logged and left out.
    pub fn generate(
        &self,
        results: &AggregatedResults,
        check_name: Option<&str>,
    ) -> BTreeMap<OutputFormat, PathBuf> {
        let payload = if self.config.include_passed_checks {
            Cow::Borrowed(results)
        } else {
            Cow::Owned(results.without_passed())
        };
        let now = Local::now();

        let mut written = BTreeMap::new();
        for &format in &self.config.formats {
            if written.contains_key(&format) {
                continue;
            }
            match self.write_one(format, &payload, check_name, now) {
                Ok(path) => {
                    info!(format = %format, path = ?path, "Report written");
                    written.insert(format, path);
                }
                Err(e) => error!(format = %format, error = %e, "Failed to write report"),
            }
        }
        written
    }

    fn write_one(
        &self,
        format: OutputFormat,
        results: &AggregatedResults,
        check_name: Option<&str>,
        at: DateTime<Local>,
    ) -> Result<PathBuf, InfrastructureError> {
        let bytes = writer_for(format, self.config.pretty_print).render(results)?;
        write_into(&self.destination, &self.file_name(format, check_name, at), &bytes)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::infrastructure::output::fixtures::sample;
    use anyhow::Result;
    use chrono::TimeZone;

    fn config(yaml: &str) -> OutputConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_file_name_parts() {
        let at = Local.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
        let full = OutputManager::new(config("destination: out"));
        assert_eq!(
            full.file_name(OutputFormat::Json, Some("Daily Sales"), at),
            "dq_report_daily_sales_20240305_070809.json"
        );

        let bare = OutputManager::new(config(
            "destination: out\nfile_prefix: dq\ninclude_timestamp: false\ninclude_check_name: false",
        ));
        assert_eq!(bare.file_name(OutputFormat::Csv, Some("Daily Sales"), at), "dq.csv");
        assert_eq!(full.file_name(OutputFormat::Html, None, at), "dq_report_20240305_070809.html");
    }

    #[test]
    fn test_generate_all_formats() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("reports");
        let manager = OutputManager::new(config("destination: unused\nformats: [json, csv, html, json]\ninclude_timestamp: false"))
            .with_destination(&out);

        let written = manager.generate(&sample(), Some("Orders"));
        assert_eq!(written.len(), 3);
        assert_eq!(written[&OutputFormat::Json], out.join("dq_report_orders.json"));
        for path in written.values() {
            assert!(path.exists());
        }
        Ok(())
    }

    #[test]
    fn test_passed_records_can_be_dropped() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let manager = OutputManager::new(config(
            "destination: x\ninclude_passed_checks: false\ninclude_timestamp: false",
        ))
        .with_destination(dir.path());

        let written = manager.generate(&sample(), None);
        let v: serde_json::Value = serde_json::from_slice(&std::fs::read(&written[&OutputFormat::Json])?)?;
        assert_eq!(v["results"].as_array().unwrap().len(), 2);
        assert_eq!(v["summary"]["total"], 3);
        Ok(())
    }
}
