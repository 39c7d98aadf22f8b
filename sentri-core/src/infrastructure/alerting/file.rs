// sentri-core/src/infrastructure/alerting/file.rs

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

use super::AlertPayload;
use crate::domain::checks::ResultRecord;
use crate::domain::config::AlertPluginOptions;
use crate::domain::report::AggregatedResults;
use crate::error::SentriError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::atomic_write;
use crate::ports::alerting::AlertPlugin;

/// Writes the alert payload as JSON to a fixed path (overwritten on every alert).
pub struct FileAlertPlugin {
    path: PathBuf,
    options: AlertPluginOptions,
}

impl FileAlertPlugin {
    pub fn new(options: AlertPluginOptions) -> Result<Self, InfrastructureError> {
        let path = options
            .path
            .clone()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| InfrastructureError::ConfigError("file alert plugin requires 'path'".into()))?;
        Ok(Self {
            path: PathBuf::from(path),
            options,
        })
    }
}

#[async_trait]
impl AlertPlugin for FileAlertPlugin {
    fn name(&self) -> &str {
        "file"
    }

    fn alert_on_failure(&self) -> bool {
        self.options.alert_on_failure()
    }

    fn alert_on_warning(&self) -> bool {
        self.options.alert_on_warning()
    }

    async fn send_alert(
        &self,
        results: &AggregatedResults,
        failed: &[ResultRecord],
        warnings: &[ResultRecord],
    ) -> Result<bool, SentriError> {
        let payload = AlertPayload::new(results, failed, warnings);
        let body = serde_json::to_vec_pretty(&payload).map_err(InfrastructureError::from)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        atomic_write(&self.path, body)?;
        info!(path = ?self.path, "Alert written");
        Ok(true)
    }
}
