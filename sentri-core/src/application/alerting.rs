// sentri-core/src/application/alerting.rs

use tracing::{info, warn};

use crate::domain::checks::CheckStatus;
use crate::domain::config::{AlertPluginConfig, AlertingConfig};
use crate::domain::report::AggregatedResults;
use crate::infrastructure::alerting::{EmailAlertPlugin, FileAlertPlugin, LogAlertPlugin};
use crate::ports::alerting::AlertPlugin;

/// Explicit set of alert channels built from `output.alerting`.
#[derive(Default)]
pub struct AlertDispatcher {
    plugins: Vec<Box<dyn AlertPlugin>>,
}

impl AlertDispatcher {
    /// Unknown or misconfigured plugins are skipped with a warning.
    pub fn from_config(config: Option<&AlertingConfig>) -> Self {
        let Some(config) = config.filter(|c| c.enabled) else {
            return Self::default();
        };
        let plugins = config.plugins.iter().filter_map(build_plugin).collect();
        Self { plugins }
    }

    pub fn with_plugin(mut self, plugin: Box<dyn AlertPlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Notifies every plugin whose policy matches. Returns the names that delivered.
    /// A failing plugin is logged and never stops the others.
    pub async fn dispatch(&self, results: &AggregatedResults) -> Vec<String> {
        let failed = results.with_status(CheckStatus::Fail);
        let warnings = results.with_status(CheckStatus::Warning);

        let mut delivered = Vec::new();
        for plugin in &self.plugins {
            if !plugin.should_alert(&failed, &warnings) {
                continue;
            }
            match plugin.send_alert(results, &failed, &warnings).await {
                Ok(true) => {
                    info!(plugin = plugin.name(), "Alert sent");
                    delivered.push(plugin.name().to_string());
                }
                Ok(false) => warn!(plugin = plugin.name(), "Alert not delivered"),
                Err(e) => warn!(plugin = plugin.name(), error = %e, "Alert plugin failed"),
            }
        }
        delivered
    }
}

fn build_plugin(config: &AlertPluginConfig) -> Option<Box<dyn AlertPlugin>> {
    match config.kind.trim().to_lowercase().as_str() {
        "log" => Some(Box::new(LogAlertPlugin::new(config.config.clone()))),
        "file" => match FileAlertPlugin::new(config.config.clone()) {
            Ok(p) => Some(Box::new(p)),
            Err(e) => {
                warn!(plugin = "file", error = %e, "Skipping alert plugin");
                None
            }
        },
        "email" => match EmailAlertPlugin::new(config.config.clone()) {
            Ok(p) => Some(Box::new(p)),
            Err(e) => {
                warn!(plugin = "email", error = %e, "Skipping alert plugin");
                None
            }
        },
        other => {
            warn!(plugin = other, "Unknown alert plugin type, skipping");
            None
        }
    }
}
