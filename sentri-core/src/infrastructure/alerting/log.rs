// sentri-core/src/infrastructure/alerting/log.rs

use async_trait::async_trait;
use tracing::{error, warn};

use super::label;
use crate::domain::checks::ResultRecord;
use crate::domain::config::AlertPluginOptions;
use crate::domain::report::AggregatedResults;
use crate::error::SentriError;
use crate::ports::alerting::AlertPlugin;

/// Emits the alert as tracing events.
pub struct LogAlertPlugin {
    options: AlertPluginOptions,
}

impl LogAlertPlugin {
    pub fn new(options: AlertPluginOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl AlertPlugin for LogAlertPlugin {
    fn name(&self) -> &str {
        "log"
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
        let name = results.metadata.dq_check_name.as_deref().unwrap_or("unnamed");
        error!(
            check_name = name,
            failed = failed.len(),
            warnings = warnings.len(),
            pass_rate = results.summary.pass_rate,
            "Data quality alert"
        );
        for record in failed {
            error!(check = %label(record), metric = ?record.metric_value, threshold = ?record.exceeded_threshold, "FAIL");
        }
        for record in warnings {
            warn!(check = %label(record), metric = ?record.metric_value, threshold = ?record.exceeded_threshold, "WARNING");
        }
        Ok(true)
    }
}
