// sentri-core/src/ports/alerting.rs

use async_trait::async_trait;

use crate::domain::checks::ResultRecord;
use crate::domain::report::AggregatedResults;
use crate::error::SentriError;

/// A channel notified when a run produced failures or warnings.
#[async_trait]
pub trait AlertPlugin: Send + Sync {
    fn name(&self) -> &str;

    fn alert_on_failure(&self) -> bool {
        true
    }

    fn alert_on_warning(&self) -> bool {
        false
    }

    /// Returns `Ok(true)` once the alert has been delivered.
    async fn send_alert(
        &self,
        results: &AggregatedResults,
        failed: &[ResultRecord],
        warnings: &[ResultRecord],
    ) -> Result<bool, SentriError>;

    fn should_alert(&self, failed: &[ResultRecord], warnings: &[ResultRecord]) -> bool {
        (self.alert_on_failure() && !failed.is_empty())
            || (self.alert_on_warning() && !warnings.is_empty())
    }
}
