// sentri-core/src/application/exit.rs

use crate::domain::config::ExitCodeConfig;
use crate::domain::report::Summary;

/// Which outcomes turn a completed run into a non-zero exit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExitPolicy {
    pub on_failure: bool,
    pub on_warning: bool,
    pub on_error: bool,
}

impl ExitPolicy {
    /// Config switches OR'ed with the command-line flags.
    pub fn new(config: &ExitCodeConfig, exit_on_failure: bool, exit_on_warning: bool) -> Self {
        Self {
            on_failure: config.exit_on_critical || exit_on_failure,
            on_warning: config.exit_on_warning || exit_on_warning,
            on_error: config.exit_on_error,
        }
    }

    pub fn exit_code(&self, summary: &Summary) -> i32 {
        let trips = (self.on_failure && summary.failed > 0)
            || (self.on_warning && summary.warnings > 0)
            || (self.on_error && summary.errors > 0);
        i32::from(trips)
    }
}
