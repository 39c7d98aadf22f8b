// sentri-core/src/infrastructure/alerting/email.rs

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use minijinja::{Environment, context};
use tracing::{info, warn};

use crate::domain::checks::ResultRecord;
use crate::domain::config::AlertPluginOptions;
use crate::domain::report::AggregatedResults;
use crate::error::SentriError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::alerting::AlertPlugin;

const TEMPLATE_NAME: &str = "alert.html";

const TEMPLATE: &str = r#"<html>
<body>
<h2>Data Quality Alert: {{ check_name }}</h2>
<h3>Summary</h3>
<ul>
  <li>Total Checks: {{ summary.total }}</li>
  <li>Passed: {{ summary.passed }}</li>
  <li>Warnings: {{ summary.warnings }}</li>
  <li>Failed: {{ summary.failed }}</li>
  <li>Pass Rate: {{ summary.pass_rate }}%</li>
</ul>
{% if failed %}
<h3 style="color: red;">Failed Checks</h3>
<ul>
{% for row in failed %}  <li>{{ row.check }}.{{ row.column }}: {{ row.metric }}</li>
{% endfor %}</ul>
{% endif %}
{% if warnings %}
<h3 style="color: orange;">Warning Checks</h3>
<ul>
{% for row in warnings %}  <li>{{ row.check }}.{{ row.column }}: {{ row.metric }}</li>
{% endfor %}</ul>
{% endif %}
<p>Please review the full report for details.</p>
</body>
</html>
"#;

/// Sends the alert as an HTML email over SMTP.
pub struct EmailAlertPlugin {
    options: AlertPluginOptions,
    from: Mailbox,
    to: Vec<Mailbox>,
    env: Environment<'static>,
}

impl EmailAlertPlugin {
    /// Parses the sender and recipient addresses up front. No connection is made.
    pub fn new(options: AlertPluginOptions) -> Result<Self, InfrastructureError> {
        let parse = |raw: &str| {
            raw.trim().parse::<Mailbox>().map_err(|e| {
                InfrastructureError::ConfigError(format!("invalid email address '{raw}': {e}"))
            })
        };
        let from = parse(options.from_address())?;
        let to = options
            .to_addresses
            .iter()
            .map(|a| parse(a))
            .collect::<Result<Vec<_>, _>>()?;

        let mut env = Environment::new();
        env.add_template(TEMPLATE_NAME, TEMPLATE)?;

        Ok(Self {
            options,
            from,
            to,
            env,
        })
    }

    pub fn subject(&self, results: &AggregatedResults, failed: &[ResultRecord]) -> String {
        let severity = if failed.is_empty() { "WARNING" } else { "CRITICAL" };
        let name = results.metadata.dq_check_name.as_deref().unwrap_or("DQ Check");
        format!("{} {severity}: {name}", self.options.subject_prefix())
    }

    pub fn render_body(
        &self,
        results: &AggregatedResults,
        failed: &[ResultRecord],
        warnings: &[ResultRecord],
    ) -> Result<String, InfrastructureError> {
        let rows = |records: &[ResultRecord]| {
            records
                .iter()
                .map(|r| {
                    let metric = r.metric_value.map_or_else(|| "N/A".to_string(), |v| v.to_string());
                    context! {
                        check => &r.check_type,
                        column => r.column.as_deref().unwrap_or("-"),
                        metric => metric,
                    }
                })
                .collect::<Vec<_>>()
        };
        let tmpl = self.env.get_template(TEMPLATE_NAME)?;
        Ok(tmpl.render(context! {
            check_name => results.metadata.dq_check_name.as_deref().unwrap_or("DQ Check"),
            summary => &results.summary,
            failed => rows(failed),
            warnings => rows(warnings),
        })?)
    }

    pub fn message(
        &self,
        results: &AggregatedResults,
        failed: &[ResultRecord],
        warnings: &[ResultRecord],
    ) -> Result<Message, InfrastructureError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(self.subject(results, failed))
            .header(ContentType::TEXT_HTML);
        for to in &self.to {
            builder = builder.to(to.clone());
        }
        builder
            .body(self.render_body(results, failed, warnings)?)
            .map_err(|e| InfrastructureError::Alerting(e.to_string()))
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, InfrastructureError> {
        let host = self.options.smtp_host();
        let builder = if self.options.use_tls() {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| InfrastructureError::Alerting(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };
        let mut builder = builder.port(self.options.smtp_port());
        if let (Some(user), Some(password)) = (&self.options.username, &self.options.password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }
        Ok(builder.build())
    }
}

#[async_trait]
impl AlertPlugin for EmailAlertPlugin {
    fn name(&self) -> &str {
        "email"
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
        if self.to.is_empty() {
            warn!("No email recipients configured");
            return Ok(false);
        }

        let message = self.message(results, failed, warnings)?;
        self.transport()?
            .send(message)
            .await
            .map_err(|e| InfrastructureError::Alerting(e.to_string()))?;
        info!(host = self.options.smtp_host(), recipients = self.to.len(), "Alert email sent");
        Ok(true)
    }
}
