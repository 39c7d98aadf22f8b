// sentri-core/src/infrastructure/output/html.rs

use minijinja::{Environment, context};

use super::ReportWriter;
use crate::domain::config::OutputFormat;
use crate::domain::report::AggregatedResults;
use crate::infrastructure::error::InfrastructureError;

const TEMPLATE_NAME: &str = "report.html";

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Data Quality Report - {{ metadata.dq_check_name or "unnamed" }}</title>
<style>
body { font-family: -apple-system, Segoe UI, Helvetica, Arial, sans-serif; margin: 2rem; color: #222; }
.cards { display: flex; gap: 1rem; margin-bottom: 2rem; }
.card { padding: 1rem 1.5rem; border-radius: 6px; background: #f4f4f4; min-width: 7rem; }
.card .value { font-size: 1.8rem; font-weight: 600; }
.pass { color: #1b7f3b; } .warning { color: #b26a00; } .fail { color: #c62828; } .error { color: #6a1b9a; }
table { border-collapse: collapse; width: 100%; font-size: 0.9rem; }
th, td { border-bottom: 1px solid #ddd; padding: 0.4rem 0.6rem; text-align: left; vertical-align: top; }
th { background: #fafafa; }
</style>
</head>
<body>
<h1>{{ metadata.dq_check_name or "Data Quality Report" }}</h1>
<p>Generated {{ generated_at }} &middot; date column <code>{{ metadata.date_column }}</code> &middot; id column <code>{{ metadata.id_column }}</code></p>
<div class="cards">
  <div class="card"><div>Total</div><div class="value">{{ summary.total }}</div></div>
  <div class="card pass"><div>Passed</div><div class="value">{{ summary.passed }}</div></div>
  <div class="card warning"><div>Warnings</div><div class="value">{{ summary.warnings }}</div></div>
  <div class="card fail"><div>Failed</div><div class="value">{{ summary.failed }}</div></div>
  <div class="card error"><div>Errors</div><div class="value">{{ summary.errors }}</div></div>
  <div class="card"><div>Pass rate</div><div class="value">{{ summary.pass_rate }}%</div></div>
</div>
<table>
<thead>
<tr><th>Check</th><th>Column</th><th>Measure</th><th>Date</th><th>Metric</th><th>Status</th><th>Severity</th><th>Threshold</th><th>Details</th></tr>
</thead>
<tbody>
{% for r in results %}
<tr>
  <td>{{ r.check_type }}</td>
  <td>{{ r.column_alias or r.column or "-" }}</td>
  <td>{{ r.measure or "" }}</td>
  <td>{{ r.date }}</td>
  <td>{% if r.metric_value is not none %}{{ r.metric_value }}{% endif %}</td>
  <td class="{{ r.status|lower }}">{{ r.status }}</td>
  <td>{{ r.severity }}</td>
  <td>{% if r.exceeded_threshold is not none %}{{ r.exceeded_threshold }}{% endif %}</td>
  <td>{% if r.error %}{{ r.error.message }}{% elif r.description %}{{ r.description }}{% endif %}</td>
</tr>
{% endfor %}
</tbody>
</table>
</body>
</html>
"#;

pub struct HtmlWriter {
    env: Environment<'static>,
}

impl HtmlWriter {
    pub fn new() -> Self {
        let mut env = Environment::new();
        // A syntax error leaves the template unregistered; render() then fails.
        let _ = env.add_template(TEMPLATE_NAME, TEMPLATE);
        Self { env }
    }
}

impl Default for HtmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportWriter for HtmlWriter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Html
    }

    fn render(&self, results: &AggregatedResults) -> Result<Vec<u8>, InfrastructureError> {
        let tmpl = self.env.get_template(TEMPLATE_NAME)?;
        let html = tmpl.render(context! {
            metadata => &results.metadata,
            summary => &results.summary,
            results => &results.results,
            generated_at => chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        })?;
        Ok(html.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::output::fixtures::sample;
    use anyhow::Result;

    #[test]
    fn test_renders_cards_and_rows() -> Result<()> {
        let html = String::from_utf8(HtmlWriter::new().render(&sample())?)?;
        assert!(html.contains(r#"<td class="fail">FAIL</td>"#));
        assert!(html.contains(r#"<td class="pass">PASS</td>"#));
        assert!(html.contains("boom"));
        assert_eq!(html.matches("<tr>").count(), 4);
        Ok(())
    }

    #[test]
    fn test_escapes_user_text() -> Result<()> {
        let html = String::from_utf8(HtmlWriter::new().render(&sample())?)?;
        assert!(html.contains("Orders &lt;daily&gt;"));
        assert!(!html.contains("<daily>"));
        Ok(())
    }
}
