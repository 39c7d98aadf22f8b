// sentri/src/commands/run.rs
//
// USE CASE: Run every configured check over a date range.

use anyhow::{Context, bail};
use std::sync::Arc;

use sentri_core::application::{AlertDispatcher, CheckManager, ExitPolicy, OutputManager};
use sentri_core::infrastructure::adapters::DuckDbConnector;
use sentri_core::infrastructure::config::load_config;
use sentri_core::ports::DataConnector;

use crate::cli::RunArgs;
use crate::logging::{LogConfig, init_logging};
use crate::summary::print_run_summary;

/// Returns the process exit code for a run that completed.
pub async fn execute(args: RunArgs) -> anyhow::Result<i32> {
    let start = std::time::Instant::now();

    if args.start_date > args.end_date {
        bail!(
            "Start date {} is after end date {}",
            args.start_date,
            args.end_date
        );
    }

    // A. Load the Config (Infra)
    println!("⚙️  Loading configuration...");
    let config = load_config(&args.config).with_context(|| {
        format!("Failed to load configuration from {:?}", args.config)
    })?;

    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    let format = args.log_format.map_or(config.logging.format, Into::into);
    init_logging(&LogConfig::new(level, format)?)?;

    println!(
        "   Check: {} ({} check types)",
        config.metadata.dq_check_name,
        config.checks.len()
    );

    // B. Fetch the data through the connector
    let connector = DuckDbConnector::new(&config.source, &config.metadata.date_column)
        .context("Failed to initialize the data source")?;
    println!("   Source: {} 🦆", connector.name());
    connector
        .validate_connection()
        .await
        .with_context(|| format!("Cannot reach source '{}'", connector.name()))?;
    let data = connector
        .fetch(args.start_date, args.end_date)
        .await
        .with_context(|| {
            format!(
                "Failed to fetch data for {} to {}",
                args.start_date, args.end_date
            )
        })?;
    println!(
        "📥 Loaded {} rows ({} to {})",
        data.num_rows(),
        args.start_date,
        args.end_date
    );

    // C. Run the checks
    let mut manager = CheckManager::from_config(Arc::new(data), &config);
    let parallel = args.parallel || config.execution.parallel_enabled;
    let results = if parallel {
        let workers = args
            .max_workers
            .map_or(config.execution.max_workers, usize::from);
        println!("🔍 Running checks on {workers} workers...");
        manager.run_all_checks_parallel(workers).await
    } else {
        println!("🔍 Running checks...");
        manager.run_all_checks()
    };
    print_run_summary(&results);

    // D. Reports
    let mut output = OutputManager::new(config.output.clone());
    if let Some(dir) = &args.output_dir {
        output = output.with_destination(dir);
    }
    let written = output.generate(&results, Some(&config.metadata.dq_check_name));
    for (format, path) in &written {
        println!("📝 {format} report: {}", path.display());
    }

    // E. Alerts
    let dispatcher = AlertDispatcher::from_config(config.output.alerting.as_ref());
    if !dispatcher.is_empty() {
        let sent = dispatcher.dispatch(&results).await;
        if !sent.is_empty() {
            println!("🔔 Alerts sent: {}", sent.join(", "));
        }
    }

    let code = ExitPolicy::new(
        &config.output.exit_code,
        args.exit_on_failure,
        args.exit_on_warning,
    )
    .exit_code(&results.summary);

    if code == 0 {
        println!("\n✨ SUCCESS! Checks finished in {:.2?}", start.elapsed());
    } else {
        eprintln!(
            "\n❌ FAILURE. {} failed, {} warnings, {} errors.",
            results.summary.failed, results.summary.warnings, results.summary.errors
        );
    }
    Ok(code)
}
