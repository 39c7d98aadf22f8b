// sentri/src/commands/validate.rs
//
// USE CASE: Check a configuration file without touching the data source.

use anyhow::Context;
use std::path::Path;

use sentri_core::infrastructure::config::load_config;

use crate::summary::print_check_plan;

pub fn execute(config_path: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path)
        .with_context(|| format!("Invalid configuration: {:?}", config_path))?;

    println!(
        "📋 {} ({} source, date column '{}')",
        config.metadata.dq_check_name, config.source.kind, config.metadata.date_column
    );
    print_check_plan(&config.check_entries());

    for warning in config.check_rules().warnings {
        println!("⚠️  {warning}");
    }
    println!("✅ Configuration is valid");
    Ok(())
}
