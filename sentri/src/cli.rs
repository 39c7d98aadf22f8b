// sentri/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use sentri_core::domain::config::LogFormat;

#[derive(Parser)]
#[command(name = "sentri")]
#[command(about = "Declarative data-quality checks for tabular datasets", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🚀 Runs the configured checks over a date range
    Run(RunArgs),

    /// ✅ Validates a configuration file without reading any data
    Validate {
        /// Path to the YAML configuration
        #[arg(long, short)]
        config: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the YAML configuration
    #[arg(long, short)]
    pub config: PathBuf,

    /// First day of data to check (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: NaiveDate,

    /// Last day of data to check, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: NaiveDate,

    /// Overrides `output.destination`
    #[arg(long, short)]
    pub output_dir: Option<PathBuf>,

    /// Overrides `logging.level` (error, warn, info, debug, trace)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Overrides `logging.format`
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormatArg>,

    /// Exit with code 1 when any check fails
    #[arg(long)]
    pub exit_on_failure: bool,

    /// Exit with code 1 when any check raises a warning
    #[arg(long)]
    pub exit_on_warning: bool,

    /// Run check types concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Worker pool size for --parallel (1-16)
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..=16))]
    pub max_workers: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}
