// sentri/src/main.rs

mod cli;
mod commands;
mod logging;
mod summary;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            let code = commands::run::execute(args).await?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        Commands::Validate { config } => {
            logging::init_logging(&logging::LogConfig {
                level: tracing::Level::ERROR,
                ..Default::default()
            })?;
            commands::validate::execute(&config)?;
        }
    }

    Ok(())
}
