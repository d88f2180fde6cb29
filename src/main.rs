//! adev - development server with app restarts and browser live reload.

mod actor;
mod cli;
mod config;
mod embed;
mod logger;
mod reload;
mod utils;

use std::process::ExitCode;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::DevConfig;
use logger::Logger;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let logger = Logger::terminal("serve", cli.verbose());
    match run(cli, logger.clone()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(logger; "{:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli, logger: Logger) -> Result<()> {
    match cli.command {
        Commands::Runserver { args } => {
            let config = DevConfig::for_runserver(&args, &logger.child("config"))?;
            cli::serve::runserver(config, logger).await
        }
        Commands::Serve { args } => {
            let config = DevConfig::for_static(&args)?;
            cli::serve::serve_static(config, logger).await
        }
    }
}
