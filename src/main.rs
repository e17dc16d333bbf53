mod cli;
mod commands;
mod report;

use std::process::ExitCode;

use bg_remover::config_loader::load_config;
use bg_remover::{BridgeResult, logging};
use clap::Parser;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report::report_error(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> BridgeResult<()> {
    let mut config = load_config(cli.global.config.as_deref())?;
    cli.global.apply(&mut config);
    logging::init(&config.logging)?;
    commands::run(cli, config).await
}
