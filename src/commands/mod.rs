mod remove;
mod serve;
mod utils;

use bg_remover::{AppConfig, BridgeResult};

use crate::cli::{Cli, Commands};

/// The main function to run the command based on CLI input.
pub async fn run(cli: Cli, config: AppConfig) -> BridgeResult<()> {
    let Cli { command, .. } = cli;
    dispatch(command, config).await
}

/// Dispatch the command to the appropriate handler.
async fn dispatch(command: Commands, config: AppConfig) -> BridgeResult<()> {
    match command {
        Commands::Remove(cmd) => remove::run(&config, cmd).await,
        Commands::Serve(cmd) => serve::run(config, cmd).await,
    }
}
