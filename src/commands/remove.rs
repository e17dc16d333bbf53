use bg_remover::{
    AppConfig, BackgroundRemover, BridgeResult, ProcessingOptions, vector_output_path,
};

use crate::cli::RemoveCommand;

use super::utils::derive_variant_path;

/// The main function to run the remove command.
pub async fn run(config: &AppConfig, cmd: RemoveCommand) -> BridgeResult<()> {
    let remover = BackgroundRemover::new(config.tool.clone());
    let options = ProcessingOptions::from(&cmd.processing);
    let output_path = cmd
        .output
        .clone()
        .unwrap_or_else(|| derive_variant_path(&cmd.input, "nobg", "png"));

    let result = remover.remove(&cmd.input, &output_path, &options).await?;
    println!("{}: {}", result.message, result.output_path.display());

    if options.vector {
        println!(
            "SVG expected at {}",
            vector_output_path(&result.output_path).display()
        );
    }

    Ok(())
}
