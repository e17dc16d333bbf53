use bg_remover::{BridgeError, ToolFailure};

pub fn report_error(err: &BridgeError) {
    match err {
        BridgeError::ExternalTool(ToolFailure::Spawn { program, source }) => {
            eprintln!(
                "Could not start the background removal tool `{}`: {source}",
                program.display()
            );
            eprintln!();
            eprintln!("Please specify the tool:");
            eprintln!("  - Use --program <path> (and --tool-arg for a script path)");
            eprintln!("  - Or set environment variable BG_REMOVER_PROGRAM");
        }
        BridgeError::ExternalTool(ToolFailure::Timeout { .. }) => {
            eprintln!("{err}");
            eprintln!("Raise the limit with --timeout <secs>, or 0 to wait indefinitely.");
        }
        _ => {
            eprintln!("Error: {err}");
        }
    }
}
