use std::path::PathBuf;

use bg_remover::config::DEFAULT_MODEL;
use bg_remover::{AppConfig, ProcessingOptions};
use clap::{Args, Parser, Subcommand};

/// Command line interface definition.
#[derive(Parser, Debug)]
#[command(author, version, about, propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct GlobalOptions {
    /// Configuration file (defaults to `bg-remover.toml` when present)
    #[arg(short, long, global = true, env = "BG_REMOVER_CONFIG")]
    pub config: Option<PathBuf>,
    /// Executable of the external background-removal tool
    #[arg(long, global = true, env = "BG_REMOVER_PROGRAM")]
    pub program: Option<PathBuf>,
    /// Argument placed before the input/output paths (repeatable; replaces configured ones)
    #[arg(long = "tool-arg", value_name = "ARG", global = true, allow_hyphen_values = true)]
    pub tool_args: Vec<String>,
    /// Seconds to wait for the tool before killing it (0 waits indefinitely)
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,
    /// Log filter, e.g. `info` or `bg_remover=debug`
    #[arg(long = "log-level", value_name = "FILTER", global = true)]
    pub log_level: Option<String>,
}

impl GlobalOptions {
    /// Apply command line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(program) = &self.program {
            config.tool.program = program.clone();
        }
        if !self.tool_args.is_empty() {
            config.tool.args = self.tool_args.clone();
        }
        if let Some(timeout) = self.timeout {
            config.tool.timeout_secs = (timeout > 0).then_some(timeout);
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Remove the background from a single image
    Remove(RemoveCommand),
    /// Serve the upload API over HTTP
    Serve(ServeCommand),
}

#[derive(Args, Debug)]
pub struct RemoveCommand {
    /// Input image path (JPG or PNG, at most 5 MiB by default)
    pub input: PathBuf,
    /// Output PNG path (defaults to `<name>-nobg.png`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub processing: ProcessingArgs,
}

#[derive(Args, Debug)]
pub struct ProcessingArgs {
    /// Background color (`#rrggbb`) or `linear-gradient(...)` descriptor
    #[arg(long)]
    pub background: Option<String>,
    /// Enhance the image quality
    #[arg(long)]
    pub enhance: bool,
    /// Also write an SVG tracing next to the output
    #[arg(long)]
    pub vector: bool,
    /// Segmentation model (silueta, u2netp, u2net, isnet-general-use)
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,
}

impl From<&ProcessingArgs> for ProcessingOptions {
    fn from(args: &ProcessingArgs) -> Self {
        Self {
            background: args.background.clone(),
            enhance: args.enhance,
            vector: args.vector,
            model: Some(args.model.clone()),
        }
    }
}

#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,
    /// Port to bind
    #[arg(short, long)]
    pub port: Option<u16>,
    /// Directory that receives uploads and outputs
    #[arg(long = "uploads-dir", value_name = "DIR")]
    pub uploads_dir: Option<PathBuf>,
}

impl ServeCommand {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(dir) = &self.uploads_dir {
            config.uploads.dir = dir.clone();
        }
    }
}
