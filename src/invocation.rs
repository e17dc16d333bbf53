//! Building and running the external background-removal tool.
//!
//! The tool is always started with an explicit argument vector; no shell is involved, so
//! option values reach it byte-for-byte. A spawned child is killed if the awaiting future is
//! dropped, and the wait is bounded by the configured timeout.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::{ProcessingOptions, ToolSettings};
use crate::error::ToolFailure;
use crate::intake::{ImageReference, resolve_path};
use crate::{BridgeError, BridgeResult};

/// Message reported for every successful run.
pub const SUCCESS_MESSAGE: &str = "Background removed successfully";
/// Extension of the optional vector companion output.
pub const VECTOR_EXTENSION: &str = "svg";

/// Outcome of a successful tool run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResult {
    pub success: bool,
    /// The output path exactly as the caller supplied it.
    pub output_path: PathBuf,
    pub message: String,
}

impl InvocationResult {
    fn succeeded(output_path: &Path) -> Self {
        Self {
            success: true,
            output_path: output_path.to_path_buf(),
            message: SUCCESS_MESSAGE.to_string(),
        }
    }
}

/// Where the tool writes the SVG when `vector` is requested: same base name, `.svg`.
///
/// The file only exists if the tool actually produced it.
pub fn vector_output_path(output: &Path) -> PathBuf {
    output.with_extension(VECTOR_EXTENSION)
}

/// Resolve `path` to an absolute string suitable for passing as a literal argument.
///
/// `.` and `..` are collapsed without touching the filesystem. Separators are canonicalized to `/` on Windows.
pub fn normalize_path(path: &Path) -> BridgeResult<String> {
    let absolute = resolve_path(path)?;
    let text = absolute
        .to_str()
        .ok_or_else(|| BridgeError::NonUtf8Path {
            path: absolute.clone(),
        })?;
    if cfg!(windows) {
        Ok(text.replace('\\', "/"))
    } else {
        Ok(text.to_string())
    }
}

/// Arguments for the tool in their fixed order: input, output, then flags for the options that
/// are set (`--background`, `--enhance`, `--vector`, `--model`).
pub fn build_tool_args(input: &str, output: &str, options: &ProcessingOptions) -> Vec<String> {
    let mut args = vec![input.to_string(), output.to_string()];

    if let Some(background) = options.background() {
        args.push("--background".to_string());
        args.push(background.to_string());
    }
    if options.enhance {
        args.push("--enhance".to_string());
    }
    if options.vector {
        args.push("--vector".to_string());
    }
    if let Some(model) = options.model() {
        args.push("--model".to_string());
        args.push(model.to_string());
    }

    args
}

/// A fully resolved command line for one tool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    program: PathBuf,
    leading_args: Vec<String>,
    tool_args: Vec<String>,
}

impl ToolInvocation {
    /// Resolve paths and lay out the argument vector.
    pub fn build(
        settings: &ToolSettings,
        input: &ImageReference,
        output: &Path,
        options: &ProcessingOptions,
    ) -> BridgeResult<Self> {
        let input = normalize_path(input.path())?;
        let output = normalize_path(output)?;
        Ok(Self {
            program: settings.program.clone(),
            leading_args: settings.args.clone(),
            tool_args: build_tool_args(&input, &output, options),
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments placed before the tool arguments (e.g. a script path).
    pub fn leading_args(&self) -> &[String] {
        &self.leading_args
    }

    /// Input path, output path and flags.
    pub fn tool_args(&self) -> &[String] {
        &self.tool_args
    }

    /// The complete argv after the program.
    pub fn argv(&self) -> Vec<OsString> {
        self.leading_args
            .iter()
            .chain(self.tool_args.iter())
            .map(OsString::from)
            .collect()
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(self.argv())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

/// Runs the external tool once per call. Holds no state between calls.
#[derive(Debug, Clone)]
pub struct Runner {
    settings: ToolSettings,
    timeout: Option<Duration>,
}

impl Runner {
    pub fn new(settings: ToolSettings) -> Self {
        let timeout = settings.timeout();
        Self { settings, timeout }
    }

    /// Override the timeout with sub-second precision. A zero duration waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Build the command for `input`/`output` and run it to completion.
    ///
    /// The output file is not checked after a zero exit.
    pub async fn run(
        &self,
        input: &ImageReference,
        output: impl AsRef<Path>,
        options: &ProcessingOptions,
    ) -> BridgeResult<InvocationResult> {
        let output = output.as_ref();
        let invocation = ToolInvocation::build(&self.settings, input, output, options)?;
        debug!(
            program = %invocation.program().display(),
            args = ?invocation.argv(),
            "Built external tool command"
        );

        self.execute(&invocation).await?;
        info!(output = %output.display(), "{SUCCESS_MESSAGE}");
        Ok(InvocationResult::succeeded(output))
    }

    /// Spawn the invocation and wait for it, mapping the outcome to a [`ToolFailure`].
    pub async fn execute(&self, invocation: &ToolInvocation) -> BridgeResult<()> {
        let mut command = invocation.command();
        info!(program = %invocation.program().display(), "Spawning external tool");

        let pending = command.output();
        let result = match self.timeout {
            Some(after) => match tokio::time::timeout(after, pending).await {
                Ok(result) => result,
                Err(_) => {
                    // Dropping the pending future kills the child.
                    warn!(timeout_secs = after.as_secs_f64(), "External tool timed out");
                    return Err(ToolFailure::Timeout { after }.into());
                }
            },
            None => pending.await,
        };

        let output = result.map_err(|source| {
            warn!(error = %source, "Failed to spawn external tool");
            ToolFailure::Spawn {
                program: invocation.program().to_path_buf(),
                source,
            }
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!(stdout = %stdout.trim_end(), "External tool output");
        }

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        warn!(status = %output.status, stderr = %stderr.trim_end(), "External tool failed");
        Err(ToolFailure::Exit {
            code: output.status.code(),
            stderr,
        }
        .into())
    }
}
