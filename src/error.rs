use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for operations that may fail with [`BridgeError`].
pub type BridgeResult<T> = std::result::Result<T, BridgeError>;

/// Error types that can occur while validating an input image and running the external tool.
///
/// Validation failures (`NotFound`, `UnsupportedFormat`, `TooLarge`, `InvalidBackground`)
/// are raised before anything is spawned and leave no side effects behind.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No regular file exists at the given path.
    #[error("The input file does not exist: {}", path.display())]
    NotFound { path: PathBuf },
    /// The file extension is not one of the accepted image formats.
    #[error("Unsupported file format{}. Please use JPG or PNG.", describe_extension(extension))]
    UnsupportedFormat {
        path: PathBuf,
        extension: Option<String>,
    },
    /// The file is larger than the configured intake limit.
    #[error("File size {size} bytes exceeds the {limit} byte limit: {}", path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },
    /// The background descriptor cannot be understood by the external tool.
    #[error("Invalid background `{value}`: {reason}")]
    InvalidBackground { value: String, reason: String },
    /// The external tool could not be spawned, failed, or timed out.
    #[error(transparent)]
    ExternalTool(#[from] ToolFailure),
    /// The multipart request carried no file under the expected field.
    #[error("No {field} file provided")]
    MissingInput { field: String },
    /// The path cannot be handed to the external tool as a string.
    #[error("Path is not valid UTF-8: {}", path.display())]
    NonUtf8Path { path: PathBuf },
    /// File system I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// The ways a single external tool invocation can fail.
#[derive(Debug, Error)]
pub enum ToolFailure {
    /// The process could not be started at all.
    #[error("Failed to start `{}`: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The process exited with a non-zero status; `stderr` is kept verbatim.
    #[error("{}", describe_exit(*code, stderr))]
    Exit { code: Option<i32>, stderr: String },
    /// The process did not finish within the configured bound and was killed.
    #[error("Timeout: external tool did not finish within {}s", after.as_secs_f64())]
    Timeout { after: Duration },
}

fn describe_extension(extension: &Option<String>) -> String {
    match extension {
        Some(ext) => format!(" `.{ext}`"),
        None => String::new(),
    }
}

fn describe_exit(code: Option<i32>, stderr: &str) -> String {
    if !stderr.trim().is_empty() {
        return stderr.to_string();
    }
    match code {
        Some(code) => format!("External tool exited with status {code}"),
        None => "External tool was terminated by a signal".to_string(),
    }
}
