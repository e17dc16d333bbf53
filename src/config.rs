use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{BridgeError, BridgeResult};

/// Background applied by the standard options when none is given.
pub const DEFAULT_BACKGROUND: &str = "linear-gradient(to right, #ff7e5f, #feb47b)";
/// Segmentation model applied by the standard options when none is given.
pub const DEFAULT_MODEL: &str = "silueta";
/// Models the reference tool ships with. Other names are passed through untouched.
pub const KNOWN_MODELS: [&str; 4] = ["silueta", "u2netp", "u2net", "isnet-general-use"];
/// Largest accepted input image, in bytes.
pub const DEFAULT_MAX_INPUT_BYTES: u64 = 5 * 1024 * 1024;
/// Default bound on how long a single tool run may take.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Options forwarded to the external tool as command-line flags.
///
/// `Default` sets nothing, so a default value adds no flags at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingOptions {
    /// Solid colour (`#rrggbb`) or `linear-gradient(...)` descriptor.
    pub background: Option<String>,
    /// Ask the tool to sharpen the result.
    pub enhance: bool,
    /// Ask the tool to also write an SVG tracing next to the output.
    pub vector: bool,
    /// Segmentation model identifier.
    pub model: Option<String>,
}

impl ProcessingOptions {
    /// Options with the documented gradient background and `silueta` model.
    pub fn standard() -> Self {
        Self {
            background: Some(DEFAULT_BACKGROUND.to_string()),
            enhance: false,
            vector: false,
            model: Some(DEFAULT_MODEL.to_string()),
        }
    }

    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = Some(background.into());
        self
    }

    pub fn with_enhance(mut self, enhance: bool) -> Self {
        self.enhance = enhance;
        self
    }

    pub fn with_vector(mut self, vector: bool) -> Self {
        self.vector = vector;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// The background value, treating an empty string as absent.
    pub fn background(&self) -> Option<&str> {
        self.background.as_deref().filter(|value| !value.is_empty())
    }

    /// The model value, treating an empty string as absent.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref().filter(|value| !value.is_empty())
    }
}

/// How the external tool is launched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Executable to spawn.
    pub program: PathBuf,
    /// Arguments placed before the input/output paths (e.g. the script path).
    pub args: Vec<String>,
    /// Upper bound on a single run in seconds; `None` or `0` waits indefinitely.
    pub timeout_secs: Option<u64>,
    /// Largest accepted input image, in bytes.
    pub max_input_bytes: u64,
}

/// Runs `python3 scripts/remove_bg.py` (`python` on Windows), resolved against the working
/// directory. The script is not shipped with this crate; point `program`/`args` at the
/// installed tool when it lives elsewhere.
impl Default for ToolSettings {
    fn default() -> Self {
        let program = if cfg!(windows) { "python" } else { "python3" };
        Self {
            program: PathBuf::from(program),
            args: vec!["scripts/remove_bg.py".to_string()],
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

impl ToolSettings {
    /// Create settings that run `program` directly with no leading arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            ..Self::default()
        }
    }

    /// Replace the leading arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the timeout for a single run, rounded up to whole seconds.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout_secs = timeout.map(|t| t.as_secs() + u64::from(t.subsec_nanos() > 0));
        self
    }

    /// Zero seconds disables the limit.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
    }
}

/// Top-level configuration for the binary, loaded by [`crate::config_loader`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub uploads: UploadConfig,
    pub tool: ToolSettings,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Where uploads and outputs are written and the URL prefix they are served under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub url_prefix: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("public").join("uploads"),
            url_prefix: "/uploads".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            include_location: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl AppConfig {
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Reject values that would only fail later at runtime.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.server.port == 0 {
            return Err(config_error("server.port must be non-zero"));
        }
        if self.tool.program.as_os_str().is_empty() {
            return Err(config_error("tool.program must not be empty"));
        }
        if self.tool.max_input_bytes == 0 {
            return Err(config_error("tool.max_input_bytes must be non-zero"));
        }
        let prefix = self.uploads.url_prefix.trim_end_matches('/');
        if !prefix.starts_with('/') {
            return Err(config_error(
                "uploads.url_prefix must start with `/` and name a path below the root",
            ));
        }
        Ok(())
    }
}

fn config_error(message: &str) -> BridgeError {
    BridgeError::Config {
        message: message.to_string(),
    }
}
