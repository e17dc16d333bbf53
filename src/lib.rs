pub mod background;
pub mod config;
pub mod config_loader;
pub mod error;
#[cfg(feature = "server")]
pub mod http;
pub mod intake;
pub mod invocation;
pub mod logging;

pub use background::{Background, Rgb};
pub use config::{AppConfig, ProcessingOptions, ToolSettings};
pub use error::{BridgeError, BridgeResult, ToolFailure};
pub use intake::{ImageReference, IntakePolicy, validate_image};
pub use invocation::{InvocationResult, Runner, ToolInvocation, vector_output_path};

use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::KNOWN_MODELS;

/// Entry point for validating an input image and running the external tool on it.
#[derive(Debug, Clone)]
pub struct BackgroundRemover {
    /// Format and size policy applied before anything is spawned.
    intake: IntakePolicy,
    /// Launches the external tool.
    runner: Runner,
}

impl Default for BackgroundRemover {
    fn default() -> Self {
        Self::new(ToolSettings::default())
    }
}

impl BackgroundRemover {
    pub fn new(settings: ToolSettings) -> Self {
        Self {
            intake: IntakePolicy::new(settings.max_input_bytes),
            runner: Runner::new(settings),
        }
    }

    /// Replace the intake policy.
    pub fn with_intake_policy(mut self, intake: IntakePolicy) -> Self {
        self.intake = intake;
        self
    }

    /// Set how long a single tool run may take; `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.runner = self.runner.with_timeout(timeout);
        self
    }

    pub fn intake_policy(&self) -> &IntakePolicy {
        &self.intake
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    /// Validate `input`, check the options, then run the tool to write `output`.
    ///
    /// Validation and option failures happen before the tool is spawned. A failed run does not
    /// remove anything the tool may already have written.
    pub async fn remove(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        options: &ProcessingOptions,
    ) -> BridgeResult<InvocationResult> {
        let image = self.intake.validate(input)?;
        info!(
            input = %image.path().display(),
            size = image.size(),
            ?options,
            "Running background removal"
        );

        if let Some(background) = options.background() {
            Background::parse(background)?;
        }
        if let Some(model) = options.model()
            && !KNOWN_MODELS.contains(&model)
        {
            warn!(model, "Unknown model name, passing it to the tool unchanged");
        }

        self.runner.run(&image, output, options).await
    }
}

/// Run background removal with the default tool settings.
pub async fn remove_background(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &ProcessingOptions,
) -> BridgeResult<InvocationResult> {
    BackgroundRemover::default()
        .remove(input, output, options)
        .await
}
