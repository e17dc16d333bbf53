use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use image::ImageFormat;

use crate::config::DEFAULT_MAX_INPUT_BYTES;
use crate::{BridgeError, BridgeResult};

/// Extensions accepted at intake, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// A validated input image. Only [`IntakePolicy::validate`] constructs one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    path: PathBuf,
    extension: String,
    format: ImageFormat,
    size: u64,
}

impl ImageReference {
    /// Absolute path to the image.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lowercased extension without the leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Size in bytes at the time of validation.
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Format and size policy applied to candidate input files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakePolicy {
    max_bytes: u64,
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

impl IntakePolicy {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Check existence, then format, then size. Only `stat` calls are made.
    pub fn validate(&self, path: impl AsRef<Path>) -> BridgeResult<ImageReference> {
        let path = path.as_ref();

        let metadata = match fs::metadata(path) {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Err(not_found(path)),
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(not_found(path)),
            Err(err) => return Err(err.into()),
        };

        let extension = lowercase_extension(path);
        let format = extension
            .as_deref()
            .filter(|ext| ALLOWED_EXTENSIONS.contains(ext))
            .and_then(ImageFormat::from_extension)
            .ok_or_else(|| BridgeError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: extension.clone(),
            })?;

        let size = metadata.len();
        if size > self.max_bytes {
            return Err(BridgeError::TooLarge {
                path: path.to_path_buf(),
                size,
                limit: self.max_bytes,
            });
        }

        Ok(ImageReference {
            path: resolve_path(path)?,
            extension: extension.unwrap_or_default(),
            format,
            size,
        })
    }
}

/// Validate `path` against the default 5 MiB JPG/PNG policy.
pub fn validate_image(path: impl AsRef<Path>) -> BridgeResult<ImageReference> {
    IntakePolicy::default().validate(path)
}

/// Make `path` absolute and collapse `.` and `..` lexically. Symlinks are left alone.
pub(crate) fn resolve_path(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other.as_os_str()),
        }
    }
    Ok(resolved)
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

fn not_found(path: &Path) -> BridgeError {
    BridgeError::NotFound {
        path: path.to_path_buf(),
    }
}
