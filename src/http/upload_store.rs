use std::path::{Path, PathBuf};

use axum::extract::multipart::Field;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::BridgeResult;
use crate::config::UploadConfig;
use crate::intake::ALLOWED_EXTENSIONS;
use crate::invocation::VECTOR_EXTENSION;

use super::error_mapper::HttpError;

const OUTPUT_EXTENSION: &str = "png";

/// The public directory that receives uploads and tool outputs.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    url_prefix: String,
}

/// An uploaded file written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub path: PathBuf,
    pub size: u64,
}

impl UploadStore {
    /// Create the directory if it is missing. Must run before serving requests.
    pub async fn init(config: &UploadConfig) -> BridgeResult<Self> {
        fs::create_dir_all(&config.dir).await?;
        info!(dir = %config.dir.display(), "Uploads directory ready");
        Ok(Self {
            dir: config.dir.clone(),
            url_prefix: config.url_prefix.trim_end_matches('/').to_string(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Public URL for a file name inside the directory.
    pub fn url_for(&self, file_name: &str) -> String {
        format!("{}/{}", self.url_prefix, file_name)
    }

    /// Name of the raster output for request `id`.
    pub fn output_name(id: Uuid) -> String {
        format!("output-{id}.{OUTPUT_EXTENSION}")
    }

    /// Name of the vector companion for request `id`.
    pub fn vector_name(id: Uuid) -> String {
        format!("output-{id}.{VECTOR_EXTENSION}")
    }

    /// Stream a multipart file field to `upload-<id>.<ext>`.
    ///
    /// The client file name only contributes its extension, lowercased, and only when it is an
    /// accepted image extension; anything else is stored without one. A partially written file
    /// is removed if the stream fails.
    pub async fn save_field(&self, id: Uuid, mut field: Field<'_>) -> Result<StoredUpload, HttpError> {
        let name = match field.file_name().and_then(image_extension) {
            Some(ext) => format!("upload-{id}.{ext}"),
            None => format!("upload-{id}"),
        };
        let path = self.dir.join(name);

        let mut file = File::create(&path).await.map_err(HttpError::from_io)?;
        let mut size = 0u64;
        let written: Result<(), HttpError> = async {
            while let Some(chunk) = field.chunk().await? {
                file.write_all(&chunk).await.map_err(HttpError::from_io)?;
                size += chunk.len() as u64;
            }
            file.flush().await.map_err(HttpError::from_io)
        }
        .await;

        let upload = StoredUpload { path, size };
        if let Err(err) = written {
            drop(file);
            self.discard(&upload).await;
            return Err(err);
        }

        debug!(path = %upload.path.display(), size, "Stored upload");
        Ok(upload)
    }

    /// Delete an upload that will not be processed.
    pub async fn discard(&self, upload: &StoredUpload) {
        match fs::remove_file(&upload.path).await {
            Ok(()) => debug!(path = %upload.path.display(), "Discarded upload"),
            Err(err) => warn!(path = %upload.path.display(), error = %err, "Failed to discard upload"),
        }
    }
}

fn image_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}
