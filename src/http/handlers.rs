use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use serde_json::{Value, json};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{DEFAULT_BACKGROUND, DEFAULT_MODEL};
use crate::{BridgeError, ProcessingOptions};

use super::dto::{RemoveBgForm, RemoveBgResponse};
use super::error_mapper::HttpError;
use super::state::AppState;
use super::upload_store::{StoredUpload, UploadStore};

/// Multipart field that carries the image.
pub const IMAGE_FIELD: &str = "image";

/// Accept an image upload, run the tool on it and return the public output URLs.
///
/// The stored upload is deleted when validation or the tool fails, so rejected files are never
/// served from the uploads directory.
///
/// A body that is not multipart at all carries no image, so it is reported the same way as a
/// missing `image` field.
pub async fn remove_bg(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<RemoveBgResponse>, HttpError> {
    let mut multipart = multipart.map_err(|rejection| {
        debug!(%rejection, "Request body is not multipart");
        missing_image()
    })?;
    let id = Uuid::new_v4();
    let mut form = RemoveBgForm::default();
    let mut upload: Option<StoredUpload> = None;

    let parsed: Result<(), HttpError> = async {
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match name.as_str() {
                IMAGE_FIELD if field.file_name().is_some() && upload.is_none() => {
                    upload = Some(state.uploads.save_field(id, field).await?);
                }
                "background" => form.background = Some(field.text().await?),
                "enhance" => form.enhance = Some(field.text().await?),
                "vector" => form.vector = Some(field.text().await?),
                "model" => form.model = Some(field.text().await?),
                _ => {}
            }
        }
        Ok(())
    }
    .await;

    if let Err(err) = parsed {
        if let Some(upload) = &upload {
            state.uploads.discard(upload).await;
        }
        return Err(err);
    }

    let upload = upload.ok_or_else(missing_image)?;
    info!(request_id = %id, upload = %upload.path.display(), size = upload.size, "Received upload");

    let options = options_from_form(form);
    let output_name = UploadStore::output_name(id);
    let output_path = state.uploads.dir().join(&output_name);

    let result = match state
        .remover
        .remove(&upload.path, &output_path, &options)
        .await
    {
        Ok(result) => result,
        Err(err) => {
            state.uploads.discard(&upload).await;
            return Err(err.into());
        }
    };

    let svg_url = options
        .vector
        .then(|| state.uploads.url_for(&UploadStore::vector_name(id)));

    Ok(Json(RemoveBgResponse {
        result,
        output_url: state.uploads.url_for(&output_name),
        svg_url,
    }))
}

fn missing_image() -> HttpError {
    HttpError::Core(BridgeError::MissingInput {
        field: IMAGE_FIELD.to_string(),
    })
}

/// Fallback for any method other than `POST` on the remove-bg route.
pub async fn method_not_allowed() -> HttpError {
    HttpError::MethodNotAllowed
}

pub async fn health_check() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Absent or empty text fields fall back to the standard gradient and model; flags are on
/// only for the literal string `"true"`.
fn options_from_form(form: RemoveBgForm) -> ProcessingOptions {
    let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());
    ProcessingOptions {
        background: Some(
            non_empty(form.background).unwrap_or_else(|| DEFAULT_BACKGROUND.to_string()),
        ),
        enhance: form.enhance.as_deref() == Some("true"),
        vector: form.vector.as_deref() == Some("true"),
        model: Some(non_empty(form.model).unwrap_or_else(|| DEFAULT_MODEL.to_string())),
    }
}
