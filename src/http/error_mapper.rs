use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, error};

use crate::BridgeError;

/// Failures surfaced by the HTTP boundary.
#[derive(Debug)]
pub enum HttpError {
    /// Anything raised by validation, the options check or the tool run.
    Core(BridgeError),
    /// The multipart body could not be read.
    Multipart(MultipartError),
    /// The route only accepts `POST`.
    MethodNotAllowed,
}

impl HttpError {
    pub(crate) fn from_io(err: std::io::Error) -> Self {
        Self::Core(BridgeError::Io(err))
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Core(BridgeError::MissingInput { .. }) => StatusCode::BAD_REQUEST,
            Self::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Multipart(err) => err.status(),
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            Self::Core(BridgeError::MissingInput { .. }) => {
                debug!("Request carried no image file");
                json!({ "error": "No image file provided" })
            }
            Self::Core(err) => {
                error!(error = %err, "Error removing background");
                json!({ "error": err.to_string(), "details": format!("{err:?}") })
            }
            Self::Multipart(err) => {
                debug!(error = %err, "Rejected multipart body");
                json!({ "error": err.body_text(), "details": err.to_string() })
            }
            Self::MethodNotAllowed => json!({ "error": "Method not allowed" }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<BridgeError> for HttpError {
    fn from(err: BridgeError) -> Self {
        Self::Core(err)
    }
}

impl From<MultipartError> for HttpError {
    fn from(err: MultipartError) -> Self {
        Self::Multipart(err)
    }
}
