//! HTTP boundary: multipart upload in, processed image URLs out.

mod dto;
mod error_mapper;
mod handlers;
mod routes;
mod state;
mod upload_store;

pub use dto::RemoveBgResponse;
pub use error_mapper::HttpError;
pub use routes::{REMOVE_BG_PATH, create_router};
pub use state::AppState;
pub use upload_store::{StoredUpload, UploadStore};
