use std::sync::Arc;

use crate::BackgroundRemover;

use super::upload_store::UploadStore;

/// Shared request state. Cheap to clone; nothing in it is mutated per request.
#[derive(Debug, Clone)]
pub struct AppState {
    pub remover: Arc<BackgroundRemover>,
    pub uploads: Arc<UploadStore>,
}

impl AppState {
    pub fn new(remover: BackgroundRemover, uploads: UploadStore) -> Self {
        Self {
            remover: Arc::new(remover),
            uploads: Arc::new(uploads),
        }
    }
}
