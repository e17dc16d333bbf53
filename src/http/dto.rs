use serde::Serialize;

use crate::InvocationResult;

/// Body of a successful `POST` to the remove-bg route.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveBgResponse {
    #[serde(flatten)]
    pub result: InvocationResult,
    pub output_url: String,
    /// Present only when vector output was requested; the file may still be missing.
    pub svg_url: Option<String>,
}

/// Text fields collected from the multipart body.
#[derive(Debug, Default)]
pub(crate) struct RemoveBgForm {
    pub background: Option<String>,
    pub enhance: Option<String>,
    pub vector: Option<String>,
    pub model: Option<String>,
}
