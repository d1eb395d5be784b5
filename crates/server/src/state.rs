use std::sync::Arc;

use pdfsum_pipeline::Orchestrator;

pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Largest accepted upload, in bytes.
    pub max_upload_bytes: usize,
    /// `*` for any origin.
    pub cors_origin: String,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, max_upload_bytes: usize) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            max_upload_bytes,
            cors_origin: "*".to_string(),
        }
    }
}
