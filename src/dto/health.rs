//! Health endpoint payload.

use serde::Serialize;
use utoipa::ToSchema;

/// Liveness report.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always `"ok"` while the process serves traffic.
    pub status: &'static str,
    /// Whether a competition is currently loaded.
    pub competition_loaded: bool,
}
