use serde::Serialize;
use utoipa::ToSchema;

/// Response of the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok" when a score store is installed, "degraded" otherwise.
    pub status: String,
    /// Display streams currently connected.
    pub display_clients: usize,
}

impl HealthResponse {
    pub fn new(degraded: bool, display_clients: usize) -> Self {
        let status = if degraded { "degraded" } else { "ok" };
        Self {
            status: status.to_string(),
            display_clients,
        }
    }
}
