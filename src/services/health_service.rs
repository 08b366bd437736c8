use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report the degraded flag, pinging the score store on the way.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_score_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "score store health check failed");
            }
        }
        Err(_) => warn!("score store unavailable (degraded mode)"),
    }

    HealthResponse::new(
        state.is_degraded().await,
        state.public_sse().subscriber_count(),
    )
}
