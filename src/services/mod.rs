/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Board projections for display clients and logs.
pub mod renderer;
/// Score persistence gateway.
pub mod score_service;
/// Session controller driving the turn engine.
pub mod session_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Score store connection supervisor with degraded mode.
pub mod storage_supervisor;
