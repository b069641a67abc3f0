/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Insertion and reorder policies of the ranked games list.
pub mod rank_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
/// Demo users.
pub mod user_service;
