//! Business operations shared by the HTTP layer and the binary.

/// Permissions, roles and users.
pub mod access_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Match browsing, results, goals and standings.
pub mod match_service;
/// Round generation and season schedules.
pub mod schedule_service;
/// Reference data written from the configuration.
pub mod seed_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
