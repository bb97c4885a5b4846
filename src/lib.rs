//! Library crate for tournament-back, exposing modules for binaries and integration tests.

/// Runtime configuration loaded from JSON and the environment.
pub mod config;
/// Entities, storage trait and backends.
pub mod dao;
/// Request and response payloads.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP route trees.
pub mod routes;
/// Business operations behind the routes.
pub mod services;
/// Shared application state.
pub mod state;
/// Scheduling, advancement and standings rules.
pub mod tournament;
