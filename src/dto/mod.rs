//! Wire types exchanged over the REST API.

/// Permissions, roles and users.
pub mod access;
/// Pagination shared by listings.
pub mod common;
/// Health probe payloads.
pub mod health;
/// Matches, goals and standings.
pub mod matches;
/// Round generation and season schedules.
pub mod schedule;
/// Custom field validators.
pub mod validation;
