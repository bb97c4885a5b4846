//! REST route trees merged into the application router.

use axum::Router;

use crate::state::SharedState;

/// Permission, role and user endpoints.
pub mod access;
/// Swagger UI and OpenAPI JSON.
pub mod docs;
/// Health probe.
pub mod health;
/// Match, goal and standings endpoints.
pub mod matches;
/// Round generation endpoints.
pub mod schedule;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(schedule::router())
        .merge(matches::router())
        .merge(access::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
