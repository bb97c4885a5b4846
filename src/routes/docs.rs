//! Interactive documentation of the tournament API.

use axum::Router;
use tracing::debug;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

/// Where Swagger UI is mounted.
pub const SWAGGER_UI_PATH: &str = "/docs";
/// Where the OpenAPI document is served as JSON.
pub const OPENAPI_JSON_PATH: &str = "/api-doc/openapi.json";

/// Mount Swagger UI over the generated OpenAPI document.
pub fn router(state: SharedState) -> Router<SharedState> {
    let openapi = ApiDoc::openapi();
    debug!(
        paths = openapi.paths.paths.len(),
        ui = SWAGGER_UI_PATH,
        "serving API documentation"
    );
    let ui: Router<SharedState> = SwaggerUi::new(SWAGGER_UI_PATH)
        .url(OPENAPI_JSON_PATH, openapi)
        .into();

    ui.with_state(state)
}
