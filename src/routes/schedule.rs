use axum::{
    Json, Router,
    extract::{Query, State},
    routing::post,
};
use axum_valid::Valid;
use tracing::error;

use crate::{
    dto::schedule::{
        CreateScheduleRequest, MatchView, ScheduleOverview, ScheduleQuery, ScheduleResult,
    },
    error::{AppError, ScheduleFailure},
    services::schedule_service,
    state::SharedState,
};

/// Round generation and schedule overview.
pub fn router() -> Router<SharedState> {
    Router::new().route("/schedules", post(create_schedule).get(schedule_overview))
}

/// Generate the matches of one round of a season.
#[utoipa::path(
    post,
    path = "/schedules",
    tag = "schedule",
    request_body = CreateScheduleRequest,
    responses(
        (status = 200, description = "Matches generated for the round", body = [MatchView]),
        (status = 404, description = "Unknown season", body = ScheduleResult),
        (status = 422, description = "Odd number of eligible teams", body = ScheduleResult),
        (status = 500, description = "Generation or persistence failed", body = ScheduleResult),
        (status = 503, description = "Storage unavailable", body = ScheduleResult)
    )
)]
pub async fn create_schedule(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateScheduleRequest>>,
) -> Result<Json<Vec<MatchView>>, ScheduleFailure> {
    let season_id = payload.season_id;
    let round = payload.round;
    schedule_service::create_schedule(&state, payload)
        .await
        .map(Json)
        .map_err(|err| {
            error!(season_id = %season_id, round = %round, error = %err, "schedule creation failed");
            ScheduleFailure::from(err)
        })
}

/// Match ids of a season grouped by round.
#[utoipa::path(
    get,
    path = "/schedules",
    tag = "schedule",
    params(ScheduleQuery),
    responses(
        (status = 200, description = "Season schedule", body = ScheduleOverview),
        (status = 404, description = "Unknown season")
    )
)]
pub async fn schedule_overview(
    State(state): State<SharedState>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<ScheduleOverview>, AppError> {
    Ok(Json(
        schedule_service::schedule_overview(&state, query.season_id).await?,
    ))
}
