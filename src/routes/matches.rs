use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        matches::{
            GoalListQuery, GoalView, MatchDetail, MatchListQuery, MatchUpdate, RecordGoalRequest,
            StandingView,
        },
        schedule::MatchView,
    },
    error::AppError,
    services::match_service,
    state::SharedState,
};

/// Matches, goals and standings.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/matches", get(list_matches))
        .route("/matches/{id}", get(get_match).put(update_match))
        .route("/goals", get(list_goals).post(record_goal))
        .route("/seasons/{id}/standings", get(standings))
}

/// List matches, optionally restricted to a season and a round.
#[utoipa::path(
    get,
    path = "/matches",
    tag = "matches",
    params(MatchListQuery),
    responses((status = 200, description = "Matches in creation order", body = [MatchView]))
)]
pub async fn list_matches(
    State(state): State<SharedState>,
    Query(query): Query<MatchListQuery>,
) -> Result<Json<Vec<MatchView>>, AppError> {
    Ok(Json(match_service::list_matches(&state, query).await?))
}

/// Retrieve a match with its goals.
#[utoipa::path(
    get,
    path = "/matches/{id}",
    tag = "matches",
    params(("id" = Uuid, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Match", body = MatchDetail),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn get_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchDetail>, AppError> {
    Ok(Json(match_service::get_match(&state, id).await?))
}

/// Record a result or move a match to another kickoff or venue.
#[utoipa::path(
    put,
    path = "/matches/{id}",
    tag = "matches",
    params(("id" = Uuid, Path, description = "Match identifier")),
    request_body = MatchUpdate,
    responses(
        (status = 200, description = "Updated match", body = MatchView),
        (status = 400, description = "Invalid field value"),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn update_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<MatchUpdate>>,
) -> Result<Json<MatchView>, AppError> {
    Ok(Json(match_service::update_match(&state, id, payload).await?))
}

#[utoipa::path(
    get,
    path = "/goals",
    tag = "matches",
    params(GoalListQuery),
    responses((status = 200, description = "Recorded goals", body = [GoalView]))
)]
pub async fn list_goals(
    State(state): State<SharedState>,
    Query(query): Query<GoalListQuery>,
) -> Result<Json<Vec<GoalView>>, AppError> {
    Ok(Json(match_service::list_goals(&state, query.match_id).await?))
}

/// Record a goal scored during a match.
#[utoipa::path(
    post,
    path = "/goals",
    tag = "matches",
    request_body = RecordGoalRequest,
    responses(
        (status = 201, description = "Goal recorded", body = GoalView),
        (status = 400, description = "Team or player does not belong to the match"),
        (status = 404, description = "Unknown match, player or goal type")
    )
)]
pub async fn record_goal(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<RecordGoalRequest>>,
) -> Result<(StatusCode, Json<GoalView>), AppError> {
    let goal = match_service::record_goal(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

/// Season table computed from the recorded scores.
#[utoipa::path(
    get,
    path = "/seasons/{id}/standings",
    tag = "matches",
    params(("id" = Uuid, Path, description = "Season identifier")),
    responses(
        (status = 200, description = "Standings, best team first", body = [StandingView]),
        (status = 404, description = "Unknown season")
    )
)]
pub async fn standings(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<StandingView>>, AppError> {
    Ok(Json(match_service::standings(&state, id).await?))
}
