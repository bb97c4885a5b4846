//! Service errors and their HTTP renderings.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::{dao::storage::StorageError, dto::schedule::ScheduleResult, tournament::ScheduleError};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A unique value is already taken or the record is already linked.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Round generation failed.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Duplicate { .. } => ServiceError::Conflict(err.to_string()),
            err => ServiceError::Unavailable(err),
        }
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::Conflict(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Schedule(err) => AppError::Internal(err.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

/// Outcome body of the schedule endpoint for an odd pool.
pub const NOT_ENOUGH_TEAM: &str = "Not enough team";
/// Outcome body of the schedule endpoint for every other failure.
pub const FAILED: &str = "Failed";

/// Schedule failures answer with a [`ScheduleResult`] body instead of [`ErrorBody`].
#[derive(Debug, Error)]
#[error("{result}")]
pub struct ScheduleFailure {
    /// HTTP status of the answer.
    pub status: StatusCode,
    /// Either [`NOT_ENOUGH_TEAM`] or [`FAILED`].
    pub result: &'static str,
}

impl From<ServiceError> for ScheduleFailure {
    fn from(err: ServiceError) -> Self {
        let (status, result) = match &err {
            ServiceError::Schedule(ScheduleError::UnevenPool { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, NOT_ENOUGH_TEAM)
            }
            ServiceError::Schedule(ScheduleError::SeasonNotFound(_))
            | ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, FAILED),
            ServiceError::Schedule(ScheduleError::Storage(_))
            | ServiceError::Unavailable(_)
            | ServiceError::Degraded => (StatusCode::SERVICE_UNAVAILABLE, FAILED),
            ServiceError::InvalidInput(_) => (StatusCode::BAD_REQUEST, FAILED),
            ServiceError::Conflict(_) | ServiceError::Schedule(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, FAILED)
            }
        };
        Self { status, result }
    }
}

impl IntoResponse for ScheduleFailure {
    fn into_response(self) -> axum::response::Response {
        let payload = Json(ScheduleResult {
            result: self.result.to_owned(),
        });
        (self.status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn uneven_pool_is_not_enough_team() {
        let failure = ScheduleFailure::from(ServiceError::from(ScheduleError::UnevenPool {
            count: 3,
        }));
        assert_eq!(failure.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(failure.result, NOT_ENOUGH_TEAM);
    }

    #[test]
    fn other_schedule_errors_fail() {
        let missing = ScheduleFailure::from(ServiceError::from(ScheduleError::SeasonNotFound(
            Uuid::nil(),
        )));
        assert_eq!((missing.status, missing.result), (StatusCode::NOT_FOUND, FAILED));

        let tie = ScheduleFailure::from(ServiceError::from(ScheduleError::UnresolvedTie {
            match_id: Uuid::nil(),
        }));
        assert_eq!(tie.status, StatusCode::INTERNAL_SERVER_ERROR);

        let degraded = ScheduleFailure::from(ServiceError::Degraded);
        assert_eq!(degraded.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn not_enough_team_answers_with_the_result_body() {
        let response = ScheduleFailure::from(ServiceError::from(ScheduleError::UnevenPool {
            count: 5,
        }))
        .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({ "Result": "Not enough team" }));
    }

    #[test]
    fn duplicates_become_conflicts() {
        let err = ServiceError::from(StorageError::duplicate("team", "Rovers"));
        assert!(matches!(AppError::from(err), AppError::Conflict(_)));
    }
}
