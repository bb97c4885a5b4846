//! OpenAPI document of the tournament API.

use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Tournament Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::schedule::create_schedule,
        crate::routes::schedule::schedule_overview,
        crate::routes::matches::list_matches,
        crate::routes::matches::get_match,
        crate::routes::matches::update_match,
        crate::routes::matches::list_goals,
        crate::routes::matches::record_goal,
        crate::routes::matches::standings,
        crate::routes::access::list_permissions,
        crate::routes::access::get_permission,
        crate::routes::access::create_permission,
        crate::routes::access::update_permission,
        crate::routes::access::list_roles,
        crate::routes::access::get_role,
        crate::routes::access::create_role,
        crate::routes::access::update_role,
        crate::routes::access::delete_role,
        crate::routes::access::list_users,
        crate::routes::access::get_user,
        crate::routes::access::create_user,
        crate::routes::access::update_user,
        crate::routes::access::assign_role,
        crate::routes::access::check_permission,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::health::StorageProbe,
            crate::tournament::RoundTag,
            crate::dto::schedule::CreateScheduleRequest,
            crate::dto::schedule::ScheduleResult,
            crate::dto::schedule::MatchView,
            crate::dto::schedule::RoundSchedule,
            crate::dto::schedule::ScheduleOverview,
            crate::dto::matches::MatchDetail,
            crate::dto::matches::MatchUpdate,
            crate::dto::matches::GoalView,
            crate::dto::matches::RecordGoalRequest,
            crate::dto::matches::StandingView,
            crate::dto::access::PermissionView,
            crate::dto::access::CreatePermissionRequest,
            crate::dto::access::PermissionUpdate,
            crate::dto::access::RoleView,
            crate::dto::access::CreateRoleRequest,
            crate::dto::access::RoleUpdate,
            crate::dto::access::UserView,
            crate::dto::access::UserDetail,
            crate::dto::access::CreateUserRequest,
            crate::dto::access::UserUpdate,
            crate::dto::access::AssignRoleRequest,
            crate::dto::access::PermissionCheck,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "schedule", description = "Round generation and season schedules"),
        (name = "matches", description = "Matches, goals and standings"),
        (name = "access", description = "Permissions, roles and users"),
    )
)]
pub struct ApiDoc;
