use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        access::{
            AssignRoleRequest, CreatePermissionRequest, CreateRoleRequest, CreateUserRequest,
            PermissionCheck, PermissionCheckQuery, PermissionUpdate, PermissionView, RoleUpdate,
            RoleView, UserDetail, UserUpdate, UserView,
        },
        common::PageQuery,
    },
    error::AppError,
    services::access_service,
    state::SharedState,
};

/// Permission catalogue, roles and users.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/permissions",
            get(list_permissions).post(create_permission),
        )
        .route(
            "/permissions/{id}",
            get(get_permission).put(update_permission),
        )
        .route("/roles", get(list_roles).post(create_role))
        .route(
            "/roles/{id}",
            get(get_role).put(update_role).delete(delete_role),
        )
        .route("/users", get(list_users).post(create_user))
        .route("/users/roles", post(assign_role))
        .route("/users/{id}", get(get_user).put(update_user))
        .route("/users/{id}/permissions/check", get(check_permission))
}

#[utoipa::path(
    get,
    path = "/permissions",
    tag = "access",
    params(PageQuery),
    responses((status = 200, description = "Permission catalogue", body = [PermissionView]))
)]
pub async fn list_permissions(
    State(state): State<SharedState>,
    Valid(Query(page)): Valid<Query<PageQuery>>,
) -> Result<Json<Vec<PermissionView>>, AppError> {
    Ok(Json(
        access_service::list_permissions(&state, page.into()).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/permissions/{id}",
    tag = "access",
    params(("id" = Uuid, Path, description = "Permission identifier")),
    responses(
        (status = 200, description = "Permission", body = PermissionView),
        (status = 404, description = "Unknown permission")
    )
)]
pub async fn get_permission(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PermissionView>, AppError> {
    Ok(Json(access_service::get_permission(&state, id).await?))
}

/// Register a new permission key.
#[utoipa::path(
    post,
    path = "/permissions",
    tag = "access",
    request_body = CreatePermissionRequest,
    responses(
        (status = 201, description = "Permission created", body = PermissionView),
        (status = 409, description = "Key already registered")
    )
)]
pub async fn create_permission(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreatePermissionRequest>>,
) -> Result<(StatusCode, Json<PermissionView>), AppError> {
    let permission = access_service::create_permission(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(permission)))
}

#[utoipa::path(
    put,
    path = "/permissions/{id}",
    tag = "access",
    params(("id" = Uuid, Path, description = "Permission identifier")),
    request_body = PermissionUpdate,
    responses(
        (status = 200, description = "Permission updated", body = PermissionView),
        (status = 404, description = "Unknown permission")
    )
)]
pub async fn update_permission(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<PermissionUpdate>>,
) -> Result<Json<PermissionView>, AppError> {
    Ok(Json(
        access_service::update_permission(&state, id, payload).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/roles",
    tag = "access",
    params(PageQuery),
    responses((status = 200, description = "Roles with their permissions", body = [RoleView]))
)]
pub async fn list_roles(
    State(state): State<SharedState>,
    Valid(Query(page)): Valid<Query<PageQuery>>,
) -> Result<Json<Vec<RoleView>>, AppError> {
    Ok(Json(access_service::list_roles(&state, page.into()).await?))
}

#[utoipa::path(
    get,
    path = "/roles/{id}",
    tag = "access",
    params(("id" = Uuid, Path, description = "Role identifier")),
    responses(
        (status = 200, description = "Role", body = RoleView),
        (status = 404, description = "Unknown role")
    )
)]
pub async fn get_role(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoleView>, AppError> {
    Ok(Json(access_service::get_role(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/roles",
    tag = "access",
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "Role created", body = RoleView),
        (status = 400, description = "Unknown permission id")
    )
)]
pub async fn create_role(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateRoleRequest>>,
) -> Result<(StatusCode, Json<RoleView>), AppError> {
    let role = access_service::create_role(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

#[utoipa::path(
    put,
    path = "/roles/{id}",
    tag = "access",
    params(("id" = Uuid, Path, description = "Role identifier")),
    request_body = RoleUpdate,
    responses(
        (status = 200, description = "Role updated", body = RoleView),
        (status = 404, description = "Unknown role")
    )
)]
pub async fn update_role(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<RoleUpdate>>,
) -> Result<Json<RoleView>, AppError> {
    Ok(Json(access_service::update_role(&state, id, payload).await?))
}

/// Delete a role and revoke it from its users.
#[utoipa::path(
    delete,
    path = "/roles/{id}",
    tag = "access",
    params(("id" = Uuid, Path, description = "Role identifier")),
    responses(
        (status = 204, description = "Role deleted"),
        (status = 404, description = "Unknown role")
    )
)]
pub async fn delete_role(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    access_service::delete_role(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "access",
    params(PageQuery),
    responses((status = 200, description = "Users", body = [UserView]))
)]
pub async fn list_users(
    State(state): State<SharedState>,
    Valid(Query(page)): Valid<Query<PageQuery>>,
) -> Result<Json<Vec<UserView>>, AppError> {
    Ok(Json(access_service::list_users(&state, page.into()).await?))
}

/// Retrieve a user with resolved roles and effective permissions.
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "access",
    params(("id" = Uuid, Path, description = "User identifier")),
    responses(
        (status = 200, description = "User", body = UserDetail),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn get_user(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserDetail>, AppError> {
    Ok(Json(access_service::get_user(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "access",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserView),
        (status = 409, description = "Email or username already taken")
    )
)]
pub async fn create_user(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateUserRequest>>,
) -> Result<(StatusCode, Json<UserView>), AppError> {
    let user = access_service::create_user(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "access",
    params(("id" = Uuid, Path, description = "User identifier")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "User updated", body = UserView),
        (status = 404, description = "Unknown user"),
        (status = 409, description = "Email or username already taken")
    )
)]
pub async fn update_user(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<UserUpdate>>,
) -> Result<Json<UserView>, AppError> {
    Ok(Json(access_service::update_user(&state, id, payload).await?))
}

/// Grant a role to a user.
#[utoipa::path(
    post,
    path = "/users/roles",
    tag = "access",
    request_body = AssignRoleRequest,
    responses(
        (status = 200, description = "Role assigned", body = UserView),
        (status = 404, description = "Unknown user or role"),
        (status = 409, description = "Role already assigned")
    )
)]
pub async fn assign_role(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<AssignRoleRequest>>,
) -> Result<Json<UserView>, AppError> {
    Ok(Json(access_service::assign_role(&state, payload).await?))
}

/// Whether a user holds a permission, directly or through a role.
#[utoipa::path(
    get,
    path = "/users/{id}/permissions/check",
    tag = "access",
    params(
        ("id" = Uuid, Path, description = "User identifier"),
        PermissionCheckQuery
    ),
    responses(
        (status = 200, description = "Check result", body = PermissionCheck),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn check_permission(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Query(query)): Valid<Query<PermissionCheckQuery>>,
) -> Result<Json<PermissionCheck>, AppError> {
    Ok(Json(
        access_service::has_permission(&state, id, query.key).await?,
    ))
}
