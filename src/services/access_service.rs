//! Permission catalogue, roles and users.
//!
//! Unique keys (permission key, user email and username) are enforced by the store; its
//! duplicate reports surface as [`ServiceError::Conflict`].

use std::sync::Arc;

use indexmap::IndexMap;
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::{
        models::{PermissionEntity, RoleEntity, UserEntity},
        tournament_store::{Page, TournamentStore},
        unit_of_work::{StagedWrite, UnitOfWork},
    },
    dto::access::{
        AssignRoleRequest, CreatePermissionRequest, CreateRoleRequest, CreateUserRequest,
        PermissionCheck, PermissionUpdate, PermissionView, RoleUpdate, RoleView, UserDetail,
        UserUpdate, UserView,
    },
    error::ServiceError,
    state::SharedState,
};

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

async fn load_permission(
    store: &dyn TournamentStore,
    id: Uuid,
) -> Result<PermissionEntity, ServiceError> {
    store
        .find_permission(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("permission `{id}` not found")))
}

async fn load_role(store: &dyn TournamentStore, id: Uuid) -> Result<RoleEntity, ServiceError> {
    store
        .find_role(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("role `{id}` not found")))
}

async fn load_user(store: &dyn TournamentStore, id: Uuid) -> Result<UserEntity, ServiceError> {
    store
        .find_user(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("user `{id}` not found")))
}

/// Resolve permission ids, failing on the first unknown one. Repeated ids are collapsed.
async fn resolve_permissions(
    store: &dyn TournamentStore,
    ids: &[Uuid],
) -> Result<Vec<PermissionEntity>, ServiceError> {
    let mut resolved: IndexMap<Uuid, PermissionEntity> = IndexMap::new();
    for &id in ids {
        if resolved.contains_key(&id) {
            continue;
        }
        let permission = store.find_permission(id).await?.ok_or_else(|| {
            ServiceError::InvalidInput(format!("permission `{id}` does not exist"))
        })?;
        resolved.insert(id, permission);
    }
    Ok(resolved.into_values().collect())
}

async fn role_view(store: &dyn TournamentStore, role: RoleEntity) -> Result<RoleView, ServiceError> {
    let mut permissions = Vec::with_capacity(role.permission_ids.len());
    for &id in &role.permission_ids {
        // Dangling grants are skipped.
        if let Some(permission) = store.find_permission(id).await? {
            permissions.push(permission.into());
        }
    }
    Ok(RoleView::resolved(role, permissions))
}

/// Roles of a user and the union of direct and role-granted permissions, in grant order.
async fn effective_access(
    store: &dyn TournamentStore,
    user: &UserEntity,
) -> Result<(Vec<RoleEntity>, Vec<PermissionEntity>), ServiceError> {
    let mut roles = Vec::with_capacity(user.role_ids.len());
    for &id in &user.role_ids {
        if let Some(role) = store.find_role(id).await? {
            roles.push(role);
        }
    }

    let granted = user
        .permission_ids
        .iter()
        .chain(roles.iter().flat_map(|role| role.permission_ids.iter()));
    let mut permissions: IndexMap<Uuid, PermissionEntity> = IndexMap::new();
    for &id in granted {
        if permissions.contains_key(&id) {
            continue;
        }
        if let Some(permission) = store.find_permission(id).await? {
            permissions.insert(id, permission);
        }
    }

    Ok((roles, permissions.into_values().collect()))
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

/// One page of permissions.
pub async fn list_permissions(
    state: &SharedState,
    page: Page,
) -> Result<Vec<PermissionView>, ServiceError> {
    let store = state.require_store().await?;
    let permissions = store.list_permissions(page).await?;
    Ok(permissions.into_iter().map(PermissionView::from).collect())
}

/// One permission.
pub async fn get_permission(state: &SharedState, id: Uuid) -> Result<PermissionView, ServiceError> {
    let store = state.require_store().await?;
    Ok(load_permission(store.as_ref(), id).await?.into())
}

/// Create a permission with a unique key.
pub async fn create_permission(
    state: &SharedState,
    request: CreatePermissionRequest,
) -> Result<PermissionView, ServiceError> {
    let store = state.require_store().await?;
    let permission = PermissionEntity {
        id: Uuid::new_v4(),
        key: request.key,
        name: request.name,
        module: request.module,
        description: request.description,
    };
    store.save_permission(permission.clone()).await?;
    info!(permission_id = %permission.id, key = %permission.key, "permission created");
    Ok(permission.into())
}

/// Change the name, module or description of a permission.
pub async fn update_permission(
    state: &SharedState,
    id: Uuid,
    update: PermissionUpdate,
) -> Result<PermissionView, ServiceError> {
    let store = state.require_store().await?;
    let mut permission = load_permission(store.as_ref(), id).await?;

    if let Some(name) = update.name {
        permission.name = name;
    }
    if let Some(module) = update.module {
        permission.module = module;
    }
    if let Some(description) = update.description {
        permission.description = description;
    }

    store.save_permission(permission.clone()).await?;
    Ok(permission.into())
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// One page of roles with their permissions.
pub async fn list_roles(state: &SharedState, page: Page) -> Result<Vec<RoleView>, ServiceError> {
    let store = state.require_store().await?;
    let roles = store.list_roles(page).await?;

    let mut views = Vec::with_capacity(roles.len());
    for role in roles {
        views.push(role_view(store.as_ref(), role).await?);
    }
    Ok(views)
}

/// One role with its permissions.
pub async fn get_role(state: &SharedState, id: Uuid) -> Result<RoleView, ServiceError> {
    let store = state.require_store().await?;
    let role = load_role(store.as_ref(), id).await?;
    role_view(store.as_ref(), role).await
}

/// Create a role granting existing permissions.
pub async fn create_role(
    state: &SharedState,
    request: CreateRoleRequest,
) -> Result<RoleView, ServiceError> {
    let store = state.require_store().await?;
    let permissions = resolve_permissions(store.as_ref(), &request.permission_ids).await?;

    let now = OffsetDateTime::now_utc();
    let role = RoleEntity {
        id: Uuid::new_v4(),
        name: request.name,
        description: request.description,
        permission_ids: permissions.iter().map(|permission| permission.id).collect(),
        created_at: now,
        updated_at: now,
    };
    store.save_role(role.clone()).await?;
    info!(role_id = %role.id, permissions = permissions.len(), "role created");

    Ok(RoleView::resolved(
        role,
        permissions.into_iter().map(PermissionView::from).collect(),
    ))
}

/// Change a role; a new permission list replaces the old one.
pub async fn update_role(
    state: &SharedState,
    id: Uuid,
    update: RoleUpdate,
) -> Result<RoleView, ServiceError> {
    let store = state.require_store().await?;
    let mut role = load_role(store.as_ref(), id).await?;

    if let Some(name) = update.name {
        role.name = name;
    }
    if let Some(description) = update.description {
        role.description = description;
    }
    if let Some(permission_ids) = update.permission_ids {
        let permissions = resolve_permissions(store.as_ref(), &permission_ids).await?;
        role.permission_ids = permissions.iter().map(|permission| permission.id).collect();
    }
    role.updated_at = OffsetDateTime::now_utc();

    store.save_role(role.clone()).await?;
    role_view(store.as_ref(), role).await
}

/// Delete a role and revoke it from every user holding it.
pub async fn delete_role(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    load_role(store.as_ref(), id).await?;

    let mut unit = UnitOfWork::begin(Arc::clone(&store));
    let now = OffsetDateTime::now_utc();
    for mut user in all_users(store.as_ref()).await? {
        if !user.role_ids.contains(&id) {
            continue;
        }
        user.role_ids.retain(|role_id| *role_id != id);
        user.updated_at = now;
        unit.stage(StagedWrite::SaveUser(user));
    }
    let revoked = unit.len();
    unit.stage(StagedWrite::DeleteRole(id));
    unit.commit()
        .await
        .map_err(|err| ServiceError::from(err.source))?;

    info!(role_id = %id, revoked, "role deleted");
    Ok(())
}

async fn all_users(store: &dyn TournamentStore) -> Result<Vec<UserEntity>, ServiceError> {
    let mut users = Vec::new();
    let mut page = Page::default();
    loop {
        let batch = store.list_users(page).await?;
        let fetched = batch.len();
        users.extend(batch);
        if fetched < page.limit {
            return Ok(users);
        }
        page.offset += fetched;
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// One page of user summaries.
pub async fn list_users(state: &SharedState, page: Page) -> Result<Vec<UserView>, ServiceError> {
    let store = state.require_store().await?;
    let users = store.list_users(page).await?;
    Ok(users.into_iter().map(UserView::from).collect())
}

/// One user with roles and effective permissions.
pub async fn get_user(state: &SharedState, id: Uuid) -> Result<UserDetail, ServiceError> {
    let store = state.require_store().await?;
    let user = load_user(store.as_ref(), id).await?;
    let (roles, permissions) = effective_access(store.as_ref(), &user).await?;

    let mut role_views = Vec::with_capacity(roles.len());
    for role in roles {
        role_views.push(role_view(store.as_ref(), role).await?);
    }

    Ok(UserDetail {
        user: user.into(),
        roles: role_views,
        effective_permissions: permissions.into_iter().map(PermissionView::from).collect(),
    })
}

/// Create an active user with a normalized email.
pub async fn create_user(
    state: &SharedState,
    request: CreateUserRequest,
) -> Result<UserView, ServiceError> {
    let store = state.require_store().await?;
    let permissions = resolve_permissions(store.as_ref(), &request.permission_ids).await?;

    let now = OffsetDateTime::now_utc();
    let user = UserEntity {
        id: Uuid::new_v4(),
        email: request.email.trim().to_lowercase(),
        username: request.username,
        full_name: request.full_name,
        mobile: request.mobile,
        is_active: true,
        role_ids: Vec::new(),
        permission_ids: permissions.iter().map(|permission| permission.id).collect(),
        created_at: now,
        updated_at: now,
        last_login: None,
    };
    store.save_user(user.clone()).await?;
    info!(user_id = %user.id, username = %user.username, "user created");
    Ok(user.into())
}

/// Change the provided user fields.
pub async fn update_user(
    state: &SharedState,
    id: Uuid,
    update: UserUpdate,
) -> Result<UserView, ServiceError> {
    let store = state.require_store().await?;
    let mut user = load_user(store.as_ref(), id).await?;

    if let Some(email) = update.email {
        user.email = email.trim().to_lowercase();
    }
    if let Some(username) = update.username {
        user.username = username;
    }
    if let Some(full_name) = update.full_name {
        user.full_name = full_name;
    }
    if let Some(mobile) = update.mobile {
        user.mobile = Some(mobile);
    }
    if let Some(is_active) = update.is_active {
        user.is_active = is_active;
    }
    if let Some(permission_ids) = update.permission_ids {
        let permissions = resolve_permissions(store.as_ref(), &permission_ids).await?;
        user.permission_ids = permissions.iter().map(|permission| permission.id).collect();
    }
    user.updated_at = OffsetDateTime::now_utc();

    store.save_user(user.clone()).await?;
    Ok(user.into())
}

/// Grant a role to a user. Granting a role the user already holds is a conflict.
pub async fn assign_role(
    state: &SharedState,
    request: AssignRoleRequest,
) -> Result<UserView, ServiceError> {
    let store = state.require_store().await?;
    let mut user = load_user(store.as_ref(), request.user_id).await?;
    load_role(store.as_ref(), request.role_id).await?;

    if user.role_ids.contains(&request.role_id) {
        return Err(ServiceError::Conflict(format!(
            "user `{}` already has role `{}`",
            user.id, request.role_id
        )));
    }
    user.role_ids.push(request.role_id);
    user.updated_at = OffsetDateTime::now_utc();

    store.save_user(user.clone()).await?;
    info!(user_id = %user.id, role_id = %request.role_id, "role assigned");
    Ok(user.into())
}

/// Whether the user holds `key`, directly or through one of their roles.
pub async fn has_permission(
    state: &SharedState,
    user_id: Uuid,
    key: String,
) -> Result<PermissionCheck, ServiceError> {
    let store = state.require_store().await?;
    let user = load_user(store.as_ref(), user_id).await?;

    let granted = if !user.is_active {
        debug!(user_id = %user_id, "inactive user holds no permission");
        false
    } else {
        match store.find_permission_by_key(key.clone()).await? {
            Some(permission) => {
                let (_, permissions) = effective_access(store.as_ref(), &user).await?;
                permissions.iter().any(|held| held.id == permission.id)
            }
            None => false,
        }
    };

    Ok(PermissionCheck {
        user_id,
        key,
        granted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, dao::tournament_store::MemoryStore, state::AppState};

    async fn state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state.install_store(Arc::new(MemoryStore::new())).await;
        state
    }

    async fn permission(state: &SharedState, key: &str) -> PermissionView {
        create_permission(
            state,
            CreatePermissionRequest {
                key: key.into(),
                name: key.into(),
                module: "schedule".into(),
                description: String::new(),
            },
        )
        .await
        .unwrap()
    }

    async fn user(state: &SharedState, username: &str) -> UserView {
        create_user(
            state,
            CreateUserRequest {
                email: format!("{username}@example.org"),
                username: username.into(),
                full_name: username.into(),
                mobile: None,
                permission_ids: Vec::new(),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn duplicate_permission_key_is_a_conflict() {
        let state = state().await;
        permission(&state, "schedule.create").await;
        let err = create_permission(
            &state,
            CreatePermissionRequest {
                key: "schedule.create".into(),
                name: "again".into(),
                module: String::new(),
                description: String::new(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn role_with_unknown_permission_is_rejected() {
        let state = state().await;
        let err = create_role(
            &state,
            CreateRoleRequest {
                name: "organiser".into(),
                description: String::new(),
                permission_ids: vec![Uuid::new_v4()],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let state = state().await;
        user(&state, "ada").await;
        let err = create_user(
            &state,
            CreateUserRequest {
                email: "ADA@example.org".into(),
                username: "ada2".into(),
                full_name: "Ada".into(),
                mobile: None,
                permission_ids: Vec::new(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn role_grants_permissions_until_deleted() {
        let state = state().await;
        let create = permission(&state, "schedule.create").await;
        let view = permission(&state, "schedule.view").await;
        let role = create_role(
            &state,
            CreateRoleRequest {
                name: "organiser".into(),
                description: String::new(),
                permission_ids: vec![create.id, view.id, create.id],
            },
        )
        .await
        .unwrap();
        assert_eq!(role.permissions.len(), 2);

        let ada = user(&state, "ada").await;
        assign_role(
            &state,
            AssignRoleRequest {
                user_id: ada.id,
                role_id: role.id,
            },
        )
        .await
        .unwrap();

        let again = assign_role(
            &state,
            AssignRoleRequest {
                user_id: ada.id,
                role_id: role.id,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(again, ServiceError::Conflict(_)));

        let detail = get_user(&state, ada.id).await.unwrap();
        assert_eq!(detail.roles.len(), 1);
        assert_eq!(detail.effective_permissions.len(), 2);
        assert!(
            has_permission(&state, ada.id, "schedule.create".into())
                .await
                .unwrap()
                .granted
        );

        delete_role(&state, role.id).await.unwrap();
        let detail = get_user(&state, ada.id).await.unwrap();
        assert!(detail.user.role_ids.is_empty());
        assert!(
            !has_permission(&state, ada.id, "schedule.create".into())
                .await
                .unwrap()
                .granted
        );
        assert!(matches!(
            get_role(&state, role.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn inactive_users_hold_nothing() {
        let state = state().await;
        let key = permission(&state, "users.manage").await;
        let bob = user(&state, "bob").await;
        update_user(
            &state,
            bob.id,
            UserUpdate {
                permission_ids: Some(vec![key.id]),
                ..UserUpdate::default()
            },
        )
        .await
        .unwrap();
        assert!(
            has_permission(&state, bob.id, "users.manage".into())
                .await
                .unwrap()
                .granted
        );

        update_user(
            &state,
            bob.id,
            UserUpdate {
                is_active: Some(false),
                ..UserUpdate::default()
            },
        )
        .await
        .unwrap();
        assert!(
            !has_permission(&state, bob.id, "users.manage".into())
                .await
                .unwrap()
                .granted
        );
    }
}
