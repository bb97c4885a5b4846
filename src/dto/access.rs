//! DTOs of the permission, role and user endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{PermissionEntity, RoleEntity, UserEntity},
    dto::validation::validate_permission_key,
    tournament::calendar::format_timestamp,
};

/// Permission as exposed over the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PermissionView {
    /// Permission identifier.
    pub id: Uuid,
    /// Unique machine key.
    pub key: String,
    /// Human readable name.
    pub name: String,
    /// Functional area.
    pub module: String,
    /// Longer explanation.
    pub description: String,
}

impl From<PermissionEntity> for PermissionView {
    fn from(value: PermissionEntity) -> Self {
        Self {
            id: value.id,
            key: value.key,
            name: value.name,
            module: value.module,
            description: value.description,
        }
    }
}

/// Payload creating a permission.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreatePermissionRequest {
    /// Lowercase key such as `schedule.create`; unique.
    #[validate(custom(function = "validate_permission_key"))]
    pub key: String,
    /// Human readable name.
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    /// Functional area.
    #[serde(default)]
    pub module: String,
    /// Longer explanation.
    #[serde(default)]
    pub description: String,
}

/// Changeable permission fields. The key is immutable once created.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct PermissionUpdate {
    /// New name.
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    /// New functional area.
    pub module: Option<String>,
    /// New explanation.
    pub description: Option<String>,
}

/// Role with its permissions resolved.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoleView {
    /// Role identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// What the role is meant for.
    pub description: String,
    /// Permissions granted by the role.
    pub permissions: Vec<PermissionView>,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// RFC 3339 modification time.
    pub updated_at: String,
}

impl RoleView {
    /// Role view carrying already loaded permissions.
    pub fn resolved(role: RoleEntity, permissions: Vec<PermissionView>) -> Self {
        Self {
            id: role.id,
            name: role.name,
            description: role.description,
            permissions,
            created_at: format_timestamp(role.created_at),
            updated_at: format_timestamp(role.updated_at),
        }
    }
}

/// Payload creating a role.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateRoleRequest {
    /// Display name.
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    /// What the role is meant for.
    #[serde(default)]
    pub description: String,
    /// Existing permissions to grant; duplicates are collapsed.
    #[serde(default)]
    pub permission_ids: Vec<Uuid>,
}

/// Changeable role fields. `permission_ids` replaces the whole grant list.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct RoleUpdate {
    /// New name.
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// Replacement grant list.
    pub permission_ids: Option<Vec<Uuid>>,
}

/// User summary.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserView {
    /// User identifier.
    pub id: Uuid,
    /// Normalized email.
    pub email: String,
    /// Login name.
    pub username: String,
    /// Name shown in listings.
    pub full_name: String,
    /// Phone number.
    pub mobile: Option<String>,
    /// Inactive users hold no permission.
    pub is_active: bool,
    /// Assigned roles.
    pub role_ids: Vec<Uuid>,
    /// Directly granted permissions.
    pub permission_ids: Vec<Uuid>,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// RFC 3339 modification time.
    pub updated_at: String,
    /// RFC 3339 time of the last login.
    pub last_login: Option<String>,
}

impl From<UserEntity> for UserView {
    fn from(value: UserEntity) -> Self {
        Self {
            id: value.id,
            email: value.email,
            username: value.username,
            full_name: value.full_name,
            mobile: value.mobile,
            is_active: value.is_active,
            role_ids: value.role_ids,
            permission_ids: value.permission_ids,
            created_at: format_timestamp(value.created_at),
            updated_at: format_timestamp(value.updated_at),
            last_login: value.last_login.map(format_timestamp),
        }
    }
}

/// User with roles resolved and the union of every permission granted to them.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserDetail {
    /// User summary.
    #[serde(flatten)]
    pub user: UserView,
    /// Assigned roles with their permissions.
    pub roles: Vec<RoleView>,
    /// Direct and role permissions, each listed once.
    pub effective_permissions: Vec<PermissionView>,
}

/// Payload creating a user.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    /// Email, stored trimmed and lowercased; unique.
    #[validate(email)]
    pub email: String,
    /// Login name; unique.
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    /// Name shown in listings.
    #[validate(length(min = 1, max = 128))]
    pub full_name: String,
    /// Optional phone number.
    #[validate(length(min = 6, max = 20))]
    pub mobile: Option<String>,
    /// Permissions granted directly.
    #[serde(default)]
    pub permission_ids: Vec<Uuid>,
}

/// Changeable user fields. Roles change through role assignment.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct UserUpdate {
    /// New email; unique.
    #[validate(email)]
    pub email: Option<String>,
    /// New login name; unique.
    #[validate(length(min = 3, max = 64))]
    pub username: Option<String>,
    /// New display name.
    #[validate(length(min = 1, max = 128))]
    pub full_name: Option<String>,
    /// New phone number.
    #[validate(length(min = 6, max = 20))]
    pub mobile: Option<String>,
    /// Enable or disable the account.
    pub is_active: Option<bool>,
    /// Replacement list of direct permissions.
    pub permission_ids: Option<Vec<Uuid>>,
}

/// Payload assigning a role to a user.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct AssignRoleRequest {
    /// User receiving the role.
    pub user_id: Uuid,
    /// Role to assign.
    pub role_id: Uuid,
}

/// Query of the permission check.
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct PermissionCheckQuery {
    /// Permission key to look up.
    #[validate(custom(function = "validate_permission_key"))]
    pub key: String,
}

/// Whether a user holds a permission, directly or through a role.
#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionCheck {
    /// Checked user.
    pub user_id: Uuid,
    /// Checked permission key.
    pub key: String,
    /// Whether the user holds the permission.
    pub granted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_validates_email_and_username() {
        let request = CreateUserRequest {
            email: "not-an-email".into(),
            username: "ab".into(),
            full_name: "Ada".into(),
            mobile: None,
            permission_ids: Vec::new(),
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("username"));
        assert!(!fields.contains_key("full_name"));
    }

    #[test]
    fn updates_reject_unknown_fields() {
        assert!(serde_json::from_str::<RoleUpdate>(r#"{"created_at": "x"}"#).is_err());
        assert!(serde_json::from_str::<UserUpdate>(r#"{"role_ids": []}"#).is_err());
        assert!(serde_json::from_str::<PermissionUpdate>(r#"{"key": "a.b"}"#).is_err());

        let update: UserUpdate = serde_json::from_str(r#"{"is_active": false}"#).unwrap();
        assert_eq!(update.is_active, Some(false));
    }
}
