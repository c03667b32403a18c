use async_trait::async_trait;
use uuid::Uuid;

use crate::catalog::Permission;
use crate::error::AuthzError;
use crate::matrix::{Action, RolePermission};
use crate::role::Role;

/// Fields for a new permission.
#[derive(Clone, Debug)]
pub struct PermissionDraft {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
}

/// Partial update; `None` leaves a field untouched.
#[derive(Clone, Debug, Default)]
pub struct PermissionChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

/// Persistence collaborator boundary. The engine only ever sees "succeeded
/// with data" or a mapped failure; endpoint and retry details stay behind
/// this trait.
#[async_trait]
pub trait AccessStore: Send + Sync {
    async fn fetch_permissions(&self) -> Result<Vec<Permission>, AuthzError>;

    async fn fetch_role_permissions(&self, role: Role) -> Result<Vec<RolePermission>, AuthzError>;

    async fn create_permission(&self, draft: PermissionDraft) -> Result<Permission, AuthzError>;

    async fn update_permission(
        &self,
        id: Uuid,
        changes: PermissionChanges,
    ) -> Result<Permission, AuthzError>;

    /// Deletes the permission and every role-permission row referencing it
    /// in one transaction; a partial cascade is not a valid terminal state.
    async fn delete_permission(&self, id: Uuid) -> Result<(), AuthzError>;

    /// Atomic single-field upsert: creates the all-false row on first touch,
    /// then flips exactly the named capability.
    async fn set_role_permission(
        &self,
        role: Role,
        permission_id: Uuid,
        action: Action,
        value: bool,
    ) -> Result<RolePermission, AuthzError>;
}
