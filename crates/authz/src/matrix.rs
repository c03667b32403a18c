use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthzError;
use crate::role::Role;

/// One of the four independently grantable capabilities.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::View, Action::Create, Action::Edit, Action::Delete];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
        }
    }
}

/// Capability row for one (role, permission) pair. At most one row exists
/// per pair; absence reads as all-false.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RolePermission {
    pub role: Role,
    pub permission_id: Uuid,
    pub can_view: bool,
    pub can_create: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl RolePermission {
    /// Synthetic all-false row for a pair with no explicit grant.
    pub fn empty(role: Role, permission_id: Uuid) -> Self {
        Self {
            role,
            permission_id,
            can_view: false,
            can_create: false,
            can_edit: false,
            can_delete: false,
        }
    }

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::View => self.can_view,
            Action::Create => self.can_create,
            Action::Edit => self.can_edit,
            Action::Delete => self.can_delete,
        }
    }

    pub fn set(&mut self, action: Action, value: bool) {
        match action {
            Action::View => self.can_view = value,
            Action::Create => self.can_create = value,
            Action::Edit => self.can_edit = value,
            Action::Delete => self.can_delete = value,
        }
    }
}

/// Non-fatal per-role outcome of a matrix load. The role's grants degraded
/// to empty for this session; nothing else was affected.
#[derive(Debug)]
pub struct RoleLoadWarning {
    pub role: Role,
    pub error: AuthzError,
}

/// The in-memory role-permission matrix. Reads never fail; a missing pair
/// means "no capability", not an error.
#[derive(Debug, Default)]
pub struct RoleMatrix {
    grants: HashMap<(Role, Uuid), RolePermission>,
}

impl RoleMatrix {
    pub fn get(&self, role: Role, permission_id: Uuid) -> RolePermission {
        self.grants
            .get(&(role, permission_id))
            .copied()
            .unwrap_or_else(|| RolePermission::empty(role, permission_id))
    }

    pub fn upsert(&mut self, row: RolePermission) {
        self.grants.insert((row.role, row.permission_id), row);
    }

    /// Swap in a freshly fetched grant set for one role, dropping whatever
    /// was loaded before. A failed fetch calls this with an empty vec so the
    /// role is all-false rather than stale.
    pub fn replace_role(&mut self, role: Role, rows: Vec<RolePermission>) {
        self.grants.retain(|(r, _), _| *r != role);
        for row in rows {
            self.grants.insert((role, row.permission_id), row);
        }
    }

    /// Cascade hook: drop every row referencing a deleted permission.
    pub fn remove_permission(&mut self, permission_id: Uuid) {
        self.grants.retain(|(_, p), _| *p != permission_id);
    }

    pub fn explicit_rows(&self, role: Role) -> Vec<RolePermission> {
        let mut rows: Vec<RolePermission> = self
            .grants
            .values()
            .filter(|row| row.role == role)
            .copied()
            .collect();
        rows.sort_by_key(|row| row.permission_id);
        rows
    }
}
