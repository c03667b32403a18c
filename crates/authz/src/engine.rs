use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;
use uuid::Uuid;

use crate::actor::Actor;
use crate::catalog::{Permission, PermissionCatalog, PermissionFilter};
use crate::error::AuthzError;
use crate::matrix::{Action, RoleLoadWarning, RoleMatrix, RolePermission};
use crate::resources::ResourceMap;
use crate::role::Role;
use crate::scope::{self, DepartmentScoped, ListQuery};
use crate::store::{AccessStore, PermissionChanges, PermissionDraft};

/// Outcome of a composed authorization decision.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DenyReason {
    /// The static resource map does not admit the actor's role.
    ResourceForbidden,
    /// The matrix row denies the requested capability.
    CapabilityDenied,
    /// The permission name is absent from the catalog.
    UnknownPermission,
}

impl DenyReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DenyReason::ResourceForbidden => "resource_forbidden",
            DenyReason::CapabilityDenied => "capability_denied",
            DenyReason::UnknownPermission => "unknown_permission",
        }
    }
}

#[derive(Debug, Default)]
struct EngineState {
    catalog: PermissionCatalog,
    matrix: RoleMatrix,
}

/// The authorization evaluator: static resource map, permission catalog and
/// role-permission matrix behind one facade. Decision operations are
/// synchronous over loaded state; mutations write through the store before
/// updating the cache.
pub struct AccessEngine {
    store: Arc<dyn AccessStore>,
    resources: ResourceMap,
    state: RwLock<EngineState>,
}

impl AccessEngine {
    pub fn new(store: Arc<dyn AccessStore>, resources: ResourceMap) -> Self {
        Self {
            store,
            resources,
            state: RwLock::new(EngineState::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, EngineState> {
        self.state.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, EngineState> {
        self.state.write().unwrap_or_else(|p| p.into_inner())
    }

    /// Populate the catalog, then the matrix for every role. A role whose
    /// fetch fails degrades to an empty (all-false) grant set and is
    /// reported as a warning; the other roles load normally. Only a catalog
    /// fetch failure aborts the load.
    pub async fn load(&self) -> Result<Vec<RoleLoadWarning>, AuthzError> {
        let permissions = self.store.fetch_permissions().await?;
        let mut warnings = Vec::new();
        let mut grants: Vec<(Role, Vec<RolePermission>)> = Vec::with_capacity(Role::ALL.len());
        for role in Role::ALL {
            match self.store.fetch_role_permissions(role).await {
                Ok(rows) => grants.push((role, rows)),
                Err(error) => {
                    warn!(role = %role, error = %error, "role grants failed to load; degrading to no capabilities");
                    grants.push((role, Vec::new()));
                    warnings.push(RoleLoadWarning { role, error });
                }
            }
        }
        let mut state = self.write();
        state.catalog.replace(permissions);
        for (role, rows) in grants {
            state.matrix.replace_role(role, rows);
        }
        Ok(warnings)
    }

    // Catalog ------------------------------------------------------------

    pub async fn create_permission(
        &self,
        draft: PermissionDraft,
    ) -> Result<Permission, AuthzError> {
        if self.read().catalog.contains_name(&draft.name) {
            return Err(AuthzError::DuplicateName(draft.name));
        }
        let created = self.store.create_permission(draft).await?;
        self.write().catalog.upsert(created.clone());
        Ok(created)
    }

    pub async fn update_permission(
        &self,
        id: Uuid,
        changes: PermissionChanges,
    ) -> Result<Permission, AuthzError> {
        if let Some(name) = &changes.name {
            let state = self.read();
            if state.catalog.id_of(name).is_some_and(|other| other != id) {
                return Err(AuthzError::DuplicateName(name.clone()));
            }
        }
        let updated = self.store.update_permission(id, changes).await?;
        self.write().catalog.upsert(updated.clone());
        Ok(updated)
    }

    /// Delete a permission and cascade-remove its matrix rows. The store
    /// performs the cascade transactionally; the cache applies both removals
    /// under one lock so no dangling row is ever observable.
    pub async fn delete_permission(&self, id: Uuid) -> Result<(), AuthzError> {
        self.store.delete_permission(id).await?;
        let mut state = self.write();
        state.catalog.remove(id);
        state.matrix.remove_permission(id);
        Ok(())
    }

    pub fn permissions(&self, filter: &PermissionFilter) -> Vec<Permission> {
        self.read().catalog.list(filter)
    }

    pub fn permission(&self, id: Uuid) -> Option<Permission> {
        self.read().catalog.get(id).cloned()
    }

    pub fn permission_id(&self, name: &str) -> Option<Uuid> {
        self.read().catalog.id_of(name)
    }

    // Matrix -------------------------------------------------------------

    /// Capability row for a pair; synthesizes all-false when absent.
    pub fn capabilities(&self, role: Role, permission_id: Uuid) -> RolePermission {
        self.read().matrix.get(role, permission_id)
    }

    pub async fn set_capability(
        &self,
        role: Role,
        permission_id: Uuid,
        action: Action,
        value: bool,
    ) -> Result<RolePermission, AuthzError> {
        if self.read().catalog.get(permission_id).is_none() {
            return Err(AuthzError::NotFound(permission_id));
        }
        let row = self
            .store
            .set_role_permission(role, permission_id, action, value)
            .await?;
        self.write().matrix.upsert(row);
        Ok(row)
    }

    /// One row per catalog permission for the given role, synthesizing
    /// all-false rows so callers never cross-reference the catalog.
    pub fn role_grants(&self, role: Role) -> Vec<RolePermission> {
        let state = self.read();
        state
            .catalog
            .list(&PermissionFilter::default())
            .iter()
            .map(|p| state.matrix.get(role, p.id))
            .collect()
    }

    // Evaluator ----------------------------------------------------------

    /// Coarse route gate: admin always passes, otherwise the static map
    /// decides; an unlisted resource stays closed.
    pub fn can_enter(&self, resource: &str, actor: &Actor) -> bool {
        self.resources.can_enter(resource, actor)
    }

    /// Fine-grained capability check. Data-driven for every role, admin
    /// included; an unknown permission name is a caller bug and surfaces as
    /// an error rather than a deny.
    pub fn can_perform(
        &self,
        permission_name: &str,
        action: Action,
        actor: &Actor,
    ) -> Result<bool, AuthzError> {
        let state = self.read();
        let id = state
            .catalog
            .id_of(permission_name)
            .ok_or_else(|| AuthzError::UnknownPermission(permission_name.to_string()))?;
        Ok(state.matrix.get(actor.role, id).allows(action))
    }

    /// The single entry point for UI guards and list-fetch call sites:
    /// resource gate first, capability second.
    pub fn decide(
        &self,
        resource: &str,
        permission_name: &str,
        action: Action,
        actor: &Actor,
    ) -> Decision {
        if !self.can_enter(resource, actor) {
            return Decision::Deny(DenyReason::ResourceForbidden);
        }
        match self.can_perform(permission_name, action, actor) {
            Ok(true) => Decision::Allow,
            Ok(false) => Decision::Deny(DenyReason::CapabilityDenied),
            Err(_) => Decision::Deny(DenyReason::UnknownPermission),
        }
    }

    // Department scoping -------------------------------------------------

    pub fn scope_query(&self, params: ListQuery, actor: &Actor) -> ListQuery {
        scope::scope_query(params, actor)
    }

    pub fn scope_collection<T: DepartmentScoped>(&self, records: Vec<T>, actor: &Actor) -> Vec<T> {
        scope::scope_collection(records, actor)
    }

    pub fn can_access_department(&self, department_id: Uuid, actor: &Actor) -> bool {
        scope::can_access_department(department_id, actor)
    }
}
