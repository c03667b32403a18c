//! sea-orm implementations of the engine's collaborator boundaries.

use std::sync::Arc;

use argon2::password_hash::{PasswordHash, PasswordVerifier};
use argon2::Argon2;
use async_trait::async_trait;
use authz::{
    AccessStore, Action, Actor, AuthzError, Credentials, Permission, PermissionChanges,
    PermissionDraft, Role, RolePermission, SessionError, SessionStore,
};
use chrono::Utc;
use entity::{app_user, permission, role_permission};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, TransactionTrait,
};
use uuid::Uuid;

pub fn role_to_db(role: Role) -> app_user::Role {
    match role {
        Role::Admin => app_user::Role::Admin,
        Role::Manager => app_user::Role::Manager,
        Role::Lead => app_user::Role::Lead,
        Role::Staff => app_user::Role::Staff,
    }
}

pub fn role_from_db(role: app_user::Role) -> Role {
    match role {
        app_user::Role::Admin => Role::Admin,
        app_user::Role::Manager => Role::Manager,
        app_user::Role::Lead => Role::Lead,
        app_user::Role::Staff => Role::Staff,
    }
}

pub fn actor_from_user(model: &app_user::Model) -> Actor {
    Actor {
        user_id: model.id,
        role: role_from_db(model.role),
        department_id: model.department_id,
        employee_id: model.employee_id,
        is_active: model.is_active,
    }
}

fn permission_from_model(model: permission::Model) -> Permission {
    Permission {
        id: model.id,
        name: model.name,
        description: model.description,
        category: model.category,
    }
}

fn grant_from_model(model: role_permission::Model) -> RolePermission {
    RolePermission {
        role: role_from_db(model.role),
        permission_id: model.permission_id,
        can_view: model.can_view,
        can_create: model.can_create,
        can_edit: model.can_edit,
        can_delete: model.can_delete,
    }
}

fn unavailable(err: DbErr) -> AuthzError {
    AuthzError::Unavailable(err.to_string())
}

fn capability_column(action: Action) -> role_permission::Column {
    match action {
        Action::View => role_permission::Column::CanView,
        Action::Create => role_permission::Column::CanCreate,
        Action::Edit => role_permission::Column::CanEdit,
        Action::Delete => role_permission::Column::CanDelete,
    }
}

/// Permission/matrix persistence over the application database.
pub struct DbAccessStore {
    db: Arc<DatabaseConnection>,
}

impl DbAccessStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccessStore for DbAccessStore {
    async fn fetch_permissions(&self) -> Result<Vec<Permission>, AuthzError> {
        let rows = permission::Entity::find()
            .all(self.db.as_ref())
            .await
            .map_err(unavailable)?;
        Ok(rows.into_iter().map(permission_from_model).collect())
    }

    async fn fetch_role_permissions(&self, role: Role) -> Result<Vec<RolePermission>, AuthzError> {
        let rows = role_permission::Entity::find()
            .filter(role_permission::Column::Role.eq(role_to_db(role)))
            .all(self.db.as_ref())
            .await
            .map_err(unavailable)?;
        Ok(rows.into_iter().map(grant_from_model).collect())
    }

    async fn create_permission(&self, draft: PermissionDraft) -> Result<Permission, AuthzError> {
        let existing = permission::Entity::find()
            .filter(permission::Column::Name.eq(draft.name.clone()))
            .one(self.db.as_ref())
            .await
            .map_err(unavailable)?;
        if existing.is_some() {
            return Err(AuthzError::DuplicateName(draft.name));
        }
        let model = permission::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(draft.name),
            description: Set(draft.description),
            category: Set(draft.category),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.db.as_ref())
        .await
        .map_err(unavailable)?;
        Ok(permission_from_model(model))
    }

    async fn update_permission(
        &self,
        id: Uuid,
        changes: PermissionChanges,
    ) -> Result<Permission, AuthzError> {
        let model = permission::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(unavailable)?
            .ok_or(AuthzError::NotFound(id))?;
        let mut active: permission::ActiveModel = model.into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(description) = changes.description {
            active.description = Set(Some(description));
        }
        if let Some(category) = changes.category {
            active.category = Set(Some(category));
        }
        let updated = active.update(self.db.as_ref()).await.map_err(unavailable)?;
        Ok(permission_from_model(updated))
    }

    async fn delete_permission(&self, id: Uuid) -> Result<(), AuthzError> {
        let txn = self.db.begin().await.map_err(unavailable)?;
        let existing = permission::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(unavailable)?;
        if existing.is_none() {
            return Err(AuthzError::NotFound(id));
        }
        role_permission::Entity::delete_many()
            .filter(role_permission::Column::PermissionId.eq(id))
            .exec(&txn)
            .await
            .map_err(unavailable)?;
        permission::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(unavailable)?;
        txn.commit().await.map_err(unavailable)?;
        Ok(())
    }

    async fn set_role_permission(
        &self,
        role: Role,
        permission_id: Uuid,
        action: Action,
        value: bool,
    ) -> Result<RolePermission, AuthzError> {
        let db_role = role_to_db(role);
        let mut draft = role_permission::ActiveModel {
            role: Set(db_role),
            permission_id: Set(permission_id),
            can_view: Set(false),
            can_create: Set(false),
            can_edit: Set(false),
            can_delete: Set(false),
            created_at: Set(Utc::now().into()),
        };
        match action {
            Action::View => draft.can_view = Set(value),
            Action::Create => draft.can_create = Set(value),
            Action::Edit => draft.can_edit = Set(value),
            Action::Delete => draft.can_delete = Set(value),
        }
        // Single upsert so two concurrent toggles cannot interleave into a
        // half-written row; only the named column is updated on conflict.
        role_permission::Entity::insert(draft)
            .on_conflict(
                OnConflict::columns([
                    role_permission::Column::Role,
                    role_permission::Column::PermissionId,
                ])
                .update_column(capability_column(action))
                .to_owned(),
            )
            .exec(self.db.as_ref())
            .await
            .map_err(unavailable)?;
        let row = role_permission::Entity::find_by_id((db_role, permission_id))
            .one(self.db.as_ref())
            .await
            .map_err(unavailable)?
            .ok_or(AuthzError::NotFound(permission_id))?;
        Ok(grant_from_model(row))
    }
}

/// Identity collaborator over the application database. Sessions persist in
/// the client's cookie, so the persisted-session and invalidation sides are
/// no-ops here; credential verification is the real work.
pub struct DbIdentity {
    db: Arc<DatabaseConnection>,
}

impl DbIdentity {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for DbIdentity {
    async fn load_persisted(&self) -> Result<Option<Actor>, SessionError> {
        Ok(None)
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<Actor, SessionError> {
        let user = app_user::Entity::find()
            .filter(app_user::Column::Username.eq(credentials.username.clone()))
            .one(self.db.as_ref())
            .await
            .map_err(|err| SessionError::Unavailable(err.to_string()))?
            .ok_or(SessionError::InvalidCredentials)?;
        let parsed = PasswordHash::new(&user.password_hash)
            .map_err(|_| SessionError::InvalidCredentials)?;
        Argon2::default()
            .verify_password(credentials.password.as_bytes(), &parsed)
            .map_err(|_| SessionError::InvalidCredentials)?;
        Ok(actor_from_user(&user))
    }

    async fn persist(&self, _actor: &Actor) -> Result<(), SessionError> {
        Ok(())
    }

    async fn invalidate(&self) -> Result<(), SessionError> {
        Ok(())
    }
}
