use std::sync::Arc;

use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use argon2::Argon2;
use async_graphql::{
    Context, EmptySubscription, Enum, Error, ErrorExtensions, InputObject, Object, Schema,
    SimpleObject, ID,
};
use authz::{
    AccessEngine, Action, Actor, AuthzError, Credentials, Decision, DenyReason, ListQuery,
    PermissionChanges, PermissionDraft, PermissionFilter, Role, SessionError, SessionStore,
    SortOrder,
};
use chrono::{DateTime, Utc};
use entity::{app_user, department, task};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder,
};
use tracing::warn;
use uuid::Uuid;

use crate::auth::{issue_token, AuthConfig, SESSION_COOKIE};
use crate::store::{role_from_db, DbIdentity};

pub struct AppSchema(pub Schema<QueryRoot, MutationRoot, EmptySubscription>);

pub fn build_schema(
    db: Arc<DatabaseConnection>,
    engine: Arc<AccessEngine>,
    identity: Arc<DbIdentity>,
    auth: Arc<AuthConfig>,
) -> AppSchema {
    let schema = Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(db)
        .data(engine)
        .data(identity)
        .data(auth)
        .finish();
    AppSchema(schema)
}

pub struct QueryRoot;
pub struct MutationRoot;

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum RoleName {
    #[graphql(name = "ADMIN")]
    Admin,
    #[graphql(name = "MANAGER")]
    Manager,
    #[graphql(name = "LEAD")]
    Lead,
    #[graphql(name = "STAFF")]
    Staff,
}

impl RoleName {
    fn to_role(self) -> Role {
        match self {
            RoleName::Admin => Role::Admin,
            RoleName::Manager => Role::Manager,
            RoleName::Lead => Role::Lead,
            RoleName::Staff => Role::Staff,
        }
    }

    fn from_role(role: Role) -> Self {
        match role {
            Role::Admin => RoleName::Admin,
            Role::Manager => RoleName::Manager,
            Role::Lead => RoleName::Lead,
            Role::Staff => RoleName::Staff,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum CapabilityAction {
    #[graphql(name = "VIEW")]
    View,
    #[graphql(name = "CREATE")]
    Create,
    #[graphql(name = "EDIT")]
    Edit,
    #[graphql(name = "DELETE")]
    Delete,
}

impl CapabilityAction {
    fn to_action(self) -> Action {
        match self {
            CapabilityAction::View => Action::View,
            CapabilityAction::Create => Action::Create,
            CapabilityAction::Edit => Action::Edit,
            CapabilityAction::Delete => Action::Delete,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum TaskStatus {
    #[graphql(name = "OPEN")]
    Open,
    #[graphql(name = "DONE")]
    Done,
    #[graphql(name = "CANCELLED")]
    Cancelled,
}

impl TaskStatus {
    fn to_db(self) -> task::Status {
        match self {
            TaskStatus::Open => task::Status::Open,
            TaskStatus::Done => task::Status::Done,
            TaskStatus::Cancelled => task::Status::Cancelled,
        }
    }

    fn from_db(status: task::Status) -> Self {
        match status {
            task::Status::Open => TaskStatus::Open,
            task::Status::Done => TaskStatus::Done,
            task::Status::Cancelled => TaskStatus::Cancelled,
        }
    }

    fn key(self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::Done => "done",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key {
            "open" => Some(TaskStatus::Open),
            "done" => Some(TaskStatus::Done),
            "cancelled" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum SortDirection {
    #[graphql(name = "ASC")]
    Asc,
    #[graphql(name = "DESC")]
    Desc,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct UserNode {
    pub id: ID,
    pub username: String,
    pub display_name: String,
    pub role: RoleName,
    pub department_id: Option<ID>,
    pub employee_id: Option<ID>,
    pub is_active: bool,
}

impl UserNode {
    fn from_model(model: app_user::Model) -> Self {
        Self {
            id: ID::from(model.id.to_string()),
            username: model.username,
            display_name: model.display_name,
            role: RoleName::from_role(role_from_db(model.role)),
            department_id: model.department_id.map(|d| ID::from(d.to_string())),
            employee_id: model.employee_id.map(|e| ID::from(e.to_string())),
            is_active: model.is_active,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct MePayload {
    pub user: UserNode,
    pub role: RoleName,
    pub department_id: Option<ID>,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct AuthPayload {
    pub ok: bool,
    pub user: Option<UserNode>,
    pub error: Option<String>,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct PermissionNode {
    pub id: ID,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
}

impl PermissionNode {
    fn from_permission(permission: authz::Permission) -> Self {
        Self {
            id: ID::from(permission.id.to_string()),
            name: permission.name,
            description: permission.description,
            category: permission.category,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct RolePermissionNode {
    pub role: RoleName,
    pub permission_id: ID,
    pub permission_name: Option<String>,
    pub can_view: bool,
    pub can_create: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl RolePermissionNode {
    fn from_grant(grant: authz::RolePermission, engine: &AccessEngine) -> Self {
        Self {
            role: RoleName::from_role(grant.role),
            permission_id: ID::from(grant.permission_id.to_string()),
            permission_name: engine.permission(grant.permission_id).map(|p| p.name),
            can_view: grant.can_view,
            can_create: grant.can_create,
            can_edit: grant.can_edit,
            can_delete: grant.can_delete,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct RoleGrantsNode {
    pub role: RoleName,
    pub grants: Vec<RolePermissionNode>,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct RoleWarningNode {
    pub role: RoleName,
    pub message: String,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct ReloadPayload {
    pub warnings: Vec<RoleWarningNode>,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct DecisionPayload {
    pub allowed: bool,
    pub reason: Option<String>,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct DepartmentNode {
    pub id: ID,
    pub name: String,
    pub code: String,
    pub is_active: bool,
}

impl DepartmentNode {
    fn from_model(model: department::Model) -> Self {
        Self {
            id: ID::from(model.id.to_string()),
            name: model.name,
            code: model.code,
            is_active: model.is_active,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct TaskNode {
    pub id: ID,
    pub title: String,
    pub notes: Option<String>,
    pub status: TaskStatus,
    pub department_id: Option<ID>,
    pub due_at: Option<DateTime<Utc>>,
}

impl TaskNode {
    fn from_model(model: task::Model) -> Self {
        Self {
            id: ID::from(model.id.to_string()),
            title: model.title,
            notes: model.notes,
            status: TaskStatus::from_db(model.status),
            department_id: model.department_id.map(|d| ID::from(d.to_string())),
            due_at: model.due_at.map(|t| t.with_timezone(&Utc)),
        }
    }
}

#[derive(Clone, Debug, InputObject)]
pub struct NewPermissionInput {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
}

#[derive(Clone, Debug, InputObject)]
pub struct UpdatePermissionInput {
    pub id: ID,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

#[derive(Clone, Debug, InputObject)]
pub struct NewTaskInput {
    pub title: String,
    pub notes: Option<String>,
    pub department_id: Option<ID>,
    pub due_at: Option<DateTime<Utc>>,
}

#[Object]
impl QueryRoot {
    async fn me(&self, ctx: &Context<'_>) -> async_graphql::Result<MePayload> {
        let actor = current_actor(ctx)?;
        let db = database(ctx)?;
        let model = app_user::Entity::find_by_id(actor.user_id)
            .one(db.as_ref())
            .await
            .map_err(db_error)?
            .ok_or_else(|| error_with_code("UNAUTHENTICATED", "Login required"))?;
        let department_id = model.department_id.map(|d| ID::from(d.to_string()));
        let node = UserNode::from_model(model);
        Ok(MePayload {
            role: node.role,
            department_id,
            user: node,
        })
    }

    /// Catalog listing for the permissions screen.
    async fn permissions(
        &self,
        ctx: &Context<'_>,
        category: Option<String>,
        q: Option<String>,
    ) -> async_graphql::Result<Vec<PermissionNode>> {
        let actor = current_actor(ctx)?;
        let engine = engine(ctx)?;
        require_resource(&engine, "permissions", &actor)?;
        let filter = PermissionFilter { category, q };
        Ok(engine
            .permissions(&filter)
            .into_iter()
            .map(PermissionNode::from_permission)
            .collect())
    }

    /// Grants for one role, one row per catalog permission. A caller may
    /// always inspect its own role; other roles need the permissions screen.
    async fn role_grants(
        &self,
        ctx: &Context<'_>,
        role: RoleName,
    ) -> async_graphql::Result<Vec<RolePermissionNode>> {
        let actor = current_actor(ctx)?;
        let engine = engine(ctx)?;
        if role.to_role() != actor.role {
            require_resource(&engine, "permissions", &actor)?;
        }
        Ok(engine
            .role_grants(role.to_role())
            .into_iter()
            .map(|grant| RolePermissionNode::from_grant(grant, &engine))
            .collect())
    }

    /// The whole matrix, for the role management screen.
    async fn role_matrix(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<RoleGrantsNode>> {
        let actor = current_actor(ctx)?;
        let engine = engine(ctx)?;
        require_resource(&engine, "permissions", &actor)?;
        Ok(Role::ALL
            .iter()
            .map(|role| RoleGrantsNode {
                role: RoleName::from_role(*role),
                grants: engine
                    .role_grants(*role)
                    .into_iter()
                    .map(|grant| RolePermissionNode::from_grant(grant, &engine))
                    .collect(),
            })
            .collect())
    }

    /// Route-guard entry point: resource gate then capability check.
    async fn decide(
        &self,
        ctx: &Context<'_>,
        resource: String,
        permission: String,
        action: CapabilityAction,
    ) -> async_graphql::Result<DecisionPayload> {
        let actor = current_actor(ctx)?;
        let engine = engine(ctx)?;
        Ok(
            match engine.decide(&resource, &permission, action.to_action(), &actor) {
                Decision::Allow => DecisionPayload {
                    allowed: true,
                    reason: None,
                },
                Decision::Deny(reason) => DecisionPayload {
                    allowed: false,
                    reason: Some(reason.as_str().to_string()),
                },
            },
        )
    }

    async fn can_enter(
        &self,
        ctx: &Context<'_>,
        resource: String,
    ) -> async_graphql::Result<bool> {
        let actor = current_actor(ctx)?;
        let engine = engine(ctx)?;
        Ok(engine.can_enter(&resource, &actor))
    }

    async fn departments(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<DepartmentNode>> {
        let _ = current_actor(ctx)?;
        let db = database(ctx)?;
        let records = department::Entity::find()
            .order_by_asc(department::Column::Name)
            .all(db.as_ref())
            .await
            .map_err(db_error)?;
        Ok(records.into_iter().map(DepartmentNode::from_model).collect())
    }

    async fn users(
        &self,
        ctx: &Context<'_>,
        q: Option<String>,
    ) -> async_graphql::Result<Vec<UserNode>> {
        let actor = current_actor(ctx)?;
        let engine = engine(ctx)?;
        require_resource(&engine, "users", &actor)?;
        let db = database(ctx)?;
        let mut query = app_user::Entity::find();
        if let Some(filter) = sanitize_optional_filter(q) {
            query = query.filter(app_user::Column::Username.contains(&filter));
        }
        let records = query
            .order_by_asc(app_user::Column::Username)
            .all(db.as_ref())
            .await
            .map_err(db_error)?;
        Ok(records.into_iter().map(UserNode::from_model).collect())
    }

    /// Task listing with department scoping applied to the query before it
    /// reaches the database, and again over the fetched rows.
    async fn tasks(
        &self,
        ctx: &Context<'_>,
        department: Option<ID>,
        status: Option<TaskStatus>,
        q: Option<String>,
        sort: Option<SortDirection>,
    ) -> async_graphql::Result<Vec<TaskNode>> {
        let actor = current_actor(ctx)?;
        let engine = engine(ctx)?;
        require_resource(&engine, "tasks", &actor)?;
        let db = database(ctx)?;

        let requested = ListQuery {
            department: department.as_ref().map(parse_uuid).transpose()?,
            status: status.map(|s| s.key().to_string()),
            search: sanitize_optional_filter(q),
            sort: sort.map(|s| match s {
                SortDirection::Asc => SortOrder::Asc,
                SortDirection::Desc => SortOrder::Desc,
            }),
        };
        let scoped = engine.scope_query(requested, &actor);

        let mut query = task::Entity::find();
        if let Some(dept) = scoped.department {
            query = query.filter(task::Column::DepartmentId.eq(dept));
        }
        if let Some(status) = scoped.status.as_deref().and_then(TaskStatus::from_key) {
            query = query.filter(task::Column::Status.eq(status.to_db()));
        }
        if let Some(search) = &scoped.search {
            query = query.filter(task::Column::Title.contains(search));
        }
        query = match scoped.sort {
            Some(SortOrder::Asc) => query.order_by_asc(task::Column::CreatedAt),
            _ => query.order_by_desc(task::Column::CreatedAt),
        };
        let records = query.all(db.as_ref()).await.map_err(db_error)?;
        let visible = engine.scope_collection(records, &actor);
        Ok(visible.into_iter().map(TaskNode::from_model).collect())
    }

    async fn task(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<Option<TaskNode>> {
        let actor = current_actor(ctx)?;
        let engine = engine(ctx)?;
        require_resource(&engine, "tasks", &actor)?;
        let db = database(ctx)?;
        let task_id = parse_uuid(&id)?;
        let Some(model) = task::Entity::find_by_id(task_id)
            .one(db.as_ref())
            .await
            .map_err(db_error)?
        else {
            return Ok(None);
        };
        if let Some(dept) = model.department_id {
            if !engine.can_access_department(dept, &actor) {
                return Err(error_with_code(
                    "RESOURCE_FORBIDDEN",
                    "Not permitted to view this department's records",
                ));
            }
        }
        Ok(Some(TaskNode::from_model(model)))
    }
}

#[Object]
impl MutationRoot {
    async fn login(
        &self,
        ctx: &Context<'_>,
        username: String,
        password: String,
    ) -> async_graphql::Result<AuthPayload> {
        let auth = auth_config(ctx)?;
        let identity = identity(ctx)?;
        let credentials = Credentials {
            username: username.trim().to_string(),
            password,
        };
        let actor = match identity.authenticate(&credentials).await {
            Ok(actor) => actor,
            Err(SessionError::InvalidCredentials) => {
                return Ok(AuthPayload {
                    ok: false,
                    user: None,
                    error: Some("Invalid credentials".into()),
                });
            }
            Err(error) => {
                return Err(error_with_code("UNAVAILABLE", error.to_string()));
            }
        };
        if !actor.is_active {
            return Ok(AuthPayload {
                ok: false,
                user: None,
                error: Some("Account disabled".into()),
            });
        }
        let db = database(ctx)?;
        let model = app_user::Entity::find_by_id(actor.user_id)
            .one(db.as_ref())
            .await
            .map_err(db_error)?
            .ok_or_else(|| error_with_code("INTERNAL", "Failed to load user record"))?;
        let token = issue_token(&actor, &auth)
            .map_err(|_| error_with_code("INTERNAL", "Failed to issue session token"))?;
        append_session_cookie(ctx, &token, auth.session_ttl_minutes);
        Ok(AuthPayload {
            ok: true,
            user: Some(UserNode::from_model(model)),
            error: None,
        })
    }

    /// Local logout always succeeds; remote invalidation is best-effort.
    async fn logout(&self, ctx: &Context<'_>) -> async_graphql::Result<bool> {
        if let Ok(identity) = identity(ctx) {
            if let Err(error) = identity.invalidate().await {
                warn!(error = %error, "session invalidation failed; cookie cleared anyway");
            }
        }
        append_session_cookie(ctx, "", -1);
        Ok(true)
    }

    async fn create_permission(
        &self,
        ctx: &Context<'_>,
        input: NewPermissionInput,
    ) -> async_graphql::Result<PermissionNode> {
        let actor = current_actor(ctx)?;
        let engine = engine(ctx)?;
        require_resource(&engine, "permissions", &actor)?;
        let name = validate_permission_name(&input.name)?;
        let created = engine
            .create_permission(PermissionDraft {
                name,
                description: input.description,
                category: input.category,
            })
            .await
            .map_err(authz_error)?;
        Ok(PermissionNode::from_permission(created))
    }

    async fn update_permission(
        &self,
        ctx: &Context<'_>,
        input: UpdatePermissionInput,
    ) -> async_graphql::Result<PermissionNode> {
        let actor = current_actor(ctx)?;
        let engine = engine(ctx)?;
        require_resource(&engine, "permissions", &actor)?;
        let id = parse_uuid(&input.id)?;
        let name = input
            .name
            .as_deref()
            .map(validate_permission_name)
            .transpose()?;
        let updated = engine
            .update_permission(
                id,
                PermissionChanges {
                    name,
                    description: input.description,
                    category: input.category,
                },
            )
            .await
            .map_err(authz_error)?;
        Ok(PermissionNode::from_permission(updated))
    }

    /// Removes the permission and, with it, every grant row that references
    /// it, so no role keeps a capability against a deleted permission.
    async fn delete_permission(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<bool> {
        let actor = current_actor(ctx)?;
        let engine = engine(ctx)?;
        require_resource(&engine, "permissions", &actor)?;
        let id = parse_uuid(&id)?;
        engine.delete_permission(id).await.map_err(authz_error)?;
        Ok(true)
    }

    /// Toggle a single capability for a (role, permission) pair. The other
    /// three capabilities of the row are untouched.
    async fn set_capability(
        &self,
        ctx: &Context<'_>,
        role: RoleName,
        permission_id: ID,
        action: CapabilityAction,
        value: bool,
    ) -> async_graphql::Result<RolePermissionNode> {
        let actor = current_actor(ctx)?;
        let engine = engine(ctx)?;
        require_resource(&engine, "permissions", &actor)?;
        let permission_id = parse_uuid(&permission_id)?;
        let row = engine
            .set_capability(role.to_role(), permission_id, action.to_action(), value)
            .await
            .map_err(authz_error)?;
        Ok(RolePermissionNode::from_grant(row, &engine))
    }

    /// Re-fetch the catalog and matrix. Roles whose grants failed to load
    /// come back as warnings, not as an error.
    async fn reload_access(&self, ctx: &Context<'_>) -> async_graphql::Result<ReloadPayload> {
        let actor = current_actor(ctx)?;
        let engine = engine(ctx)?;
        require_resource(&engine, "permissions", &actor)?;
        let warnings = engine.load().await.map_err(authz_error)?;
        Ok(ReloadPayload {
            warnings: warnings
                .into_iter()
                .map(|w| RoleWarningNode {
                    role: RoleName::from_role(w.role),
                    message: w.error.to_string(),
                })
                .collect(),
        })
    }

    async fn create_task(
        &self,
        ctx: &Context<'_>,
        input: NewTaskInput,
    ) -> async_graphql::Result<TaskNode> {
        let actor = current_actor(ctx)?;
        let engine = engine(ctx)?;
        require_decision(&engine, "tasks", "task_management", Action::Create, &actor)?;
        let department_id = match input.department_id.as_ref().map(parse_uuid).transpose()? {
            Some(dept) => {
                if !engine.can_access_department(dept, &actor) {
                    return Err(error_with_code(
                        "RESOURCE_FORBIDDEN",
                        "Not permitted to create records for another department",
                    ));
                }
                Some(dept)
            }
            None => actor.department_id,
        };
        let db = database(ctx)?;
        let now: DateTimeWithTimeZone = Utc::now().into();
        let model = task::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(validate_title(&input.title)?),
            notes: Set(input.notes),
            status: Set(task::Status::Open),
            department_id: Set(department_id),
            due_at: Set(input.due_at.map(Into::into)),
            created_by: Set(Some(actor.user_id)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db.as_ref())
        .await
        .map_err(db_error)?;
        Ok(TaskNode::from_model(model))
    }

    /// Accounts are deactivated, never deleted.
    async fn set_user_active(
        &self,
        ctx: &Context<'_>,
        id: ID,
        is_active: bool,
    ) -> async_graphql::Result<UserNode> {
        let actor = current_actor(ctx)?;
        let engine = engine(ctx)?;
        require_resource(&engine, "users", &actor)?;
        let db = database(ctx)?;
        let user_id = parse_uuid(&id)?;
        let model = app_user::Entity::find_by_id(user_id)
            .one(db.as_ref())
            .await
            .map_err(db_error)?
            .ok_or_else(|| error_with_code("NOT_FOUND", "User not found"))?;
        let mut active: app_user::ActiveModel = model.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(db.as_ref()).await.map_err(db_error)?;
        Ok(UserNode::from_model(updated))
    }
}

fn database(ctx: &Context<'_>) -> async_graphql::Result<Arc<DatabaseConnection>> {
    ctx.data::<Arc<DatabaseConnection>>()
        .cloned()
        .map_err(|_| error_with_code("INTERNAL", "Missing database connection"))
}

fn engine(ctx: &Context<'_>) -> async_graphql::Result<Arc<AccessEngine>> {
    ctx.data::<Arc<AccessEngine>>()
        .cloned()
        .map_err(|_| error_with_code("INTERNAL", "Missing access engine"))
}

fn auth_config(ctx: &Context<'_>) -> async_graphql::Result<Arc<AuthConfig>> {
    ctx.data::<Arc<AuthConfig>>()
        .cloned()
        .map_err(|_| error_with_code("INTERNAL", "Missing auth configuration"))
}

fn identity(ctx: &Context<'_>) -> async_graphql::Result<Arc<DbIdentity>> {
    ctx.data::<Arc<DbIdentity>>()
        .cloned()
        .map_err(|_| error_with_code("INTERNAL", "Missing identity backend"))
}

fn current_actor(ctx: &Context<'_>) -> async_graphql::Result<Actor> {
    ctx.data::<Actor>()
        .cloned()
        .map_err(|_| error_with_code("UNAUTHENTICATED", "Login required"))
}

/// Coarse gate in front of a resolver. Mirrors the decision taxonomy: the
/// caller sees an explicit "not permitted", never an empty result.
fn require_resource(
    engine: &AccessEngine,
    resource: &str,
    actor: &Actor,
) -> async_graphql::Result<()> {
    if engine.can_enter(resource, actor) {
        Ok(())
    } else {
        Err(error_with_code("RESOURCE_FORBIDDEN", "Not permitted"))
    }
}

fn require_decision(
    engine: &AccessEngine,
    resource: &str,
    permission: &str,
    action: Action,
    actor: &Actor,
) -> async_graphql::Result<()> {
    match engine.decide(resource, permission, action, actor) {
        Decision::Allow => Ok(()),
        Decision::Deny(DenyReason::ResourceForbidden) => {
            Err(error_with_code("RESOURCE_FORBIDDEN", "Not permitted"))
        }
        Decision::Deny(DenyReason::CapabilityDenied) => Err(error_with_code(
            "CAPABILITY_DENIED",
            "Not permitted to perform this action",
        )),
        Decision::Deny(DenyReason::UnknownPermission) => Err(error_with_code(
            "UNKNOWN_PERMISSION",
            format!("Unknown permission \"{}\"", permission),
        )),
    }
}

fn authz_error(err: AuthzError) -> Error {
    match &err {
        AuthzError::Unavailable(_) => error_with_code("UNAVAILABLE", err.to_string()),
        AuthzError::NotFound(_) => error_with_code("NOT_FOUND", err.to_string()),
        AuthzError::DuplicateName(_) => error_with_code("VALIDATION", err.to_string()),
        AuthzError::UnknownPermission(_) => error_with_code("UNKNOWN_PERMISSION", err.to_string()),
    }
}

fn db_error(err: DbErr) -> Error {
    error_with_code("INTERNAL", format!("Database error: {}", err))
}

fn error_with_code(code: &'static str, message: impl Into<String>) -> Error {
    Error::new(message).extend_with(|_, e| e.set("code", code))
}

fn parse_uuid(id: &ID) -> async_graphql::Result<Uuid> {
    Uuid::parse_str(id.as_str()).map_err(|_| error_with_code("BAD_REQUEST", "Invalid ID"))
}

fn sanitize_optional_filter(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_permission_name(name: &str) -> async_graphql::Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.len() > 64 {
        return Err(error_with_code(
            "VALIDATION",
            "Permission name must be 1-64 characters",
        ));
    }
    Ok(trimmed.to_string())
}

fn validate_title(title: &str) -> async_graphql::Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(error_with_code("VALIDATION", "Title must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn append_session_cookie(ctx: &Context<'_>, token: &str, ttl_minutes: i64) {
    let max_age = if ttl_minutes < 0 { 0 } else { ttl_minutes * 60 };
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age
    );
    ctx.append_http_header("Set-Cookie", cookie);
}

#[derive(Debug, Clone)]
pub struct SeededStoreRecords {
    pub departments: Vec<department::Model>,
    pub users: Vec<app_user::Model>,
    pub permissions: Vec<entity::permission::Model>,
    pub tasks: Vec<task::Model>,
}

impl SeededStoreRecords {
    pub fn department_code(&self, code: &str) -> Option<&department::Model> {
        self.departments.iter().find(|d| d.code == code)
    }

    pub fn user_named(&self, username: &str) -> Option<&app_user::Model> {
        self.users.iter().find(|u| u.username == username)
    }

    pub fn permission_named(&self, name: &str) -> Option<&entity::permission::Model> {
        self.permissions.iter().find(|p| p.name == name)
    }
}

const SEED_CATALOG: &[(&str, &str, &str)] = &[
    ("employee_management", "Employee records", "people"),
    ("user_management", "User accounts", "people"),
    ("training_management", "Training records", "people"),
    ("task_management", "Tasks", "operations"),
    ("inventory_management", "Inventory requests", "operations"),
    ("equipment_management", "Equipment and repairs", "operations"),
    ("temperature_monitoring", "Temperature logs", "operations"),
    ("complaint_management", "Customer complaints", "operations"),
    ("preorder_management", "Pre-orders", "operations"),
    ("department_management", "Departments", "administration"),
    ("announcement_management", "Announcements", "administration"),
    ("permission_management", "Roles and permissions", "administration"),
];

// (permission, view, create, edit, delete) per non-admin role; admin gets
// every capability on every permission.
const MANAGER_GRANTS: &[(&str, bool, bool, bool, bool)] = &[
    ("employee_management", true, true, true, false),
    ("training_management", true, true, true, false),
    ("task_management", true, true, true, true),
    ("inventory_management", true, true, true, false),
    ("equipment_management", true, true, true, false),
    ("temperature_monitoring", true, true, false, false),
    ("complaint_management", true, true, true, false),
    ("preorder_management", true, true, true, false),
    ("department_management", true, false, false, false),
    ("announcement_management", true, true, true, false),
];

const LEAD_GRANTS: &[(&str, bool, bool, bool, bool)] = &[
    ("task_management", true, true, true, false),
    ("inventory_management", true, true, false, false),
    ("equipment_management", true, false, false, false),
    ("temperature_monitoring", true, true, false, false),
    ("complaint_management", true, false, false, false),
    ("announcement_management", true, false, false, false),
];

const STAFF_GRANTS: &[(&str, bool, bool, bool, bool)] = &[
    ("task_management", true, false, false, false),
    ("temperature_monitoring", true, true, false, false),
    ("announcement_management", true, false, false, false),
];

pub async fn seed_store_demo(db: &DatabaseConnection) -> Result<SeededStoreRecords, DbErr> {
    let seeded_at: DateTimeWithTimeZone = Utc::now().into();

    let front = insert_seed_department(db, "Front of House", "FRONT", seeded_at).await?;
    let kitchen = insert_seed_department(db, "Kitchen", "KITCH", seeded_at).await?;
    let warehouse = insert_seed_department(db, "Warehouse", "WARE", seeded_at).await?;

    let admin = insert_seed_user(
        db,
        "admin",
        "Store Admin",
        app_user::Role::Admin,
        None,
        "adminpass",
        true,
        seeded_at,
    )
    .await?;
    let manager = insert_seed_user(
        db,
        "manager1",
        "Front Manager",
        app_user::Role::Manager,
        Some(front.id),
        "managerpass",
        true,
        seeded_at,
    )
    .await?;
    let lead = insert_seed_user(
        db,
        "lead1",
        "Kitchen Lead",
        app_user::Role::Lead,
        Some(kitchen.id),
        "leadpass",
        true,
        seeded_at,
    )
    .await?;
    let staff = insert_seed_user(
        db,
        "staff1",
        "Front Staff",
        app_user::Role::Staff,
        Some(front.id),
        "staffpass",
        true,
        seeded_at,
    )
    .await?;
    let former = insert_seed_user(
        db,
        "former1",
        "Former Staff",
        app_user::Role::Staff,
        Some(front.id),
        "formerpass",
        false,
        seeded_at,
    )
    .await?;

    let mut permissions = Vec::with_capacity(SEED_CATALOG.len());
    for (name, description, category) in SEED_CATALOG {
        let model = entity::permission::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set((*name).to_string()),
            description: Set(Some((*description).to_string())),
            category: Set(Some((*category).to_string())),
            created_at: Set(seeded_at),
        }
        .insert(db)
        .await?;
        permissions.push(model);
    }

    for permission in &permissions {
        insert_seed_grant(
            db,
            app_user::Role::Admin,
            permission.id,
            (true, true, true, true),
            seeded_at,
        )
        .await?;
    }
    for (role, grants) in [
        (app_user::Role::Manager, MANAGER_GRANTS),
        (app_user::Role::Lead, LEAD_GRANTS),
        (app_user::Role::Staff, STAFF_GRANTS),
    ] {
        for (name, view, create, edit, delete) in grants {
            let permission = permissions
                .iter()
                .find(|p| p.name == *name)
                .ok_or_else(|| DbErr::Custom(format!("missing seed permission {}", name)))?;
            insert_seed_grant(db, role, permission.id, (*view, *create, *edit, *delete), seeded_at)
                .await?;
        }
    }

    let tasks = vec![
        insert_seed_task(db, "Morning till count", Some(front.id), admin.id, seeded_at).await?,
        insert_seed_task(db, "Deep clean fryers", Some(kitchen.id), manager.id, seeded_at).await?,
        insert_seed_task(db, "Cycle count aisle 3", Some(warehouse.id), admin.id, seeded_at)
            .await?,
        insert_seed_task(db, "Fire drill briefing", None, admin.id, seeded_at).await?,
    ];

    Ok(SeededStoreRecords {
        departments: vec![front, kitchen, warehouse],
        users: vec![admin, manager, lead, staff, former],
        permissions,
        tasks,
    })
}

async fn insert_seed_department(
    db: &DatabaseConnection,
    name: &str,
    code: &str,
    seeded_at: DateTimeWithTimeZone,
) -> Result<department::Model, DbErr> {
    department::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        code: Set(code.to_string()),
        description: Set(None),
        is_active: Set(true),
        created_at: Set(seeded_at),
        updated_at: Set(seeded_at),
    }
    .insert(db)
    .await
}

#[allow(clippy::too_many_arguments)]
async fn insert_seed_user(
    db: &DatabaseConnection,
    username: &str,
    display_name: &str,
    role: app_user::Role,
    department_id: Option<Uuid>,
    password: &str,
    is_active: bool,
    seeded_at: DateTimeWithTimeZone,
) -> Result<app_user::Model, DbErr> {
    app_user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        display_name: Set(display_name.to_string()),
        password_hash: Set(hash_password(password)?),
        role: Set(role),
        department_id: Set(department_id),
        employee_id: Set(None),
        is_active: Set(is_active),
        created_at: Set(seeded_at),
        updated_at: Set(seeded_at),
    }
    .insert(db)
    .await
}

async fn insert_seed_grant(
    db: &DatabaseConnection,
    role: app_user::Role,
    permission_id: Uuid,
    (can_view, can_create, can_edit, can_delete): (bool, bool, bool, bool),
    seeded_at: DateTimeWithTimeZone,
) -> Result<(), DbErr> {
    entity::role_permission::ActiveModel {
        role: Set(role),
        permission_id: Set(permission_id),
        can_view: Set(can_view),
        can_create: Set(can_create),
        can_edit: Set(can_edit),
        can_delete: Set(can_delete),
        created_at: Set(seeded_at),
    }
    .insert(db)
    .await?;
    Ok(())
}

async fn insert_seed_task(
    db: &DatabaseConnection,
    title: &str,
    department_id: Option<Uuid>,
    created_by: Uuid,
    seeded_at: DateTimeWithTimeZone,
) -> Result<task::Model, DbErr> {
    task::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title.to_string()),
        notes: Set(None),
        status: Set(task::Status::Open),
        department_id: Set(department_id),
        due_at: Set(None),
        created_by: Set(Some(created_by)),
        created_at: Set(seeded_at),
        updated_at: Set(seeded_at),
    }
    .insert(db)
    .await
}

fn hash_password(raw: &str) -> Result<String, DbErr> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(raw.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| DbErr::Custom(format!("password hash failed: {}", err)))
}
