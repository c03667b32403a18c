use std::sync::Arc;

use api::auth::AuthConfig;
use api::schema::{build_schema, seed_store_demo, AppSchema, SeededStoreRecords};
use api::store::{actor_from_user, DbAccessStore, DbIdentity};
use async_graphql::{Request, Response, Schema, Variables};
use authz::{AccessEngine, Actor, ResourceMap};
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};
use serde_json::Value;

pub struct TestContext {
    pub schema: Schema<
        api::schema::QueryRoot,
        api::schema::MutationRoot,
        async_graphql::EmptySubscription,
    >,
    pub db: Arc<DatabaseConnection>,
    pub engine: Arc<AccessEngine>,
    pub seeded: SeededStoreRecords,
}

pub async fn setup() -> TestContext {
    let conn = Database::connect("sqlite::memory:").await.unwrap();
    bootstrap_sqlite(&conn).await;
    let seeded = seed_store_demo(&conn).await.unwrap();
    let db = Arc::new(conn);
    let engine = Arc::new(AccessEngine::new(
        Arc::new(DbAccessStore::new(db.clone())),
        ResourceMap::standard(),
    ));
    let warnings = engine.load().await.unwrap();
    assert!(warnings.is_empty(), "unexpected load warnings: {:?}", warnings);
    let identity = Arc::new(DbIdentity::new(db.clone()));
    let auth = Arc::new(AuthConfig {
        jwt_secret: "test-secret".into(),
        session_ttl_minutes: 30,
    });
    let AppSchema(schema) = build_schema(db.clone(), engine.clone(), identity, auth);
    TestContext {
        schema,
        db,
        engine,
        seeded,
    }
}

impl TestContext {
    pub fn actor_named(&self, username: &str) -> Actor {
        actor_from_user(self.seeded.user_named(username).expect("seeded user"))
    }

    pub async fn exec_as(&self, username: &str, query: &str, vars: Value) -> Response {
        let request = Request::new(query)
            .variables(Variables::from_json(vars))
            .data(self.actor_named(username));
        self.schema.execute(request).await
    }

    pub async fn exec_anonymous(&self, query: &str, vars: Value) -> Response {
        self.schema
            .execute(Request::new(query).variables(Variables::from_json(vars)))
            .await
    }
}

/// First error's `code` extension, the way the UI reads deny reasons.
pub fn error_code(resp: &Response) -> Option<String> {
    let errors = serde_json::to_value(&resp.errors).unwrap();
    errors
        .get(0)?
        .get("extensions")?
        .get("code")?
        .as_str()
        .map(str::to_string)
}

pub fn data(resp: Response) -> Value {
    assert!(
        resp.errors.is_empty(),
        "unexpected errors: {:?}",
        resp.errors
    );
    resp.data.into_json().unwrap()
}

async fn bootstrap_sqlite(db: &DatabaseConnection) {
    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        "PRAGMA foreign_keys = ON;",
    ))
    .await
    .unwrap();

    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        r#"
        CREATE TABLE department (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            code TEXT NOT NULL UNIQUE,
            description TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    ))
    .await
    .unwrap();

    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        r#"
        CREATE TABLE app_user (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('ADMIN','MANAGER','LEAD','STAFF')),
            department_id TEXT,
            employee_id TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(department_id) REFERENCES department(id) ON DELETE SET NULL
        );
        "#,
    ))
    .await
    .unwrap();

    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        r#"
        CREATE TABLE permission (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            category TEXT,
            created_at TEXT NOT NULL
        );
        "#,
    ))
    .await
    .unwrap();

    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        r#"
        CREATE TABLE role_permission (
            role TEXT NOT NULL CHECK (role IN ('ADMIN','MANAGER','LEAD','STAFF')),
            permission_id TEXT NOT NULL,
            can_view INTEGER NOT NULL DEFAULT 0,
            can_create INTEGER NOT NULL DEFAULT 0,
            can_edit INTEGER NOT NULL DEFAULT 0,
            can_delete INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            UNIQUE(role, permission_id),
            FOREIGN KEY(permission_id) REFERENCES permission(id) ON DELETE CASCADE
        );
        "#,
    ))
    .await
    .unwrap();

    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        r#"
        CREATE TABLE task (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            notes TEXT,
            status TEXT NOT NULL DEFAULT 'OPEN',
            department_id TEXT,
            due_at TEXT,
            created_by TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(department_id) REFERENCES department(id) ON DELETE SET NULL,
            FOREIGN KEY(created_by) REFERENCES app_user(id) ON DELETE SET NULL
        );
        "#,
    ))
    .await
    .unwrap();
}
