mod common;

use common::{data, error_code, setup};
use serde_json::json;

const CREATE: &str = r#"
    mutation Create($input: NewPermissionInput!) {
        createPermission(input: $input) { id name description category }
    }
"#;

const LIST: &str = r#"
    query List($q: String) {
        permissions(q: $q) { id name category }
    }
"#;

#[tokio::test]
async fn admin_creates_and_lists_permissions() {
    let ctx = setup().await;
    let resp = ctx
        .exec_as(
            "admin",
            CREATE,
            json!({ "input": {
                "name": "reminder_management",
                "description": "Scheduled reminders",
                "category": "operations"
            }}),
        )
        .await;
    let created = data(resp);
    assert_eq!(created["createPermission"]["name"], "reminder_management");

    let resp = ctx
        .exec_as("admin", LIST, json!({ "q": "reminder" }))
        .await;
    let listed = data(resp);
    let names: Vec<&str> = listed["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["reminder_management"]);
}

#[tokio::test]
async fn duplicate_names_are_rejected() {
    let ctx = setup().await;
    let resp = ctx
        .exec_as(
            "admin",
            CREATE,
            json!({ "input": { "name": "task_management" } }),
        )
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("VALIDATION"));
}

#[tokio::test]
async fn permissions_screen_is_admin_only() {
    let ctx = setup().await;
    for username in ["manager1", "lead1", "staff1"] {
        let resp = ctx.exec_as(username, LIST, json!({})).await;
        assert_eq!(
            error_code(&resp).as_deref(),
            Some("RESOURCE_FORBIDDEN"),
            "{} should not list permissions",
            username
        );
    }
    let resp = ctx
        .exec_as(
            "staff1",
            CREATE,
            json!({ "input": { "name": "sneaky_permission" } }),
        )
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("RESOURCE_FORBIDDEN"));
}

#[tokio::test]
async fn update_changes_only_named_fields() {
    let ctx = setup().await;
    let id = ctx
        .seeded
        .permission_named("preorder_management")
        .unwrap()
        .id
        .to_string();
    let resp = ctx
        .exec_as(
            "admin",
            r#"
            mutation Update($input: UpdatePermissionInput!) {
                updatePermission(input: $input) { name description category }
            }
            "#,
            json!({ "input": { "id": id, "description": "Customer pre-orders" } }),
        )
        .await;
    let updated = data(resp);
    assert_eq!(
        updated["updatePermission"]["description"],
        "Customer pre-orders"
    );
    assert_eq!(updated["updatePermission"]["name"], "preorder_management");
    assert_eq!(updated["updatePermission"]["category"], "operations");
}

#[tokio::test]
async fn deleting_a_permission_removes_every_grant_row() {
    let ctx = setup().await;
    let id = ctx
        .seeded
        .permission_named("task_management")
        .unwrap()
        .id
        .to_string();

    let grants = r#"
        query Grants($role: RoleName!) {
            roleGrants(role: $role) { permissionName canView }
        }
    "#;
    let before = data(ctx.exec_as("admin", grants, json!({ "role": "MANAGER" })).await);
    assert!(before["roleGrants"]
        .as_array()
        .unwrap()
        .iter()
        .any(|g| g["permissionName"] == "task_management"));

    let resp = ctx
        .exec_as(
            "admin",
            r#"mutation Delete($id: ID!) { deletePermission(id: $id) }"#,
            json!({ "id": id }),
        )
        .await;
    assert_eq!(data(resp)["deletePermission"], true);

    for role in ["ADMIN", "MANAGER", "LEAD", "STAFF"] {
        let after = data(ctx.exec_as("admin", grants, json!({ "role": role })).await);
        assert!(
            !after["roleGrants"]
                .as_array()
                .unwrap()
                .iter()
                .any(|g| g["permissionName"] == "task_management"),
            "{} still has a task_management row",
            role
        );
    }
}

#[tokio::test]
async fn deleting_twice_reports_not_found() {
    let ctx = setup().await;
    let id = ctx
        .seeded
        .permission_named("training_management")
        .unwrap()
        .id
        .to_string();
    let delete = r#"mutation Delete($id: ID!) { deletePermission(id: $id) }"#;
    data(ctx.exec_as("admin", delete, json!({ "id": id })).await);
    let resp = ctx.exec_as("admin", delete, json!({ "id": id })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("NOT_FOUND"));
}
