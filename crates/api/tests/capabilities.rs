mod common;

use common::{data, error_code, setup};
use serde_json::json;

const DECIDE: &str = r#"
    query Decide($resource: String!, $permission: String!, $action: CapabilityAction!) {
        decide(resource: $resource, permission: $permission, action: $action) {
            allowed
            reason
        }
    }
"#;

#[tokio::test]
async fn staff_is_stopped_at_the_employees_screen() {
    let ctx = setup().await;
    let resp = ctx
        .exec_as(
            "staff1",
            DECIDE,
            json!({
                "resource": "employees",
                "permission": "employee_management",
                "action": "DELETE"
            }),
        )
        .await;
    let decision = data(resp);
    assert_eq!(decision["decide"]["allowed"], false);
    assert_eq!(decision["decide"]["reason"], "resource_forbidden");
}

#[tokio::test]
async fn unknown_permission_is_reported_as_such() {
    let ctx = setup().await;
    let resp = ctx
        .exec_as(
            "staff1",
            DECIDE,
            json!({
                "resource": "tasks",
                "permission": "no_such_permission",
                "action": "VIEW"
            }),
        )
        .await;
    let decision = data(resp);
    assert_eq!(decision["decide"]["allowed"], false);
    assert_eq!(decision["decide"]["reason"], "unknown_permission");
}

#[tokio::test]
async fn granting_one_capability_flips_exactly_one_flag() {
    let ctx = setup().await;

    // A fresh permission starts with no grants anywhere.
    let created = data(
        ctx.exec_as(
            "admin",
            r#"
            mutation Create($input: NewPermissionInput!) {
                createPermission(input: $input) { id name }
            }
            "#,
            json!({ "input": { "name": "reminder_management", "category": "operations" } }),
        )
        .await,
    );
    let permission_id = created["createPermission"]["id"].as_str().unwrap().to_string();

    let denied = data(
        ctx.exec_as(
            "lead1",
            DECIDE,
            json!({
                "resource": "reminders",
                "permission": "reminder_management",
                "action": "CREATE"
            }),
        )
        .await,
    );
    assert_eq!(denied["decide"]["allowed"], false);
    assert_eq!(denied["decide"]["reason"], "capability_denied");

    let toggled = data(
        ctx.exec_as(
            "admin",
            r#"
            mutation Toggle($role: RoleName!, $permissionId: ID!, $action: CapabilityAction!, $value: Boolean!) {
                setCapability(role: $role, permissionId: $permissionId, action: $action, value: $value) {
                    canView canCreate canEdit canDelete
                }
            }
            "#,
            json!({
                "role": "LEAD",
                "permissionId": permission_id,
                "action": "CREATE",
                "value": true
            }),
        )
        .await,
    );
    let row = &toggled["setCapability"];
    assert_eq!(row["canCreate"], true);
    assert_eq!(row["canView"], false);
    assert_eq!(row["canEdit"], false);
    assert_eq!(row["canDelete"], false);

    let allowed = data(
        ctx.exec_as(
            "lead1",
            DECIDE,
            json!({
                "resource": "reminders",
                "permission": "reminder_management",
                "action": "CREATE"
            }),
        )
        .await,
    );
    assert_eq!(allowed["decide"]["allowed"], true);
}

#[tokio::test]
async fn role_grants_cover_the_whole_catalog() {
    let ctx = setup().await;
    let grants = data(
        ctx.exec_as(
            "staff1",
            r#"
            query Grants($role: RoleName!) {
                roleGrants(role: $role) { permissionName canView canCreate }
            }
            "#,
            json!({ "role": "STAFF" }),
        )
        .await,
    );
    let rows = grants["roleGrants"].as_array().unwrap();
    // One row per catalog permission, explicit grant or not.
    assert_eq!(rows.len(), ctx.seeded.permissions.len());
    let temp = rows
        .iter()
        .find(|g| g["permissionName"] == "temperature_monitoring")
        .unwrap();
    assert_eq!(temp["canCreate"], true);
    let employees = rows
        .iter()
        .find(|g| g["permissionName"] == "employee_management")
        .unwrap();
    assert_eq!(employees["canView"], false);
    assert_eq!(employees["canCreate"], false);
}

#[tokio::test]
async fn inspecting_another_roles_grants_requires_the_permissions_screen() {
    let ctx = setup().await;
    let resp = ctx
        .exec_as(
            "staff1",
            r#"query Grants($role: RoleName!) { roleGrants(role: $role) { canView } }"#,
            json!({ "role": "MANAGER" }),
        )
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("RESOURCE_FORBIDDEN"));
}

#[tokio::test]
async fn reload_reports_no_warnings_on_a_healthy_store() {
    let ctx = setup().await;
    let payload = data(
        ctx.exec_as(
            "admin",
            r#"mutation { reloadAccess { warnings { role message } } }"#,
            json!({}),
        )
        .await,
    );
    assert_eq!(payload["reloadAccess"]["warnings"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn role_matrix_lists_every_role() {
    let ctx = setup().await;
    let matrix = data(
        ctx.exec_as(
            "admin",
            r#"query { roleMatrix { role grants { permissionName canDelete } } }"#,
            json!({}),
        )
        .await,
    );
    let roles: Vec<&str> = matrix["roleMatrix"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["role"].as_str().unwrap())
        .collect();
    assert_eq!(roles, ["ADMIN", "MANAGER", "LEAD", "STAFF"]);
    let admin_grants = &matrix["roleMatrix"][0]["grants"];
    assert!(admin_grants
        .as_array()
        .unwrap()
        .iter()
        .all(|g| g["canDelete"] == true));
}
