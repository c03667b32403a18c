mod common;

use api::auth::SESSION_COOKIE;
use common::{data, error_code, setup};
use serde_json::json;

const LOGIN: &str = r#"
    mutation Login($username: String!, $password: String!) {
        login(username: $username, password: $password) {
            ok
            user { username role departmentId }
            error
        }
    }
"#;

#[tokio::test]
async fn login_issues_a_session_cookie() {
    let ctx = setup().await;
    let resp = ctx
        .exec_anonymous(
            LOGIN,
            json!({ "username": "staff1", "password": "staffpass" }),
        )
        .await;
    let cookie = resp
        .http_headers
        .get("set-cookie")
        .expect("session cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with(SESSION_COOKIE));
    assert!(cookie.contains("HttpOnly"));

    let payload = data(resp);
    assert_eq!(payload["login"]["ok"], true);
    assert_eq!(payload["login"]["user"]["username"], "staff1");
    assert_eq!(payload["login"]["user"]["role"], "STAFF");
}

#[tokio::test]
async fn wrong_password_is_a_payload_error_not_an_exception() {
    let ctx = setup().await;
    let payload = data(
        ctx.exec_anonymous(
            LOGIN,
            json!({ "username": "staff1", "password": "nope" }),
        )
        .await,
    );
    assert_eq!(payload["login"]["ok"], false);
    assert_eq!(payload["login"]["error"], "Invalid credentials");
}

#[tokio::test]
async fn unknown_users_and_disabled_accounts_cannot_log_in() {
    let ctx = setup().await;
    let payload = data(
        ctx.exec_anonymous(
            LOGIN,
            json!({ "username": "ghost", "password": "whatever" }),
        )
        .await,
    );
    assert_eq!(payload["login"]["ok"], false);

    let payload = data(
        ctx.exec_anonymous(
            LOGIN,
            json!({ "username": "former1", "password": "formerpass" }),
        )
        .await,
    );
    assert_eq!(payload["login"]["ok"], false);
    assert_eq!(payload["login"]["error"], "Account disabled");
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let ctx = setup().await;
    let resp = ctx
        .exec_as("staff1", r#"mutation { logout }"#, json!({}))
        .await;
    let cookie = resp
        .http_headers
        .get("set-cookie")
        .expect("clearing cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.contains("Max-Age=0"));
    assert_eq!(data(resp)["logout"], true);
}

#[tokio::test]
async fn me_reflects_the_current_actor() {
    let ctx = setup().await;
    let front = ctx.seeded.department_code("FRONT").unwrap().id.to_string();
    let me = data(
        ctx.exec_as(
            "manager1",
            r#"query { me { user { username } role departmentId } }"#,
            json!({}),
        )
        .await,
    );
    assert_eq!(me["me"]["user"]["username"], "manager1");
    assert_eq!(me["me"]["role"], "MANAGER");
    assert_eq!(me["me"]["departmentId"], front.as_str());
}

#[tokio::test]
async fn anonymous_requests_are_rejected() {
    let ctx = setup().await;
    let resp = ctx
        .exec_anonymous(r#"query { me { role } }"#, json!({}))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("UNAUTHENTICATED"));
}

#[tokio::test]
async fn user_administration_is_admin_only() {
    let ctx = setup().await;
    let resp = ctx
        .exec_as("manager1", r#"query { users { username } }"#, json!({}))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("RESOURCE_FORBIDDEN"));

    let listed = data(
        ctx.exec_as("admin", r#"query { users { username isActive } }"#, json!({}))
            .await,
    );
    assert_eq!(listed["users"].as_array().unwrap().len(), 5);

    let former = ctx.seeded.user_named("former1").unwrap().id.to_string();
    let updated = data(
        ctx.exec_as(
            "admin",
            r#"
            mutation Reactivate($id: ID!) {
                setUserActive(id: $id, isActive: true) { username isActive }
            }
            "#,
            json!({ "id": former }),
        )
        .await,
    );
    assert_eq!(updated["setUserActive"]["isActive"], true);
}
