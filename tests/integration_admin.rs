mod common;

use axum::http::StatusCode;
use common::{body_json, create_test_user, get_request, json_request, setup_test_app};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

async fn count_for_user(pool: &PgPool, table: &str, user_id: Uuid) -> i64 {
    let column = if table == "users" { "id" } else { "user_id" };
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table} WHERE {column} = $1"))
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn is_active(pool: &PgPool, user_id: Uuid) -> bool {
    sqlx::query_scalar("SELECT is_active FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_admin_approves_pending_user(pool: PgPool) {
    let admin = create_test_user(&pool, "password123", Some("admin"), true).await;
    let pending = create_test_user(&pool, "password123", None, false).await;
    let app = setup_test_app(pool);
    let token = admin.token(&["admin"]);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/admin/users/{}/approve", pending.id),
            Some(&token),
            json!({ "role": "parent" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["isActive"], true);
    assert_eq!(body["data"]["roles"], json!(["parent"]));

    let again = app
        .oneshot(json_request(
            "POST",
            &format!("/api/admin/users/{}/approve", pending.id),
            Some(&token),
            json!({ "role": "parent" }),
        ))
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_admin_rejects_pending_user(pool: PgPool) {
    let admin = create_test_user(&pool, "password123", Some("admin"), true).await;
    let pending = create_test_user(&pool, "password123", None, false).await;
    sqlx::query(
        "INSERT INTO accounts (user_id, provider, provider_account_id) VALUES ($1, 'google', $2)",
    )
    .bind(pending.id)
    .bind(pending.id.to_string())
    .execute(&pool)
    .await
    .unwrap();
    let app = setup_test_app(pool.clone());

    let response = app
        .oneshot(json_request(
            "DELETE",
            &format!("/api/admin/users/{}/reject", pending.id),
            Some(&admin.token(&["admin"])),
            json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["email"], pending.email);

    assert_eq!(count_for_user(&pool, "users", pending.id).await, 0);
    assert_eq!(count_for_user(&pool, "accounts", pending.id).await, 0);
    assert_eq!(count_for_user(&pool, "user_roles", pending.id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_reject_active_user_is_bad_request(pool: PgPool) {
    let admin = create_test_user(&pool, "password123", Some("admin"), true).await;
    let active = create_test_user(&pool, "password123", Some("teacher"), true).await;
    let app = setup_test_app(pool.clone());

    let response = app
        .oneshot(json_request(
            "DELETE",
            &format!("/api/admin/users/{}/reject", active.id),
            Some(&admin.token(&["admin"])),
            json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(count_for_user(&pool, "users", active.id).await, 1);
    assert_eq!(count_for_user(&pool, "user_roles", active.id).await, 1);
    assert!(is_active(&pool, active.id).await);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_reject_inactive_user_with_role_is_bad_request(pool: PgPool) {
    let admin = create_test_user(&pool, "password123", Some("admin"), true).await;
    let pending = create_test_user(&pool, "password123", Some("parent"), false).await;
    let app = setup_test_app(pool.clone());

    let response = app
        .oneshot(json_request(
            "DELETE",
            &format!("/api/admin/users/{}/reject", pending.id),
            Some(&admin.token(&["admin"])),
            json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);

    assert_eq!(count_for_user(&pool, "users", pending.id).await, 1);
    assert_eq!(count_for_user(&pool, "user_roles", pending.id).await, 1);
    assert!(!is_active(&pool, pending.id).await);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_stale_admin_claim_is_not_trusted(pool: PgPool) {
    // The token says admin; the database says parent.
    let parent = create_test_user(&pool, "password123", Some("parent"), true).await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(get_request("/api/admin/users", Some(&parent.token(&["admin"]))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_pending_filter_lists_inactive_users(pool: PgPool) {
    let admin = create_test_user(&pool, "password123", Some("admin"), true).await;
    let pending = create_test_user(&pool, "password123", None, false).await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(get_request(
            "/api/admin/users?status=pending",
            Some(&admin.token(&["admin"])),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let emails: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["email"].as_str().unwrap())
        .collect();
    assert_eq!(emails, vec![pending.email.as_str()]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_upgrade_request_flow(pool: PgPool) {
    let admin = create_test_user(&pool, "password123", Some("admin"), true).await;
    let parent = create_test_user(&pool, "password123", Some("parent"), true).await;
    let app = setup_test_app(pool.clone());
    let parent_token = parent.token(&["parent"]);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/permission-upgrade-requests",
            Some(&parent_token),
            json!({ "requestedRole": "teacher", "reason": "I teach year 4" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let request_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["status"], "pending");

    let duplicate = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/permission-upgrade-requests",
            Some(&parent_token),
            json!({ "requestedRole": "teacher", "reason": "Again" }),
        ))
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let approved = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/admin/permission-upgrade-requests/{request_id}/approve"),
            Some(&admin.token(&["admin"])),
            json!({ "note": "Welcome" }),
        ))
        .await
        .unwrap();
    assert_eq!(approved.status(), StatusCode::OK);
    let body = body_json(approved).await;
    assert_eq!(body["data"]["status"], "approved");

    let roles: Vec<String> = sqlx::query_scalar(
        "SELECT r.name FROM user_roles ur JOIN roles r ON r.id = ur.role_id WHERE ur.user_id = $1 ORDER BY r.name",
    )
    .bind(parent.id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(roles, vec!["parent".to_string(), "teacher".to_string()]);

    let second_review = app
        .oneshot(json_request(
            "POST",
            &format!("/api/admin/permission-upgrade-requests/{request_id}/reject"),
            Some(&admin.token(&["admin"])),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(second_review.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_settings_upsert_and_public_info(pool: PgPool) {
    let admin = create_test_user(&pool, "password123", Some("admin"), true).await;
    let app = setup_test_app(pool);
    let token = admin.token(&["admin"]);

    for (key, value, is_public) in [
        ("school.name", "Hillside Primary", true),
        ("smtp.password", "hunter2", false),
    ] {
        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/admin/settings/{key}"),
                Some(&token),
                json!({ "value": value, "isPublic": is_public }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(get_request("/api/public/info", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cache = response.headers()["cache-control"].to_str().unwrap().to_string();
    assert!(cache.contains("s-maxage=3600"));
    let body = body_json(response).await;
    assert_eq!(body["data"], json!({ "school.name": "Hillside Primary" }));

    let bad_key = app
        .oneshot(json_request(
            "PUT",
            "/api/admin/settings/Bad%20Key",
            Some(&token),
            json!({ "value": "x" }),
        ))
        .await
        .unwrap();
    assert_eq!(bad_key.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_notification_preferences_default_update_reset(pool: PgPool) {
    let parent = create_test_user(&pool, "password123", Some("parent"), true).await;
    let app = setup_test_app(pool);
    let token = parent.token(&["parent"]);

    let response = app
        .clone()
        .oneshot(get_request("/api/notifications/preferences", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["emailEnabled"], true);
    assert!(body["data"]["updatedAt"].is_null());

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/notifications/preferences",
            Some(&token),
            json!({ "emailEnabled": false, "digestFrequency": "weekly" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["emailEnabled"], false);
    assert_eq!(body["data"]["digestFrequency"], "weekly");
    assert!(body["data"]["updatedAt"].is_string());

    let response = app
        .oneshot(json_request(
            "DELETE",
            "/api/notifications/preferences",
            Some(&token),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["emailEnabled"], true);
}
