mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use common::{
    body_json, create_test_user, generate_unique_email, get_request, json_request,
    refresh_token_for, set_cookies, setup_test_app,
};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_login_success_sets_cookies(pool: PgPool) {
    let user = create_test_user(&pool, "testpass123", Some("parent"), true).await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": user.email, "password": user.password }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("auth-token=")));
    assert!(cookies.iter().any(|c| c.starts_with("refresh-token=")));
    assert!(cookies.iter().all(|c| c.contains("HttpOnly")));

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["email"], user.email);
    assert_eq!(body["data"]["roles"], json!(["parent"]));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_login_wrong_password(pool: PgPool) {
    let user = create_test_user(&pool, "testpass123", Some("parent"), true).await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": user.email, "password": "wrongpass" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_login_unknown_email(pool: PgPool) {
    let app = setup_test_app(pool);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "nobody@test.com", "password": "whatever1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_login_pending_account_is_forbidden(pool: PgPool) {
    let user = create_test_user(&pool, "testpass123", None, false).await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": user.email, "password": user.password }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_register_creates_pending_user(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let email = generate_unique_email();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({
                "email": email,
                "password": "password123",
                "firstName": "Ada",
                "lastName": "Parent"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["isActive"], false);

    let duplicate = app
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({
                "email": email,
                "password": "password123",
                "firstName": "Ada",
                "lastName": "Parent"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_refresh_rotates_session(pool: PgPool) {
    let user = create_test_user(&pool, "testpass123", Some("teacher"), true).await;
    let refresh = refresh_token_for(user.id, &user.email);
    let app = setup_test_app(pool);

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/refresh")
        .header(header::COOKIE, format!("refresh-token={refresh}"))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("auth-token=")));
    assert!(cookies.iter().any(|c| c.starts_with("refresh-token=")));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_refresh_for_deactivated_user_is_unauthorized(pool: PgPool) {
    let user = create_test_user(&pool, "testpass123", Some("teacher"), false).await;
    let refresh = refresh_token_for(user.id, &user.email);
    let app = setup_test_app(pool);

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/refresh")
        .header(header::COOKIE, format!("refresh-token={refresh}"))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_me_returns_current_roles(pool: PgPool) {
    let user = create_test_user(&pool, "testpass123", Some("office_member"), true).await;
    // Token claims are stale on purpose; `me` reads roles from the database.
    let token = user.token(&[]);
    let app = setup_test_app(pool);

    let response = app
        .oneshot(get_request("/api/auth/me", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["roles"], json!(["office_member"]));
}
