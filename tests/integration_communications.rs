mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_test_user, get_request, insert_communication, json_request,
    setup_test_app,
};
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;

fn titles(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap().to_string())
        .collect()
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_office_member_creates_communication(pool: PgPool) {
    let office = create_test_user(&pool, "password123", Some("office_member"), true).await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/communications",
            Some(&office.token(&["office_member"])),
            json!({
                "type": "announcement",
                "title": "  Sports day  ",
                "content": "Bring water.",
                "targetAudience": "parents",
                "status": "published"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["title"], "Sports day");
    assert_eq!(body["data"]["type"], "announcement");
    assert_eq!(body["data"]["priority"], "medium");
    assert_eq!(body["data"]["boardType"], "general");
    assert!(body["data"]["publishedAt"].is_string());
    assert_eq!(body["data"]["authorId"], office.id.to_string());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_create_without_title_is_bad_request(pool: PgPool) {
    let office = create_test_user(&pool, "password123", Some("office_member"), true).await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/communications",
            Some(&office.token(&["office_member"])),
            json!({ "type": "reminder", "content": "No title here" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "title is required");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_parent_cannot_create(pool: PgPool) {
    let parent = create_test_user(&pool, "password123", Some("parent"), true).await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/communications",
            Some(&parent.token(&["parent"])),
            json!({ "type": "message", "title": "Hi", "content": "Hello" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_parent_sees_only_published_matching_audience(pool: PgPool) {
    insert_communication(&pool, "announcement", "For everyone", "published", "all").await;
    insert_communication(&pool, "announcement", "For parents", "published", "parents").await;
    insert_communication(&pool, "announcement", "For teachers", "published", "teachers").await;
    insert_communication(&pool, "announcement", "Draft for parents", "draft", "parents").await;
    let parent = create_test_user(&pool, "password123", Some("parent"), true).await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(get_request(
            "/api/v1/communications?sortBy=title&sortOrder=asc&status=draft",
            Some(&parent.token(&["parent"])),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(titles(&body), vec!["For everyone", "For parents"]);
    assert_eq!(body["pagination"]["total"], 2);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_office_member_sees_drafts(pool: PgPool) {
    insert_communication(&pool, "newsletter", "Draft issue", "draft", "all").await;
    insert_communication(&pool, "newsletter", "Live issue", "published", "all").await;
    let office = create_test_user(&pool, "password123", Some("office_member"), true).await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(get_request(
            "/api/v1/communications?type=newsletter&status=draft",
            Some(&office.token(&["office_member"])),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(titles(&body), vec!["Draft issue"]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_pagination_second_page(pool: PgPool) {
    for i in 0..5 {
        insert_communication(&pool, "message", &format!("Message {i}"), "published", "all")
            .await;
    }
    let teacher = create_test_user(&pool, "password123", Some("teacher"), true).await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(get_request(
            "/api/v1/communications?page=2&limit=2&sortBy=title&sortOrder=asc",
            Some(&teacher.token(&["teacher"])),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(titles(&body), vec!["Message 2", "Message 3"]);
    assert_eq!(body["pagination"]["page"], 2);
    assert_eq!(body["pagination"]["total"], 5);
    assert_eq!(body["pagination"]["totalPages"], 3);
    assert_eq!(body["pagination"]["hasNext"], true);
    assert_eq!(body["pagination"]["hasPrev"], true);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_malformed_filters_are_ignored(pool: PgPool) {
    insert_communication(&pool, "reminder", "Reminder", "published", "all").await;
    let teacher = create_test_user(&pool, "password123", Some("teacher"), true).await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(get_request(
            "/api/v1/communications?type=bogus&page=abc&limit=-4&isPinned=maybe&sortBy=nope",
            Some(&teacher.token(&["teacher"])),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(titles(&body), vec!["Reminder"]);
    assert_eq!(body["pagination"]["page"], 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_hidden_record_is_not_found_for_parent(pool: PgPool) {
    let id = insert_communication(&pool, "message", "Staff only", "published", "staff").await;
    let parent = create_test_user(&pool, "password123", Some("parent"), true).await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(get_request(
            &format!("/api/v1/communications/{id}"),
            Some(&parent.token(&["parent"])),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_patch_then_delete(pool: PgPool) {
    let id = insert_communication(&pool, "announcement", "Old title", "draft", "all").await;
    let admin = create_test_user(&pool, "password123", Some("admin"), true).await;
    let token = admin.token(&["admin"]);
    let app = setup_test_app(pool);
    let uri = format!("/api/v1/communications/{id}");

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &uri,
            Some(&token),
            json!({ "title": "New title", "isPinned": true }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["title"], "New title");
    assert_eq!(body["data"]["isPinned"], true);
    assert_eq!(body["data"]["content"], "Body text");

    let response = app
        .clone()
        .oneshot(json_request("DELETE", &uri, Some(&token), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request("DELETE", &uri, Some(&token), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_malformed_id_is_bad_request(pool: PgPool) {
    let teacher = create_test_user(&pool, "password123", Some("teacher"), true).await;
    let app = setup_test_app(pool);

    let response = app
        .oneshot(get_request(
            "/api/v1/communications/not-a-uuid",
            Some(&teacher.token(&["teacher"])),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
