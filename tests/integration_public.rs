mod common;

use axum::http::{StatusCode, header};
use common::{body_json, get_request, insert_communication, setup_test_app};
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

fn titles(body: &Value) -> Vec<&str> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap())
        .collect()
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_public_announcements_filter_and_cache(pool: PgPool) {
    insert_communication(&pool, "announcement", "Open day", "published", "all").await;
    insert_communication(&pool, "announcement", "Parents evening", "published", "parents").await;
    insert_communication(&pool, "announcement", "Staff meeting", "published", "staff").await;
    insert_communication(&pool, "announcement", "Unfinished", "draft", "all").await;
    insert_communication(&pool, "reminder", "Bring coats", "published", "all").await;
    let expired = insert_communication(&pool, "announcement", "Old news", "published", "all").await;
    sqlx::query("UPDATE communications SET expires_at = NOW() - INTERVAL '1 second' WHERE id = $1")
        .bind(expired)
        .execute(&pool)
        .await
        .unwrap();
    let pinned = insert_communication(&pool, "announcement", "Pinned", "published", "all").await;
    sqlx::query("UPDATE communications SET is_pinned = TRUE WHERE id = $1")
        .bind(pinned)
        .execute(&pool)
        .await
        .unwrap();

    let app = setup_test_app(pool);
    let response = app
        .oneshot(get_request("/api/public/announcements", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "public, max-age=0, s-maxage=60, stale-while-revalidate=300"
    );

    let body = body_json(response).await;
    let titles = titles(&body);
    assert_eq!(titles[0], "Pinned");
    let mut rest = titles[1..].to_vec();
    rest.sort_unstable();
    assert_eq!(rest, vec!["Open day", "Parents evening"]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_public_announcements_limit_is_clamped(pool: PgPool) {
    for i in 0..3 {
        insert_communication(&pool, "announcement", &format!("News {i}"), "published", "all")
            .await;
    }
    let app = setup_test_app(pool);

    let response = app
        .clone()
        .oneshot(get_request("/api/public/announcements?limit=1", None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let response = app
        .oneshot(get_request("/api/public/announcements?limit=oops", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_carousel_empty(pool: PgPool) {
    let app = setup_test_app(pool);

    let response = app
        .oneshot(get_request("/api/parents-corner/carousel", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}
