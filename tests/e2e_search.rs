//! E2E tests for account search

mod common;

use std::sync::atomic::Ordering;

use common::*;
use serde_json::{Value, json};

#[tokio::test]
async fn test_search_returns_accounts() {
    let server = TestServer::new().await;
    let token = server.sign_in().await;

    let response = server.get_authed("/api/search?query=%20kratos%20", &token).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();

    // Results without social metadata are skipped
    assert_eq!(
        body,
        json!([{
            "accountId": OTHER_ACCOUNT_ID,
            "onlineId": "kratos_fan",
            "avatarUrl": "https://img.example.com/fan.png"
        }])
    );
}

#[tokio::test]
async fn test_search_query_bounds() {
    let server = TestServer::new().await;
    let token = server.sign_in().await;

    let too_long = "a".repeat(65);
    for path in [
        "/api/search".to_string(),
        "/api/search?query=".to_string(),
        "/api/search?query=%20%20".to_string(),
        format!("/api/search?query={too_long}"),
    ] {
        let response = server.get_authed(&path, &token).await;
        assert_eq!(response.status(), 400, "{path}");
    }
    assert_eq!(server.upstream.calls.search.load(Ordering::SeqCst), 0);

    let longest = "a".repeat(64);
    let response = server
        .get_authed(&format!("/api/search?query={longest}"), &token)
        .await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_search_requires_session() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/api/search?query=kratos"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}
