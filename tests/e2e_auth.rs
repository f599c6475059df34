//! E2E tests for registration, login, and token enforcement

mod common;

use common::TestServer;
use gatehouse::data::{UserPatch, UserStore};

#[tokio::test]
async fn test_register_and_login() {
    let server = TestServer::new().await;

    let response = server
        .register("alice", "alice@example.com", "hunter2-hunter2")
        .await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["disabled"], false);

    let token = server.login("alice", "hunter2-hunter2").await;

    let response = server
        .client
        .get(server.url("/api/v1/users/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["username"], "alice");
}

#[tokio::test]
async fn test_register_conflicts_username_first() {
    let server = TestServer::new().await;

    let response = server
        .register("alice", "alice@example.com", "hunter2-hunter2")
        .await;
    assert_eq!(response.status(), 200);

    // Conflicting on both fields reports the username
    let response = server
        .register("alice", "alice@example.com", "hunter2-hunter2")
        .await;
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Username already registered");

    let response = server
        .register("bob", "alice@example.com", "hunter2-hunter2")
        .await;
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Email already registered");
}

#[tokio::test]
async fn test_login_wrong_password() {
    let server = TestServer::new().await;

    server
        .register("alice", "alice@example.com", "hunter2-hunter2")
        .await;

    let response = server
        .client
        .post(server.url("/auth/token"))
        .form(&[("username", "alice"), ("password", "wrong-password")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    assert_eq!(
        response.headers().get("www-authenticate").unwrap(),
        "Bearer"
    );

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Incorrect username or password");
}

#[tokio::test]
async fn test_protected_routes_reject_bad_tokens() {
    let server = TestServer::new().await;

    // No token
    let response = server
        .client
        .get(server.url("/api/v1/users/me"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    assert_eq!(
        response.headers().get("www-authenticate").unwrap(),
        "Bearer"
    );

    // Garbage token
    let response = server
        .client
        .get(server.url("/api/v1/users/me"))
        .bearer_auth("not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_valid_token_for_disabled_account_is_rejected() {
    let server = TestServer::new().await;

    server
        .register("alice", "alice@example.com", "hunter2-hunter2")
        .await;
    let token = server.login("alice", "hunter2-hunter2").await;

    // Disable the account after the token was issued
    let updated = server
        .state
        .store
        .update(
            "alice",
            UserPatch {
                disabled: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(updated);

    let response = server
        .client
        .get(server.url("/api/v1/users/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Inactive user");
}

#[tokio::test]
async fn test_auth_routes_are_rate_limited() {
    let server = TestServer::with_config(|config| {
        config.rate_limit.auth_per_minute = 3;
    })
    .await;

    for _ in 0..3 {
        let response = server
            .client
            .post(server.url("/auth/token"))
            .form(&[("username", "nobody"), ("password", "irrelevant")])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 401);
    }

    let response = server
        .client
        .post(server.url("/auth/token"))
        .form(&[("username", "nobody"), ("password", "irrelevant")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 429);
}
