//! E2E tests for health and metrics endpoints

mod common;

use chrono::Utc;
use common::TestServer;
use serde_json::{Value, json};
use sulabh_auth::auth::password;
use sulabh_auth::data::{EntityId, User};

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);

    let json: Value = response.json().await.unwrap();
    assert_eq!(json["status"], "OK");
    assert_eq!(json["database"], "connected");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/no/such/route"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_metrics_requires_auth() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/metrics"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_metrics_rejects_citizen_role() {
    let server = TestServer::new().await;
    server
        .register_user("citizen@example.com", "citizen1", "password123")
        .await;

    let response = server
        .login_with(&server.client, "citizen1", "password123", false)
        .await;
    assert_eq!(response.status(), 200);

    let response = server
        .client
        .get(server.url("/metrics"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_metrics_allows_admin_role() {
    let server = TestServer::new().await;
    create_admin(&server, "admin@example.com", "admin1", "password123").await;

    let response = server
        .login_with(&server.client, "admin1", "password123", false)
        .await;
    assert_eq!(response.status(), 200);

    let response = server
        .client
        .get(server.url("/metrics"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_register_does_not_grant_admin() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/auth/register"))
        .json(&json!({
            "email": "sneaky@example.com",
            "username": "sneaky",
            "password": "password123",
            "firstName": "Sneaky",
            "lastName": "User",
            "role": "admin",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let json: Value = response.json().await.unwrap();
    assert_eq!(json["user"]["role"], "citizen");
}

/// Insert an admin account directly; registration never grants elevated roles
async fn create_admin(server: &TestServer, email: &str, username: &str, password: &str) {
    let now = Utc::now();
    let user = User {
        id: EntityId::new().0,
        email: email.to_string(),
        username: username.to_string(),
        password_hash: password::hash_password(password).unwrap(),
        first_name: "Admin".to_string(),
        last_name: "User".to_string(),
        phone: None,
        role: "admin".to_string(),
        is_verified: true,
        last_login: None,
        created_at: now,
        updated_at: now,
    };

    server.state.db.insert_user(&user).await.unwrap();
}
