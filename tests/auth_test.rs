//! Integration tests for auth endpoints.
//!
//! Requires the server to be running on localhost:8000 with a database.

mod common;

use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn register_user(client: &reqwest::Client, email: &str, password: &str) -> reqwest::Response {
    client
        .post(common::url("/api/auth/register"))
        .json(&json!({
            "email": email,
            "password": password,
        }))
        .send()
        .await
        .expect("Failed to send register request")
}

async fn login_user(client: &reqwest::Client, email: &str, password: &str) -> reqwest::Response {
    client
        .post(common::url("/api/auth/login"))
        .json(&json!({
            "email": email,
            "password": password,
        }))
        .send()
        .await
        .expect("Failed to send login request")
}

async fn get_me(client: &reqwest::Client, token: &str) -> reqwest::Response {
    common::get(client, token, "/api/auth/me").await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

/// Full auth flow: register → login → me → session on the list screen.
#[tokio::test]
#[ignore = "requires a running server on localhost:8000"]
async fn register_login_and_me() {
    let client = common::client();
    let email = format!("test_{}@recorder.dev", common::unique_suffix());
    let password = "testpass123";

    let resp = register_user(&client, &email, password).await;
    assert_eq!(resp.status(), 200, "Register should succeed");
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["user"]["email"], email);
    assert!(body["token"].is_string(), "Should return a JWT token");

    let resp = login_user(&client, &email, password).await;
    assert_eq!(resp.status(), 200, "Login should succeed");
    let body: Value = resp.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    let resp = get_me(&client, &token).await;
    assert_eq!(resp.status(), 200, "GET /me should succeed with valid token");
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["email"], email);

    let resp = common::get(&client, &token, "/api/session").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["view"], "list");
    assert_eq!(body["identity"]["email"], email);
}

/// Registering the same email twice should fail.
#[tokio::test]
#[ignore = "requires a running server on localhost:8000"]
async fn register_duplicate_email_fails() {
    let client = common::client();
    let email = format!("dup_{}@recorder.dev", common::unique_suffix());

    let resp = register_user(&client, &email, "testpass123").await;
    assert_eq!(resp.status(), 200);

    let resp = register_user(&client, &email.to_uppercase(), "testpass123").await;
    assert_eq!(resp.status(), 400, "Duplicate email should be rejected");
    let body: Value = resp.json().await.unwrap();
    assert!(
        body["detail"].as_str().unwrap().contains("Email"),
        "Error should mention email: got {:?}",
        body["detail"]
    );
}

#[tokio::test]
#[ignore = "requires a running server on localhost:8000"]
async fn login_wrong_password_fails() {
    let client = common::client();
    let email = format!("wrongpw_{}@recorder.dev", common::unique_suffix());

    let resp = register_user(&client, &email, "correctpass1").await;
    assert_eq!(resp.status(), 200);

    let resp = login_user(&client, &email, "wrongpassword").await;
    assert_eq!(resp.status(), 400, "Wrong password should be rejected");
}

#[tokio::test]
#[ignore = "requires a running server on localhost:8000"]
async fn login_nonexistent_email_fails() {
    let client = common::client();
    let resp = login_user(&client, "nobody_at_all@recorder.dev", "whatever123").await;
    assert_eq!(resp.status(), 400, "Nonexistent email should be rejected");
}

#[tokio::test]
#[ignore = "requires a running server on localhost:8000"]
async fn me_without_token_fails() {
    let client = common::client();
    let resp = client
        .get(common::url("/api/auth/me"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401, "No token should return 401");
}

#[tokio::test]
#[ignore = "requires a running server on localhost:8000"]
async fn me_with_invalid_token_fails() {
    let client = common::client();
    let resp = get_me(&client, "this.is.not.a.valid.jwt").await;
    assert_eq!(resp.status(), 401, "Invalid token should return 401");
}

#[tokio::test]
#[ignore = "requires a running server on localhost:8000"]
async fn register_validation() {
    let client = common::client();
    let suffix = common::unique_suffix();

    let resp = register_user(&client, &format!("shortpw_{suffix}@recorder.dev"), "short").await;
    assert_eq!(resp.status(), 400, "Password < 8 chars should be rejected");

    let resp = register_user(&client, "not-an-email", "testpass123").await;
    assert_eq!(resp.status(), 400, "Malformed email should be rejected");
}

/// Logout drops the recording in progress and lands on the auth screen.
#[tokio::test]
#[ignore = "requires a running server on localhost:8000"]
async fn logout_discards_recording() {
    let client = common::client();
    let (email, token) = common::register_fresh(&client, "logout").await;

    let resp = common::post(&client, &token, "/api/session/recording", None).await;
    assert_eq!(resp.status(), 200);
    let resp = common::post(
        &client,
        &token,
        "/api/session/moves",
        Some(json!({"from": "e2", "to": "e4"})),
    )
    .await;
    assert_eq!(resp.status(), 200);

    let resp = common::post(&client, &token, "/api/auth/logout", None).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["view"], "auth");

    let resp = login_user(&client, &email, "testpass123").await;
    let body: Value = resp.json().await.unwrap();
    let token = body["token"].as_str().unwrap();
    let resp = common::get(&client, token, "/api/session").await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["view"], "list");
    assert_eq!(body["recording"]["moveCount"], 0);
    assert_eq!(body["recording"]["unsaved"], false);
}
