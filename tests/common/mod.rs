#![allow(dead_code)]

use reqwest::Client;
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

pub const BASE_URL: &str = "http://localhost:8000";

/// Build a reqwest client for tests.
pub fn client() -> Client {
    Client::new()
}

/// Timestamp-based suffix to keep test accounts apart.
pub fn unique_suffix() -> String {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}", ts % 1_000_000_000)
}

/// Build a URL for an API endpoint.
pub fn url(path: &str) -> String {
    format!("{}{}", BASE_URL, path)
}

/// Register a fresh account and return `(email, token)`.
pub async fn register_fresh(client: &Client, prefix: &str) -> (String, String) {
    let email = format!("{prefix}_{}@recorder.dev", unique_suffix());
    let resp = client
        .post(url("/api/auth/register"))
        .json(&json!({ "email": email, "password": "testpass123" }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(resp.status(), 200, "Register should succeed");

    let body: Value = resp.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();
    (email, token)
}

/// POST with a bearer token and optional JSON body.
pub async fn post(client: &Client, token: &str, path: &str, body: Option<Value>) -> reqwest::Response {
    let req = client.post(url(path)).bearer_auth(token);
    let req = match body {
        Some(body) => req.json(&body),
        None => req,
    };
    req.send().await.expect("Failed to send request")
}

/// GET with a bearer token.
pub async fn get(client: &Client, token: &str, path: &str) -> reqwest::Response {
    client
        .get(url(path))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request")
}
