use axum::{Extension, Json};
use serde_json::{json, Value as JsonValue};

use crate::sessions::SessionRegistry;

/// GET /health
pub async fn health_check(Extension(sessions): Extension<SessionRegistry>) -> Json<JsonValue> {
    Json(json!({
        "status": "ok",
        "sessions": sessions.active_sessions().await,
    }))
}
