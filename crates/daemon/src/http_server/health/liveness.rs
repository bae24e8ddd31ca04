use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

/// The process is up and serving. Says nothing about dependencies.
pub async fn handler() -> impl IntoResponse {
    let msg = serde_json::json!({"status": "ok"});
    (StatusCode::OK, Json(msg))
}
