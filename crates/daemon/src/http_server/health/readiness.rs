use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tokio::time::timeout;

use super::data_source::*;

const READINESS_TIMEOUT: Duration = Duration::from_secs(10);

/// Ready once the catalog database answers a ping.
#[tracing::instrument(skip(data_src))]
pub async fn handler(data_src: StateDataSource) -> Response {
    let outcome = timeout(READINESS_TIMEOUT, data_src.is_ready()).await;

    let (status, database, message) = match outcome {
        Ok(Ok(())) => (StatusCode::OK, "ok", None),
        Ok(Err(e @ DataSourceError::ShuttingDown)) => {
            (StatusCode::SERVICE_UNAVAILABLE, "closed", Some(e.to_string()))
        }
        Ok(Err(e @ DataSourceError::DependencyFailure)) => {
            (StatusCode::SERVICE_UNAVAILABLE, "failing", Some(e.to_string()))
        }
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "timeout",
            Some("readiness check timed out".to_string()),
        ),
    };

    let body = serde_json::json!({
        "status": if status.is_success() { "ok" } else { "failure" },
        "database": database,
        "message": message,
    });
    (status, Json(body)).into_response()
}
