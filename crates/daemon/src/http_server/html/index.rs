use askama::Template;
use askama_axum::IntoResponse;
use axum::extract::{Multipart, Path, State};
use http::StatusCode;
use tracing::instrument;

use depot_store::{validator, ArtifactId, ArtifactRecord};

use crate::http_server::api::v0::upload::create::read_upload_field;
use crate::http_server::api::v0::upload::error::status_for;
use crate::http_server::api::v0::upload::UploadApiError;
use crate::ServiceState;

const UPLOADED: &str = "file has been uploaded successfully";
const DELETED: &str = "successfully deleted a file";

pub struct UploadRow {
    pub id: String,
    pub filename: String,
    pub file_type: String,
    pub size: i64,
    pub created_at: String,
}

impl From<ArtifactRecord> for UploadRow {
    fn from(record: ArtifactRecord) -> Self {
        let created_at = record
            .created_at
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| record.created_at.to_string());
        Self {
            id: record.id.to_string(),
            filename: record.filename(),
            file_type: record.file_type,
            size: record.size,
            created_at,
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub title: &'static str,
    pub accepted: String,
    pub uploads: Vec<UploadRow>,
    pub message: Option<String>,
    pub errors: Vec<String>,
}

#[instrument(skip(state))]
pub async fn handler(State(state): State<ServiceState>) -> askama_axum::Response {
    render(&state, StatusCode::OK, None, Vec::new()).await
}

#[instrument(skip(state, multipart))]
pub async fn upload_handler(
    State(state): State<ServiceState>,
    mut multipart: Multipart,
) -> askama_axum::Response {
    let outcome = match read_upload_field(&mut multipart).await {
        Ok(artifact) => state
            .uploads()
            .create(artifact)
            .await
            .map(|_| ())
            .map_err(UploadApiError::from),
        Err(e) => Err(e),
    };
    finish(&state, outcome, UPLOADED).await
}

#[instrument(skip(state))]
pub async fn delete_handler(
    State(state): State<ServiceState>,
    Path(id): Path<String>,
) -> askama_axum::Response {
    let outcome = match id.parse::<ArtifactId>() {
        Ok(id) => state.uploads().delete(&id).await,
        Err(e) => Err(e),
    };
    finish(&state, outcome.map_err(UploadApiError::from), DELETED).await
}

async fn finish(
    state: &ServiceState,
    outcome: Result<(), UploadApiError>,
    success: &str,
) -> askama_axum::Response {
    match outcome {
        Ok(()) => render(state, StatusCode::OK, Some(success.to_string()), Vec::new()).await,
        Err(e) => {
            let status = match &e {
                UploadApiError::Upload(err) => status_for(err.kind()),
                UploadApiError::Multipart(err) => err.status(),
                UploadApiError::MissingUpload => StatusCode::BAD_REQUEST,
            };
            if status.is_server_error() {
                tracing::error!("form request failed: {e}");
            }
            render(state, status, None, vec![e.to_string()]).await
        }
    }
}

/// Render the page with the current listing. A listing failure is shown
/// next to any other error rather than replacing the page.
async fn render(
    state: &ServiceState,
    status: StatusCode,
    message: Option<String>,
    mut errors: Vec<String>,
) -> askama_axum::Response {
    let uploads = match state.uploads().list().await {
        Ok(records) => records.into_iter().map(UploadRow::from).collect(),
        Err(e) => {
            tracing::error!("failed to list uploads: {e}");
            errors.push(e.to_string());
            Vec::new()
        }
    };

    let template = IndexTemplate {
        title: "Uploads",
        accepted: validator::ACCEPTED_TYPES.join(", "),
        uploads,
        message,
        errors,
    };

    let mut response = template.into_response();
    *response.status_mut() = status;
    response
}
