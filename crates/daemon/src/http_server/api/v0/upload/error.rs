use axum::extract::multipart::MultipartError;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::{Deserialize, Serialize};

use depot_store::{ArtifactId, ErrorKind, UploadError};

/// Error returned by every `/api/v0/upload` handler.
#[derive(Debug, thiserror::Error)]
pub enum UploadApiError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error("multipart field 'upload' with a filename is required")]
    MissingUpload,
}

/// JSON error body. `id` and `path` are only set for consistency errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ArtifactId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ErrorBody {
    fn new(kind: &str, msg: String) -> Self {
        Self {
            kind: kind.to_string(),
            msg,
            id: None,
            path: None,
        }
    }
}

impl From<&UploadError> for ErrorBody {
    fn from(err: &UploadError) -> Self {
        let mut body = ErrorBody::new(err.kind().as_str(), err.to_string());
        if let UploadError::Consistency(c) = err {
            body.id = Some(c.id);
            body.path = Some(c.path.to_string());
        }
        body
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::InvalidId => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Storage | ErrorKind::Persistence | ErrorKind::Consistency => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for UploadApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            UploadApiError::Upload(e) => (status_for(e.kind()), ErrorBody::from(e)),
            UploadApiError::Multipart(e) => {
                (e.status(), ErrorBody::new("invalid_request", self.to_string()))
            }
            UploadApiError::MissingUpload => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("invalid_request", self.to_string()),
            ),
        };

        if status.is_server_error() {
            tracing::error!(kind = %body.kind, "upload request failed: {}", body.msg);
        }
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use depot_store::{BlobPath, ConsistencyError, ConsistencyGap, StorageError, ValidationError};

    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (UploadError::from(ValidationError::Empty), StatusCode::BAD_REQUEST),
            (UploadError::InvalidId("x".into()), StatusCode::BAD_REQUEST),
            (UploadError::NotFound(ArtifactId::new()), StatusCode::NOT_FOUND),
            (UploadError::Conflict("report".into()), StatusCode::CONFLICT),
            (
                UploadError::from(StorageError::Missing(BlobPath::derive("a", "png"))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(UploadApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_consistency_body_carries_id_and_path() {
        let id = ArtifactId::new();
        let path = BlobPath::derive("report", "pdf");
        let err = UploadError::from(ConsistencyError {
            id,
            path: path.clone(),
            gap: ConsistencyGap::MissingBlob,
            source: Box::new(StorageError::Missing(path).into()),
        });

        let body = ErrorBody::from(&err);
        assert_eq!(body.kind, "consistency");
        assert_eq!(body.id, Some(id));
        assert_eq!(body.path.as_deref(), Some("report.pdf"));

        let body = ErrorBody::from(&UploadError::Conflict("report".into()));
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("id").is_none());
    }
}
