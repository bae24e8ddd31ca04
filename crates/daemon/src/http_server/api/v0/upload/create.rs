use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use depot_store::{ArtifactRecord, NewArtifact, UploadError};

use super::error::UploadApiError;
use super::UPLOAD_FIELD;
use crate::http_server::api::client::{endpoint, ApiRequest};
use crate::ServiceState;

/// Upload one file. Sent as multipart with the bytes in the `upload` field.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub filename: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateResponse {
    pub upload: ArtifactRecord,
}

pub async fn handler(
    State(state): State<ServiceState>,
    mut multipart: Multipart,
) -> Result<Response, UploadApiError> {
    let artifact = read_upload_field(&mut multipart).await?;
    let upload = state.uploads().create(artifact).await?;

    Ok((StatusCode::CREATED, Json(CreateResponse { upload })).into_response())
}

/// Pull the first `upload` field out of a multipart body. Other fields are
/// skipped.
pub(crate) async fn read_upload_field(
    multipart: &mut Multipart,
) -> Result<NewArtifact, UploadApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            tracing::debug!(field = ?field.name(), "ignoring multipart field");
            continue;
        }

        let filename = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(UploadApiError::MissingUpload),
        };
        let data = field.bytes().await?;

        return NewArtifact::from_filename(&filename, data)
            .map_err(|e| UploadApiError::Upload(UploadError::from(e)));
    }

    Err(UploadApiError::MissingUpload)
}

impl ApiRequest for CreateRequest {
    type Response = CreateResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let part = Part::bytes(self.data).file_name(self.filename);
        let form = Form::new().part(UPLOAD_FIELD, part);
        client
            .post(endpoint(base_url, "/api/v0/upload"))
            .multipart(form)
    }
}
