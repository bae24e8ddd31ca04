use axum::body::Body;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use http::header;
use reqwest::{Client, RequestBuilder, Url};

use depot_store::ArtifactId;

use super::error::UploadApiError;
use crate::http_server::api::client::endpoint;
use crate::ServiceState;

/// Download the stored bytes of an upload.
///
/// The response is not JSON, so this type is sent with
/// [`ApiClient::call_raw`](crate::http_server::api::client::ApiClient::call_raw)
/// instead of implementing `ApiRequest`.
#[derive(Debug, Clone)]
pub struct ContentRequest {
    pub id: ArtifactId,
}

impl ContentRequest {
    pub fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let path = format!("/api/v0/upload/{}/content", self.id);
        client.get(endpoint(base_url, &path))
    }
}

pub async fn handler(
    State(state): State<ServiceState>,
    Path(id): Path<String>,
) -> Result<Response, UploadApiError> {
    let id: ArtifactId = id.parse()?;
    let (record, data) = state.uploads().fetch(&id).await?;

    let mime = mime_guess::from_ext(&record.file_type).first_or_octet_stream();
    let disposition = format!(
        "attachment; filename=\"{}\"",
        header_safe(&record.filename())
    );

    Ok((
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(data),
    )
        .into_response())
}

/// Printable ASCII without quotes or backslashes; anything else becomes `_`.
fn header_safe(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect()
}
