use axum::extract::{Path, State};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use depot_store::ArtifactId;

use super::error::UploadApiError;
use crate::http_server::api::client::{endpoint, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct DeleteRequest {
    /// Upload id
    pub id: ArtifactId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub id: ArtifactId,
    pub deleted: bool,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, UploadApiError> {
    let id: ArtifactId = id.parse()?;
    state.uploads().delete(&id).await?;
    Ok(Json(DeleteResponse { id, deleted: true }))
}

impl ApiRequest for DeleteRequest {
    type Response = DeleteResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.delete(endpoint(base_url, &format!("/api/v0/upload/{}", self.id)))
    }
}
