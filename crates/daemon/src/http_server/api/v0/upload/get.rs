use axum::extract::{Path, State};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use depot_store::{ArtifactId, ArtifactRecord};

use super::error::UploadApiError;
use crate::http_server::api::client::{endpoint, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct GetRequest {
    /// Upload id
    pub id: ArtifactId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetResponse {
    pub upload: ArtifactRecord,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Path(id): Path<String>,
) -> Result<Json<GetResponse>, UploadApiError> {
    let id: ArtifactId = id.parse()?;
    let upload = state.uploads().get(&id).await?;
    Ok(Json(GetResponse { upload }))
}

impl ApiRequest for GetRequest {
    type Response = GetResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.get(endpoint(base_url, &format!("/api/v0/upload/{}", self.id)))
    }
}
