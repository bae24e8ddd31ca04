use axum::extract::State;
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use depot_store::ArtifactRecord;

use super::error::UploadApiError;
use crate::http_server::api::client::{endpoint, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    /// Newest first.
    pub uploads: Vec<ArtifactRecord>,
}

pub async fn handler(State(state): State<ServiceState>) -> Result<Json<ListResponse>, UploadApiError> {
    let uploads = state.uploads().list().await?;
    Ok(Json(ListResponse { uploads }))
}

impl ApiRequest for ListRequest {
    type Response = ListResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.get(endpoint(base_url, "/api/v0/upload"))
    }
}
