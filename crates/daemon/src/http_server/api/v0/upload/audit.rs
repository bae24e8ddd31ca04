use axum::extract::State;
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use depot_store::AuditReport;

use super::error::UploadApiError;
use crate::http_server::api::client::{endpoint, ApiRequest};
use crate::ServiceState;

/// Compare the catalog against the blob store without changing either.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditRequest;

pub async fn handler(State(state): State<ServiceState>) -> Result<Json<AuditReport>, UploadApiError> {
    let report = state.uploads().audit().await?;
    if !report.is_consistent() {
        tracing::warn!(
            orphan_records = report.orphan_records.len(),
            orphan_blobs = report.orphan_blobs.len(),
            "audit found inconsistencies"
        );
    }
    Ok(Json(report))
}

impl ApiRequest for AuditRequest {
    type Response = AuditReport;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.get(endpoint(base_url, "/api/v0/upload/audit"))
    }
}
