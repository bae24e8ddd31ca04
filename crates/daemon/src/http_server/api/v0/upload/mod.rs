//! `/api/v0/upload`: JSON API over the upload coordinator.

use axum::routing::get;
use axum::Router;

pub mod audit;
pub mod content;
pub mod create;
pub mod delete;
pub mod error;
pub mod get;
pub mod list;

pub use audit::AuditRequest;
pub use content::ContentRequest;
pub use create::{CreateRequest, CreateResponse};
pub use delete::{DeleteRequest, DeleteResponse};
pub use error::{ErrorBody, UploadApiError};
pub use get::{GetRequest, GetResponse};
pub use list::{ListRequest, ListResponse};

use crate::ServiceState;

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "upload";

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/", get(list::handler).post(create::handler))
        .route("/audit", get(audit::handler))
        .route("/:id", get(get::handler).delete(delete::handler))
        .route("/:id/content", get(content::handler))
        .with_state(state)
}
