use axum::routing::{get, post};
use axum::Router;

mod index;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/", get(index::handler))
        .route("/uploads", post(index::upload_handler))
        .route("/uploads/:id/delete", post(index::delete_handler))
        .with_state(state)
}
