use axum::Router;

pub mod upload;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .nest("/upload", upload::router(state.clone()))
        .with_state(state)
}
