//! Route groups and the application composer.

pub mod collection;
pub mod common;
pub mod openapi;

pub use collection::collection_routes;
pub use common::common_routes;
pub use openapi::{build_openapi, openapi_routes};

use crate::state::{AppState, CollectionState};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Mount every collection under `/<path_segment>` next to the common and OpenAPI routes.
pub fn app(state: AppState, max_body_bytes: usize) -> Router {
    let mut router = Router::new()
        .merge(common_routes(state.clone()))
        .merge(openapi_routes(&state.model));
    for spec in &state.model.collections {
        let group = CollectionState::new(state.store.clone(), spec);
        router = router.nest(&format!("/{}", spec.path_segment), collection_routes(group));
    }
    router
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
}
