//! One route group: the six record operations over a single collection.

use crate::handlers::collection::{create, delete as delete_handler, detail, list, replace, update};
use crate::state::CollectionState;
use axum::{routing::get, Router};

/// Routes relative to the group's mount point: `/` and `/:key`.
pub fn collection_routes(state: CollectionState) -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route(
            "/:key",
            get(detail).put(replace).patch(update).delete(delete_handler),
        )
        .with_state(state)
}
