use axum::{middleware, routing::post, Router};
use crate::config::AppState;
use crate::handlers::admin_handler::*;
use crate::middleware::jwt_middleware::jwt_middleware;

pub fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/tags/{slug}", Router::new()
            .route("/reconcile", post(reconcile_counts_handler))
            .route("/sweep-orphans", post(sweep_orphans_handler))
            .route("/events/object-deleted", post(object_deleted_handler))
        )
        .layer(middleware::from_fn_with_state(state, jwt_middleware))
}

pub fn tag_group_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(create_tag_group_handler))
        .layer(middleware::from_fn_with_state(state, jwt_middleware))
}
