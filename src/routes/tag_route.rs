use axum::{middleware, routing::{get, post}, Router};
use crate::config::AppState;
use crate::handlers::tag_handler::*;
use crate::middleware::jwt_middleware::jwt_middleware;

pub fn tag_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/{slug}", get(list_tags_handler).post(create_tag_handler))
        .route("/{slug}/group", get(get_group_handler))
        .route("/{slug}/taggedObjects", get(list_tagged_objects_handler))
        .route("/{slug}/upsertTaggedObjects", post(upsert_tagged_objects_handler))
        .route(
            "/{slug}/{id}",
            get(get_tag_handler).patch(update_tag_handler).delete(delete_tag_handler),
        )
        .layer(middleware::from_fn_with_state(state, jwt_middleware))
}
