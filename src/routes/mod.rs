use crate::config::AppState;
use crate::handlers::health_check_handler;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod admin_route;
pub mod tag_route;

fn cors_layer(whitelist: &[String]) -> CorsLayer {
    let origins = if whitelist.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            whitelist
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        )
    };

    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_origin(origins)
        .allow_headers(Any)
}

pub fn create_routes(state: AppState) -> Router<AppState> {
    let cors = cors_layer(&state.config.origin_whitelist);

    Router::new()
        .nest("/api/tags", tag_route::tag_routes(state.clone()))
        .nest("/api/tag-groups", admin_route::tag_group_routes(state.clone()))
        .nest("/api/admin", admin_route::admin_routes(state))
        // Health check
        .route("/api/health", get(health_check_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// The full service, state attached.
pub fn app(state: AppState) -> Router {
    create_routes(state.clone()).with_state(state)
}
