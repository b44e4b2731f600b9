pub mod admin_handler;
pub mod tag_handler;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;

use crate::config::AppState;
use crate::utils::api_response::ResponseBuilder;

pub async fn health_check_handler(State(state): State<AppState>) -> impl IntoResponse {
    let now = Utc::now();

    match state.db.ping().await {
        Ok(()) => ResponseBuilder::success(serde_json::json!({
            "status": "up",
            "database": "up",
            "serverTime": now.to_rfc3339(),
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            ResponseBuilder::error::<()>(
                StatusCode::SERVICE_UNAVAILABLE,
                "STORE_UNAVAILABLE",
                "Database is unreachable",
            )
            .into_response()
        }
    }
}
