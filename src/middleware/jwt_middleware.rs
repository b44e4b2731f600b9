use crate::config::AppState;
use crate::models::auth_model::CurrentUser;
use crate::utils::app_error::AppError;
use crate::utils::jwt_utils::JwtUtils;
use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::errors::ErrorKind;

fn unauthorized(code: &'static str, message: &str) -> Response {
    AppError::Unauthorized { code, message: message.to_string() }.into_response()
}

/// Resolves the caller from `Authorization: Bearer <jwt>` and stores it as a
/// `CurrentUser` request extension.
pub async fn jwt_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // 1. Get Token from Header
    let auth_header = match req.headers().get(header::AUTHORIZATION) {
        Some(header) => header,
        None => return unauthorized("AUTH_MISSING", "Authorization header is missing"),
    };

    let auth_str = match auth_header.to_str() {
        Ok(s) => s,
        Err(_) => return unauthorized("AUTH_INVALID_FORMAT", "Invalid Authorization header format"),
    };

    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return unauthorized(
            "AUTH_INVALID_SCHEME",
            "Invalid token format. Missing 'Bearer ' prefix",
        );
    };

    // 2. Validate JWT
    let token_data = match JwtUtils::validate_jwt(token, &state.config.jwt_secret) {
        Ok(data) => data,
        Err(e) => {
            let (code, message) = match e.kind() {
                ErrorKind::ExpiredSignature => ("TOKEN_EXPIRED", "Token has expired"),
                ErrorKind::InvalidToken => ("TOKEN_INVALID", "Token is invalid"),
                ErrorKind::InvalidSignature => ("TOKEN_BAD_SIGNATURE", "Invalid token signature"),
                _ => ("AUTH_FAILED", "Authentication failed"),
            };
            return unauthorized(code, message);
        }
    };

    // 3. Attach caller
    let user = CurrentUser::from(token_data.claims);
    tracing::debug!("Authenticated {}", user.id);
    req.extensions_mut().insert(user);

    next.run(req).await
}
