use axum::{
    extract::{FromRequest, Request},
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::utils::app_error::AppError;
use crate::utils::validator_utils::ensure_valid;

/// JSON body that is both well formed and passes its `Validate` rules.
/// Either failure is rejected before the handler runs.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: serde::de::DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = axum::response::Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        // 1. JSON Extraction
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|err| {
                AppError::BadRequest(format!("Invalid JSON format: {}", err.body_text()))
                    .into_response()
            })?;

        // 2. Logic Validation
        ensure_valid(&payload).map_err(IntoResponse::into_response)?;

        Ok(ValidatedJson(payload))
    }
}
