use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ErrorDetail {
    pub code: String,    // machine readable, e.g. "TAG_NOT_FOUND"
    pub message: String, // Human readable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorDetail {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            field: None,
        }
    }
}

// Wrapper to combine StatusCode and the Body
pub struct ApiResponseResult<T>(pub StatusCode, pub ApiResponse<T>);

impl<T> IntoResponse for ApiResponseResult<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        (self.0, Json(self.1)).into_response()
    }
}

pub struct ResponseBuilder;

impl ResponseBuilder {
    pub fn success<T: Serialize>(data: T) -> ApiResponseResult<T> {
        ApiResponseResult(
            StatusCode::OK,
            ApiResponse { data: Some(data), meta: None, errors: Vec::new() },
        )
    }

    pub fn created<T: Serialize>(data: T) -> ApiResponseResult<T> {
        ApiResponseResult(
            StatusCode::CREATED,
            ApiResponse {
                data: Some(data),
                meta: Some(serde_json::json!({})),
                errors: Vec::new(),
            },
        )
    }

    pub fn error<T: Serialize>(
        status_code: StatusCode,
        code: &str,
        message: &str,
    ) -> ApiResponseResult<T> {
        Self::errors(status_code, vec![ErrorDetail::new(code, message)])
    }

    pub fn errors<T: Serialize>(
        status_code: StatusCode,
        errors: Vec<ErrorDetail>,
    ) -> ApiResponseResult<T> {
        ApiResponseResult(
            status_code,
            ApiResponse { data: None, meta: None, errors },
        )
    }

    pub fn fail_with_data<T: Serialize>(
        status_code: StatusCode,
        errors: Vec<ErrorDetail>,
        data: T,
    ) -> ApiResponseResult<T> {
        ApiResponseResult(
            status_code,
            ApiResponse { data: Some(data), meta: None, errors },
        )
    }
}
