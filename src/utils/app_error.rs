//! Error taxonomy shared by repositories, services and handlers.
//!
//! Repositories speak `DbErr`; everything above them speaks [`AppError`],
//! which renders as `{ "errors": [ { "code", "message", "field"? } ] }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use thiserror::Error;

use crate::utils::api_response::{ErrorDetail, ResponseBuilder};

/// A single field-level constraint violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub code: String,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    /// Unknown slug or id. Never folded into an empty result.
    #[error("{message}")]
    NotFound { code: &'static str, message: String },

    /// Field constraint violations, nothing was written
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// A referenced tag id is unknown or not visible to the caller
    #[error("{0}")]
    InvalidReference(String),

    #[error("{0}")]
    InvalidId(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{message}")]
    Unauthorized { code: &'static str, message: String },

    #[error("{0}")]
    Forbidden(String),

    /// Backing store failure. Not retried.
    #[error("Store error: {0}")]
    StoreUnavailable(#[from] DbErr),

    #[error("Event bus error: {0}")]
    EventBus(String),
}

impl AppError {
    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound { code, message: message.into() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Validation(_)
            | Self::InvalidReference(_)
            | Self::InvalidId(_)
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::StoreUnavailable(DbErr::ConnectionAcquire(_) | DbErr::Conn(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::StoreUnavailable(_) | Self::EventBus(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { code, .. } => code,
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidReference(_) => "INVALID_REFERENCE",
            Self::InvalidId(_) => "INVALID_ID",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Conflict(_) => "CONFLICT",
            Self::Unauthorized { code, .. } => code,
            Self::Forbidden(_) => "ACCESS_DENIED",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::EventBus(_) => "EVENT_BUS_ERROR",
        }
    }

    /// Body entries. Store details stay in the logs.
    pub fn details(&self) -> Vec<ErrorDetail> {
        match self {
            Self::Validation(fields) => fields
                .iter()
                .map(|f| ErrorDetail {
                    code: f.code.clone(),
                    message: f.message.clone(),
                    field: Some(f.field.clone()),
                })
                .collect(),
            Self::StoreUnavailable(_) => vec![ErrorDetail::new(self.code(), "Database error")],
            other => vec![ErrorDetail::new(other.code(), &other.to_string())],
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{} ({})", self, self.code());
        }
        ResponseBuilder::errors::<()>(status, self.details()).into_response()
    }
}
