use serde::{Deserialize, Serialize};

use crate::utils::app_error::AppError;

pub const ADMIN_ROLE: &str = "admin";

/// Identity token issued by the IAM collaborator.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub exp: usize,
    pub iat: usize,
}

/// The caller of a request, injected by `jwt_middleware`.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub id: String,
    pub tenant: Option<String>,
    pub is_admin: bool,
    pub permissions: Vec<String>,
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            is_admin: claims.roles.iter().any(|r| r == ADMIN_ROLE),
            id: claims.sub,
            tenant: claims.tenant,
            permissions: claims.permissions,
        }
    }
}

impl CurrentUser {
    pub fn can(&self, permission: &str) -> bool {
        self.is_admin || self.permissions.iter().any(|p| p == permission)
    }

    pub fn require(&self, permission: &str) -> Result<(), AppError> {
        if self.can(permission) {
            Ok(())
        } else {
            tracing::warn!("Access denied for {}: missing {}", self.id, permission);
            Err(AppError::Forbidden(format!("Missing permission {}", permission)))
        }
    }
}
