pub mod auth_service;
pub mod dashboard_service;
pub mod resource_service;

pub use auth_service::{AuthService, Session};
pub use dashboard_service::DashboardService;
pub use resource_service::{Page, ResourceService, SearchResult};

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::auth::{AuthError, PasswordError, TokenError};
use crate::database::StoreError;
use crate::policy::PolicyError;
use crate::types::ResourceType;
use crate::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Request is well formed but breaks a business rule (400)
    #[error("{0}")]
    Rejected(String),

    /// Request conflicts with the current state of the record (409)
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::TooLong => ServiceError::Rejected("Password must be at most 72 bytes".to_string()),
            PasswordError::Hash(msg) => ServiceError::Internal(msg),
        }
    }
}

impl From<TokenError> for ServiceError {
    fn from(err: TokenError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

/// Current time in the stored timestamp format
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Drop columns that never leave the service layer
pub fn strip_hidden(resource: ResourceType, mut value: Value) -> Value {
    if let Value::Object(map) = &mut value {
        for field in resource.hidden_fields() {
            map.remove(*field);
        }
    }
    value
}
