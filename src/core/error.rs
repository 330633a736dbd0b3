//! Typed error handling for dashspot
//!
//! Every fallible operation in the crate returns [`DashResult`]. Errors are
//! grouped by category so callers can match on what went wrong instead of
//! inspecting strings:
//!
//! - [`ConfigError`]: registry construction and configuration loading
//! - [`RequestError`]: the caller is not allowed to make the request
//! - [`ValidationError`]: a client-supplied value could not be coerced
//! - [`StorageError`]: the in-memory store failed or a record is missing
//! - [`SyncError`]: the remote library source or token refresh failed
//!
//! # Example
//!
//! ```rust,ignore
//! match filters.playlists.apply(&auth, &params, None) {
//!     Ok(playlists) => playlists.paginate(page)?,
//!     Err(DashError::Request(RequestError::Unauthenticated)) => { /* 401 */ }
//!     Err(e) => return Err(e),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// The main error type for dashspot
#[derive(Debug, Error)]
pub enum DashError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Should not happen in normal operation
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl DashError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            DashError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DashError::Request(e) => e.status_code(),
            DashError::Validation(_) => StatusCode::BAD_REQUEST,
            DashError::Storage(e) => e.status_code(),
            DashError::Sync(e) => e.status_code(),
            DashError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            DashError::Config(_) => "CONFIG_ERROR",
            DashError::Request(e) => e.error_code(),
            DashError::Validation(_) => "VALIDATION_ERROR",
            DashError::Storage(e) => e.error_code(),
            DashError::Sync(e) => e.error_code(),
            DashError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            DashError::Validation(ValidationError::InvalidValue {
                field,
                value,
                expected,
            }) => Some(serde_json::json!({
                "field": field,
                "value": value,
                "expected": expected
            })),
            DashError::Validation(ValidationError::FieldErrors(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            DashError::Storage(StorageError::NotFound { resource, id }) => {
                Some(serde_json::json!({
                    "resource": resource,
                    "id": id.to_string()
                }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for DashError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors raised while building registries or loading configuration
///
/// These are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A declared filter/search/sort key has no handler
    #[error("{resource}: {kind} field '{field}' has no handler")]
    MissingHandler {
        resource: String,
        kind: String,
        field: String,
    },

    /// A filter configuration names a resource that does not exist
    #[error("Unknown resource '{resource}' in filter configuration")]
    UnknownResource { resource: String },

    #[error("Failed to parse config{}: {message}", .file.as_ref().map(|f| format!(" file '{}'", f)).unwrap_or_default())]
    ParseError {
        file: Option<String>,
        message: String,
    },

    #[error("Invalid value '{value}' for field '{field}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("IO error: {message}")]
    IoError { message: String },
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors related to who is making the request
#[derive(Debug, Error)]
pub enum RequestError {
    /// No principal could be resolved from the request context
    #[error("Authentication credentials were not provided")]
    Unauthenticated,

    #[error("Forbidden: {message}")]
    Forbidden { message: String },
}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::Unauthenticated => StatusCode::UNAUTHORIZED,
            RequestError::Forbidden { .. } => StatusCode::FORBIDDEN,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::Unauthenticated => "UNAUTHENTICATED",
            RequestError::Forbidden { .. } => "FORBIDDEN",
        }
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to client input
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A raw parameter value could not be coerced to the expected type
    #[error("Invalid value '{value}' for '{field}': expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    /// Sort direction other than `asc` or `desc`
    #[error("Invalid sort direction '{value}' for '{field}': expected 'asc' or 'desc'")]
    InvalidDirection { field: String, value: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Multiple field validation errors
    #[error("Validation errors: {}", .0.iter().map(|e| format!("{}: {}", e.field, e.message)).collect::<Vec<_>>().join(", "))]
    FieldErrors(Vec<FieldValidationError>),
}

/// A single field validation error
#[derive(Debug, Clone, Serialize)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldValidationError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let field = field.to_string();
                errs.iter().map(move |e| FieldValidationError {
                    field: field.clone(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        ValidationError::FieldErrors(fields)
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors related to the record store
#[derive(Debug, Error)]
pub enum StorageError {
    /// A reader or writer panicked while holding the store lock
    #[error("Failed to acquire {mode} lock: {message}")]
    LockPoisoned { mode: String, message: String },

    #[error("{resource} with id '{id}' not found")]
    NotFound { resource: String, id: Uuid },
}

impl StorageError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            StorageError::LockPoisoned { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            StorageError::NotFound { .. } => StatusCode::NOT_FOUND,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::LockPoisoned { .. } => "STORAGE_ERROR",
            StorageError::NotFound { .. } => "NOT_FOUND",
        }
    }
}

// =============================================================================
// Sync Errors
// =============================================================================

/// Errors raised by the library synchronization pipeline
#[derive(Debug, Clone, Error)]
pub enum SyncError {
    /// The remote API rejected the access token as expired
    #[error("The access token expired")]
    ExpiredToken,

    /// Exchanging the refresh token for a new access token failed
    #[error("Token refresh failed: {message}")]
    RefreshFailed { message: String },

    /// Any other remote API failure
    #[error("Remote API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A remote record could not be cleaned into its canonical shape
    #[error("Invalid {resource} record: {message}")]
    InvalidRecord { resource: String, message: String },
}

impl SyncError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SyncError::ExpiredToken | SyncError::RefreshFailed { .. } => StatusCode::UNAUTHORIZED,
            SyncError::Api { .. } | SyncError::InvalidRecord { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            SyncError::ExpiredToken => "TOKEN_EXPIRED",
            SyncError::RefreshFailed { .. } => "TOKEN_REFRESH_FAILED",
            SyncError::Api { .. } => "REMOTE_API_ERROR",
            SyncError::InvalidRecord { .. } => "INVALID_REMOTE_RECORD",
        }
    }

    pub fn is_expired_token(&self) -> bool {
        matches!(self, SyncError::ExpiredToken)
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<std::io::Error> for DashError {
    fn from(err: std::io::Error) -> Self {
        DashError::Config(ConfigError::IoError {
            message: err.to_string(),
        })
    }
}

impl From<serde_yaml::Error> for DashError {
    fn from(err: serde_yaml::Error) -> Self {
        DashError::Config(ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        })
    }
}

impl From<validator::ValidationErrors> for DashError {
    fn from(err: validator::ValidationErrors) -> Self {
        DashError::Validation(err.into())
    }
}

impl From<anyhow::Error> for DashError {
    fn from(err: anyhow::Error) -> Self {
        DashError::Internal(err.to_string())
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for dashspot operations
pub type DashResult<T> = Result<T, DashError>;
