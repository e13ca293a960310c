//! Error types for the API gateway.
//!
//! Every failure leaves the gateway as `{"error": {"kind", "message"}}` with
//! an HTTP status chosen per route family:
//!
//! | Route family | Mapping |
//! |--------------|---------|
//! | Governance mutations | 400 bad request body, 500 for any governance failure |
//! | Queries / voting | 400 invalid state, 403 unauthorized, 404 not found, 409 conflict, 500 abort |

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bg_governance::{ErrorKind, GovernanceError};
use serde::Serialize;
use shared_types::ValueError;
use std::fmt;
use thiserror::Error;

/// Kind reported for malformed requests rejected before reaching the service.
pub const INVALID_REQUEST: &str = "invalid_request";

/// HTTP-facing error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    kind: &'a str,
    message: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    /// Malformed body, query or path parameter.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, INVALID_REQUEST, message)
    }

    /// A required field was absent or blank.
    pub fn missing_field(field: &str) -> Self {
        Self::bad_request(format!("missing required field: {}", field))
    }

    /// Governance mutation failure: reported as 500 with the structured kind.
    pub fn governance_failure(err: GovernanceError) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            err.kind().as_str(),
            err.to_string(),
        )
    }

    /// Status for a governance error on query and voting routes.
    pub fn status_for(kind: ErrorKind) -> StatusCode {
        match kind {
            ErrorKind::InvalidState => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::TransactionAbort => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}] {}", self.status.as_u16(), self.kind, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<GovernanceError> for ApiError {
    fn from(err: GovernanceError) -> Self {
        let kind = err.kind();
        Self::new(Self::status_for(kind), kind.as_str(), err.to_string())
    }
}

impl From<ValueError> for ApiError {
    fn from(err: ValueError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                kind: self.kind,
                message: &self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Gateway lifecycle errors
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(String),

    /// Server stopped with an I/O error
    #[error("server error: {0}")]
    Serve(String),
}
