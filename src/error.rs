/// Application Error Handling
///
/// Unified error type for the credential/session engine and its HTTP
/// surface. Expected failure modes (bad credentials, duplicate email,
/// rejected tokens) are `Result` values end to end; only store faults
/// propagate as a distinct transient kind.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

use crate::auth::token::TokenError;
use crate::store::StoreError;
use crate::validators::ValidationError;

/// Central application error type.
///
/// `Unauthenticated` deliberately does not distinguish expired from
/// forged from revoked tokens: clients receive a uniform rejection so
/// that failure responses leak nothing about which check failed. The
/// distinction survives only in server-side logs.
#[derive(Debug)]
pub enum AppError {
    /// Login with an unknown email or a wrong password.
    InvalidCredentials,
    /// Registration with an email that already has a user.
    AlreadyExists,
    /// Missing, malformed, expired, or revoked credentials on a
    /// protected path.
    Unauthenticated,
    /// Transient store fault. Callers may retry; this engine does not.
    StoreUnavailable(String),
    /// Rejected input at the HTTP boundary.
    Validation(ValidationError),
    /// Unexpected internal condition (key encoding, hashing failure).
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidCredentials => write!(f, "Invalid email or password"),
            AppError::AlreadyExists => write!(f, "Email is already registered"),
            AppError::Unauthenticated => write!(f, "Authentication required"),
            AppError::StoreUnavailable(msg) => write!(f, "Store unavailable: {}", msg),
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

/// Any token rejection collapses into `Unauthenticated`; a malformed
/// token is treated exactly like an expired or forged one.
impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        tracing::warn!(reason = %err, "Token verification failed");
        AppError::Unauthenticated
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => AppError::AlreadyExists,
            StoreError::Unavailable(msg) => AppError::StoreUnavailable(msg),
        }
    }
}

/// JSON error body returned to clients.
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub status: u16,
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::AlreadyExists => "ALREADY_EXISTS",
            AppError::Unauthenticated => "UNAUTHENTICATED",
            AppError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Client-facing message. Store and internal details stay in the
    /// logs.
    fn public_message(&self) -> String {
        match self {
            AppError::StoreUnavailable(_) => "Service temporarily unavailable".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    fn log(&self) {
        match self {
            AppError::InvalidCredentials => {
                tracing::warn!("Invalid credentials attempt");
            }
            AppError::AlreadyExists => {
                tracing::warn!("Duplicate registration attempt");
            }
            AppError::Unauthenticated => {
                tracing::warn!("Unauthenticated request rejected");
            }
            AppError::Validation(e) => {
                tracing::warn!(error = %e, "Validation error");
            }
            AppError::StoreUnavailable(msg) => {
                tracing::error!(error = %msg, "Store unavailable");
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::AlreadyExists => StatusCode::CONFLICT,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        self.log();

        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse {
            code: self.code().to_string(),
            message: self.public_message(),
            status: status.as_u16(),
        })
    }
}
