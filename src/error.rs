//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! It centralizes error management, providing a consistent way to handle and represent
//! the failure taxonomy of the credential subsystem, from authentication failures to
//! upstream store outages.
//!
//! `AppError` implements `actix_web::error::ResponseError` to seamlessly convert
//! application errors into appropriate HTTP responses with JSON bodies. Every variant
//! carries a stable machine-readable code alongside its message; internal details
//! (store keys, stack traces) never reach the client.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Represents all possible errors that can occur within the credential subsystem.
///
/// Domain failures (not-found, bad credentials, duplicate registration, invalid OTP)
/// are distinct variants so callers receive a stable error code. Infrastructure
/// failures from the session store or the identity provider keep their own variants
/// and are never masked as domain failures.
#[derive(Debug)]
pub enum AppError {
    /// No account matches the presented username or email (HTTP 404).
    UserNotFound(String),
    /// Bad password, inactive account, or refresh-token mismatch (HTTP 401).
    Unauthenticated(String),
    /// Registration conflict on the username column (HTTP 409).
    UsernameExists(String),
    /// Registration conflict on the email column (HTTP 409).
    EmailExists(String),
    /// Registration conflict on the phone-number column (HTTP 409).
    PhoneExists(String),
    /// Presented one-time code does not match the stored one (HTTP 400).
    OtpInvalid(String),
    /// Account exists but has been deactivated (HTTP 403).
    AccountDisabled(String),
    /// The OAuth2 provider rejected the exchange or returned garbage (HTTP 502).
    FederationFailed(String),
    /// Session store or provider did not answer in time (HTTP 503).
    UpstreamUnavailable(String),
    /// A stored role code does not map to a known role. Misconfiguration, not
    /// user error (HTTP 500).
    RoleNotFound(String),
    /// Failed input validation (HTTP 422 Unprocessable Entity).
    ValidationError(String),
    /// Error originating from database operations (HTTP 500).
    DatabaseError(String),
    /// Unexpected server-side error not covered by more specific types (HTTP 500).
    InternalServerError(String),
}

impl AppError {
    /// Stable machine-readable code reported to clients next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::UserNotFound(_) => "USER_NOT_FOUND",
            AppError::Unauthenticated(_) => "UNAUTHENTICATED",
            AppError::UsernameExists(_) => "USERNAME_EXISTS",
            AppError::EmailExists(_) => "EMAIL_EXISTS",
            AppError::PhoneExists(_) => "PHONE_EXISTS",
            AppError::OtpInvalid(_) => "OTP_INVALID",
            AppError::AccountDisabled(_) => "ACCOUNT_DISABLED",
            AppError::FederationFailed(_) => "FEDERATION_FAILED",
            AppError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            AppError::RoleNotFound(_) => "ROLE_NOT_FOUND",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::InternalServerError(_) => "INTERNAL_ERROR",
        }
    }

    fn message(&self) -> &str {
        match self {
            AppError::UserNotFound(msg)
            | AppError::Unauthenticated(msg)
            | AppError::UsernameExists(msg)
            | AppError::EmailExists(msg)
            | AppError::PhoneExists(msg)
            | AppError::OtpInvalid(msg)
            | AppError::AccountDisabled(msg)
            | AppError::FederationFailed(msg)
            | AppError::UpstreamUnavailable(msg)
            | AppError::RoleNotFound(msg)
            | AppError::ValidationError(msg)
            | AppError::DatabaseError(msg)
            | AppError::InternalServerError(msg) => msg,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// Converts `AppError` variants into `HttpResponse` objects.
///
/// This implementation allows Actix Web to automatically translate `AppError`
/// results from handlers into the correct HTTP status codes and JSON error responses.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::UserNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::UsernameExists(_)
            | AppError::EmailExists(_)
            | AppError::PhoneExists(_) => StatusCode::CONFLICT,
            AppError::OtpInvalid(_) => StatusCode::BAD_REQUEST,
            AppError::AccountDisabled(_) => StatusCode::FORBIDDEN,
            AppError::FederationFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::RoleNotFound(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "code": self.code(),
            "error": self.message()
        }))
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `sqlx::Error::RowNotFound` is mapped to `AppError::UserNotFound` (the only
/// rows this subsystem fetches are accounts), while other database errors
/// become `AppError::DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::UserNotFound("Account not found".into()),
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

/// Converts `redis::RedisError` into `AppError::UpstreamUnavailable`.
///
/// A session-store outage is an infrastructure failure and must not masquerade
/// as an authentication verdict.
impl From<redis::RedisError> for AppError {
    fn from(error: redis::RedisError) -> AppError {
        AppError::UpstreamUnavailable(format!("Session store error: {}", error))
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`.
///
/// The detailed validation messages are preserved.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::InternalServerError`.
///
/// This handles errors during password hashing or verification.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}
