/// Error Handling Module
///
/// Every failure a request can hit is an `AppError`. Handlers and the session
/// guard return it directly; actix turns it into a JSON error body through the
/// `ResponseError` implementation below.
///
/// Status mapping:
/// - Validation failures, duplicate email, bad credentials -> 400
/// - Missing / invalid / expired / revoked session token -> 401
/// - Valid token whose actor no longer exists -> 404
/// - Store unavailable -> 503, anything else -> 500

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use std::error::Error as StdError;
use std::fmt;

/// Message shared by every login failure so callers cannot tell an unknown
/// email from a wrong password.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

/// Message returned when a registration collides with an existing email.
pub const EMAIL_IN_USE_MESSAGE: &str = "Email already in use";

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// A single rule failure on one input field
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyField(String),
    TooShort(String, usize),
    TooLong(String, usize),
    InvalidFormat(String),
    BelowMinimum(String, i64),
    AboveMaximum(String, i64),
    /// Input longer than `usize` bytes once UTF-8 encoded.
    TooManyBytes(String, usize),
    NotAllowed(String, &'static [&'static str]),
    MalformedBody(String),
}

impl ValidationError {
    /// Name of the offending field, dotted for nested objects (`vehicle.plate`).
    pub fn field(&self) -> &str {
        match self {
            ValidationError::EmptyField(field)
            | ValidationError::TooShort(field, _)
            | ValidationError::TooLong(field, _)
            | ValidationError::InvalidFormat(field)
            | ValidationError::BelowMinimum(field, _)
            | ValidationError::AboveMaximum(field, _)
            | ValidationError::TooManyBytes(field, _)
            | ValidationError::NotAllowed(field, _) => field,
            ValidationError::MalformedBody(_) => "body",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is required", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} must be at least {} characters long", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} must be at most {} characters long", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
            ValidationError::BelowMinimum(field, min) => {
                write!(f, "{} must be at least {}", field, min)
            }
            ValidationError::AboveMaximum(field, max) => {
                write!(f, "{} must be at most {}", field, max)
            }
            ValidationError::TooManyBytes(field, max) => {
                write!(f, "{} must be at most {} bytes long", field, max)
            }
            ValidationError::NotAllowed(field, allowed) => {
                write!(f, "{} must be one of: {}", field, allowed.join(", "))
            }
            ValidationError::MalformedBody(msg) => write!(f, "malformed request body: {}", msg),
        }
    }
}

impl StdError for ValidationError {}

/// Field-level error as it appears in a 400 response body
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl From<&ValidationError> for FieldError {
    fn from(err: &ValidationError) -> Self {
        Self {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

/// Store operation errors
#[derive(Debug)]
pub enum DatabaseError {
    UniqueConstraintViolation(String),
    NotFound(String),
    ConnectionPool(String),
    UnexpectedError(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::UniqueConstraintViolation(msg) => {
                write!(f, "Duplicate entry: {}", msg)
            }
            DatabaseError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DatabaseError::ConnectionPool(msg) => write!(f, "Database connection error: {}", msg),
            DatabaseError::UnexpectedError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl StdError for DatabaseError {}

/// Authentication errors
#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    InvalidCredentials,
    MissingToken,
    TokenInvalid,
    TokenExpired,
    TokenRevoked,
    RoleMismatch,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::MissingToken => write!(f, "Missing authentication token"),
            AuthError::TokenInvalid => write!(f, "Invalid token"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::TokenRevoked => write!(f, "Token has been revoked"),
            AuthError::RoleMismatch => write!(f, "Token was issued for another role"),
        }
    }
}

impl StdError for AuthError {}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

#[derive(Debug)]
pub enum AppError {
    /// One or more input fields failed validation; all of them are reported.
    Validation(Vec<ValidationError>),
    Database(DatabaseError),
    Auth(AuthError),
    Internal(String),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::Database(DatabaseError::NotFound(what.into()))
    }

    pub fn email_in_use() -> Self {
        AppError::Database(DatabaseError::UniqueConstraintViolation(
            EMAIL_IN_USE_MESSAGE.to_string(),
        ))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(errors) => {
                let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                write!(f, "{}", messages.join("; "))
            }
            AppError::Database(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(vec![err])
    }
}

impl From<Vec<ValidationError>> for AppError {
    fn from(errors: Vec<ValidationError>) -> Self {
        AppError::Validation(errors)
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AppError::Database(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                AppError::email_in_use()
            }
            sqlx::Error::RowNotFound => {
                AppError::Database(DatabaseError::NotFound("Record not found".to_string()))
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                AppError::Database(DatabaseError::ConnectionPool(err.to_string()))
            }
            _ => AppError::Database(DatabaseError::UnexpectedError(err.to_string())),
        }
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
    /// Per-field details, only present on validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
            errors: None,
        }
    }

    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = Some(errors);
        self
    }
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse);
    fn log_error(&self, request_id: &str);
}

impl AppError {
    fn classify(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Validation failed".to_string(),
            ),

            AppError::Database(e) => match e {
                DatabaseError::UniqueConstraintViolation(_) => (
                    StatusCode::BAD_REQUEST,
                    "EMAIL_IN_USE",
                    EMAIL_IN_USE_MESSAGE.to_string(),
                ),
                DatabaseError::NotFound(what) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", what.clone())
                }
                DatabaseError::ConnectionPool(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Database service temporarily unavailable".to_string(),
                ),
                DatabaseError::UnexpectedError(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error occurred".to_string(),
                ),
            },

            AppError::Auth(e) => match e {
                AuthError::InvalidCredentials => (
                    StatusCode::BAD_REQUEST,
                    "INVALID_CREDENTIALS",
                    INVALID_CREDENTIALS_MESSAGE.to_string(),
                ),
                AuthError::MissingToken => (
                    StatusCode::UNAUTHORIZED,
                    "MISSING_TOKEN",
                    "Missing authentication token".to_string(),
                ),
                AuthError::TokenRevoked => (
                    StatusCode::UNAUTHORIZED,
                    "TOKEN_REVOKED",
                    "Token has been revoked".to_string(),
                ),
                AuthError::TokenInvalid | AuthError::TokenExpired | AuthError::RoleMismatch => (
                    StatusCode::UNAUTHORIZED,
                    "TOKEN_INVALID",
                    "Invalid or expired token".to_string(),
                ),
            },

            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        }
    }
}

impl ErrorHandler for AppError {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse) {
        let (status, code, message) = self.classify();
        let mut response =
            ErrorResponse::new(request_id.to_string(), message, code.to_string(), status.as_u16());

        if let AppError::Validation(errors) = self {
            response = response.with_errors(errors.iter().map(FieldError::from).collect());
        }

        (status, response)
    }

    fn log_error(&self, request_id: &str) {
        match self {
            AppError::Validation(_) => {
                tracing::warn!(request_id = request_id, error = %self, "Validation error");
            }
            AppError::Database(DatabaseError::UniqueConstraintViolation(_)) => {
                tracing::warn!(request_id = request_id, error = %self, "Duplicate entry attempt");
            }
            AppError::Database(DatabaseError::NotFound(_)) => {
                tracing::info!(request_id = request_id, error = %self, "Resource not found");
            }
            AppError::Database(e) => {
                tracing::error!(request_id = request_id, error = %e, "Database error");
            }
            AppError::Auth(AuthError::InvalidCredentials) => {
                tracing::warn!(request_id = request_id, "Invalid credentials attempt");
            }
            AppError::Auth(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Authentication error");
            }
            AppError::Internal(msg) => {
                tracing::error!(request_id = request_id, error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&request_id);

        let (status, error_response) = <Self as ErrorHandler>::error_response(self, &request_id);

        HttpResponse::build(status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        self.classify().0
    }
}

// ============================================================================
// 4. ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Per-operation context carried through a handler for structured logs
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub actor_id: Option<String>,
    pub operation: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            actor_id: None,
            operation: operation.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_actor_id(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    pub fn log_error(&self, error: &AppError) {
        let context = serde_json::json!({
            "request_id": self.request_id,
            "operation": self.operation,
            "actor_id": self.actor_id,
            "timestamp": self.timestamp.to_rfc3339(),
        });

        match error {
            AppError::Database(DatabaseError::UnexpectedError(_))
            | AppError::Database(DatabaseError::ConnectionPool(_))
            | AppError::Internal(_) => {
                tracing::error!(error = %error, context = ?context, "Operation failed");
            }
            _ => {
                tracing::warn!(error = %error, context = ?context, "Operation rejected");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::TooShort("fullname.firstname".to_string(), 3);
        assert_eq!(
            err.to_string(),
            "fullname.firstname must be at least 3 characters long"
        );
        assert_eq!(err.field(), "fullname.firstname");
    }

    #[test]
    fn validation_response_lists_every_field() {
        let err = AppError::Validation(vec![
            ValidationError::EmptyField("email".to_string()),
            ValidationError::TooShort("password".to_string(), 6),
        ]);
        let (status, body) = ErrorHandler::error_response(&err, "req-1");

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let errors = body.errors.expect("field errors present");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "email");
        assert_eq!(errors[1].field, "password");
    }

    #[test]
    fn credential_failures_are_generic_400() {
        let (status, body) =
            ErrorHandler::error_response(&AppError::Auth(AuthError::InvalidCredentials), "r");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, INVALID_CREDENTIALS_MESSAGE);
        assert!(body.errors.is_none());
    }

    #[test]
    fn duplicate_email_is_400() {
        let err = AppError::email_in_use();
        assert_eq!(ResponseError::status_code(&err), StatusCode::BAD_REQUEST);
        let (_, body) = ErrorHandler::error_response(&err, "r");
        assert_eq!(body.message, EMAIL_IN_USE_MESSAGE);
    }

    #[test]
    fn token_failures_are_401() {
        for e in [
            AuthError::MissingToken,
            AuthError::TokenInvalid,
            AuthError::TokenExpired,
            AuthError::TokenRevoked,
            AuthError::RoleMismatch,
        ] {
            assert_eq!(
                ResponseError::status_code(&AppError::Auth(e)),
                StatusCode::UNAUTHORIZED
            );
        }
    }

    #[test]
    fn missing_actor_is_404() {
        let err = AppError::not_found("User not found");
        assert_eq!(ResponseError::status_code(&err), StatusCode::NOT_FOUND);
        let (_, body) = ErrorHandler::error_response(&err, "r");
        assert_eq!(body.message, "User not found");
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::Database(DatabaseError::NotFound(_))));
    }

    #[test]
    fn test_error_context_creation() {
        let ctx = ErrorContext::new("user_login");
        assert_eq!(ctx.operation, "user_login");
        assert!(ctx.actor_id.is_none());

        let ctx = ctx.with_actor_id("abc");
        assert_eq!(ctx.actor_id.as_deref(), Some("abc"));
    }
}
