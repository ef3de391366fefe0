//! Application error taxonomy.
//!
//! Every failure the API can report is one variant of [`AppError`]. Handlers,
//! extractors and middleware return it through `Result`, and
//! [`AppError::translate`] is the single exhaustive mapping from a variant to
//! the status code, message and details that end up in the
//! [`ErrorEnvelope`](crate::envelope::ErrorEnvelope).
//!
//! Foreign failure sources are folded into the taxonomy with `From`
//! conversions (validator results, `anyhow` faults) here, and in the crates
//! that own the other sources (token errors in `inkwell-auth`, storage errors
//! in `inkwell-db`).

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::{ValidationError, ValidationErrors};

/// One field that collided with an existing record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub field: String,
    pub value: String,
}

impl Conflict {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Human readable `"<field> '<value>' already exists"`.
    pub fn describe(&self) -> String {
        format!("{} '{}' already exists", self.field, self.value)
    }
}

/// A single failed rule on a request field.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub value: Option<serde_json::Value>,
}

/// Structured details attached to an error envelope.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum ErrorDetails {
    Text(String),
    Messages(Vec<String>),
    Fields(Vec<FieldError>),
}

impl From<&str> for ErrorDetails {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ErrorDetails {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for ErrorDetails {
    fn from(value: Vec<String>) -> Self {
        Self::Messages(value)
    }
}

/// Client-facing outcome of an [`AppError`].
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<ErrorDetails>,
}

#[derive(Debug, Error)]
pub enum AppError {
    /// No credential was presented.
    #[error("no token provided")]
    Unauthenticated,

    /// Token failed signature, format, issuer or audience checks.
    #[error("invalid token")]
    TokenInvalid,

    #[error("token expired")]
    TokenExpired,

    /// The token's subject no longer exists.
    #[error("user referenced by token not found")]
    UserNotFound,

    #[error("account is deactivated")]
    AccountDeactivated,

    /// Role or ownership mismatch.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A resource identifier that does not have the expected shape.
    #[error("malformed resource id: {0}")]
    InvalidId(String),

    /// Uniqueness constraint violation.
    #[error("duplicate value for {}", .0.iter().map(|c| c.field.as_str()).collect::<Vec<_>>().join(", "))]
    Duplicate(Vec<Conflict>),

    /// The request body did not match the expected shape.
    #[error("schema validation failed: {}", .0.join("; "))]
    SchemaValidation(Vec<String>),

    /// Explicit validator rules failed.
    #[error("request validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("payload too large")]
    PayloadTooLarge,

    #[error("unexpected file field '{0}'")]
    UnexpectedField(String),

    /// Storage unreachable or timed out.
    #[error("database unavailable: {0}")]
    DatabaseUnavailable(String),

    #[error("rate limit exceeded")]
    RateLimited,

    /// Deliberately raised domain error. Its status and details are trusted
    /// as-is by the translator.
    #[error("{message}")]
    Operational {
        status: StatusCode,
        message: String,
        details: Option<ErrorDetails>,
    },

    /// Anything nobody planned for. Never detailed to the client.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl AppError {
    pub fn operational(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Operational {
            status,
            message: message.into(),
            details: None,
        }
    }

    /// Operational error with the default 400 status.
    pub fn application(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::BAD_REQUEST, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::NOT_FOUND, message)
    }

    /// Pre-built error for requests that matched no route.
    pub fn route_not_found(method: &str, path: &str) -> Self {
        Self::not_found("Route not found").with_details(format!("Cannot {method} {path}"))
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self::Unexpected(err.into())
    }

    /// Attach details to an operational error. Other variants derive their
    /// details from their own payload and are returned unchanged.
    pub fn with_details(self, details: impl Into<ErrorDetails>) -> Self {
        match self {
            Self::Operational {
                status, message, ..
            } => Self::Operational {
                status,
                message,
                details: Some(details.into()),
            },
            other => other,
        }
    }

    /// True for every deliberately raised error, false for unexpected faults.
    pub fn is_operational(&self) -> bool {
        !matches!(self, Self::Unexpected(_))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated | Self::TokenInvalid | Self::TokenExpired | Self::UserNotFound => {
                StatusCode::UNAUTHORIZED
            }
            Self::AccountDeactivated | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::InvalidId(_)
            | Self::Duplicate(_)
            | Self::SchemaValidation(_)
            | Self::Validation(_)
            | Self::PayloadTooLarge
            | Self::UnexpectedField(_) => StatusCode::BAD_REQUEST,
            Self::DatabaseUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Operational { status, .. } => *status,
            Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Maps the error to what the client is allowed to see.
    pub fn translate(&self) -> Translation {
        let (message, details): (&str, Option<ErrorDetails>) = match self {
            Self::InvalidId(_) => (
                "Invalid resource ID format",
                Some("The provided ID is not a valid identifier".into()),
            ),
            Self::Duplicate(conflicts) => ("Duplicate field value", duplicate_details(conflicts)),
            Self::SchemaValidation(messages) => {
                ("Validation Error", Some(ErrorDetails::Messages(messages.clone())))
            }
            Self::TokenInvalid => (
                "Invalid token",
                Some("The provided token is malformed or has an invalid signature".into()),
            ),
            Self::TokenExpired => (
                "Token expired",
                Some("Your session has expired, please log in again".into()),
            ),
            Self::Validation(fields) => {
                ("Validation Error", Some(ErrorDetails::Fields(fields.clone())))
            }
            Self::PayloadTooLarge => (
                "File too large",
                Some("The uploaded file exceeds the maximum allowed size".into()),
            ),
            Self::UnexpectedField(_) => (
                "Unexpected file field",
                Some("The upload contained a field that is not accepted".into()),
            ),
            Self::DatabaseUnavailable(_) => (
                "Database connection error",
                Some("The service is temporarily unavailable, please try again later".into()),
            ),
            Self::RateLimited => (
                "Too many requests",
                Some("Rate limit exceeded, please slow down and try again later".into()),
            ),
            Self::Operational {
                message, details, ..
            } => (message.as_str(), details.clone()),
            Self::Unauthenticated => ("Access denied", Some("No token provided".into())),
            Self::UserNotFound => (
                "User not found",
                Some("The account this token belongs to no longer exists".into()),
            ),
            Self::AccountDeactivated => (
                "Account deactivated",
                Some("This account has been deactivated".into()),
            ),
            Self::Forbidden(reason) => (reason.as_str(), None),
            Self::Unexpected(_) => ("Internal Server Error", None),
        };

        Translation {
            status: self.status(),
            message: message.to_string(),
            details,
        }
    }
}

fn duplicate_details(conflicts: &[Conflict]) -> Option<ErrorDetails> {
    match conflicts {
        [] => None,
        [single] => Some(ErrorDetails::Text(single.describe())),
        many => Some(ErrorDetails::Messages(
            many.iter().map(Conflict::describe).collect(),
        )),
    }
}

/// The raised error, carried in response extensions until the envelope
/// middleware renders it.
#[derive(Debug, Clone)]
pub struct RaisedError(pub Arc<AppError>);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut response = self.status().into_response();
        response
            .extensions_mut()
            .insert(RaisedError(Arc::new(self)));
        response
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                let field = field.to_string();
                errors
                    .iter()
                    .map(move |error| field_error(&field, error))
                    .collect::<Vec<_>>()
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        Self::Validation(fields)
    }
}

fn field_error(field: &str, error: &ValidationError) -> FieldError {
    let message = match &error.message {
        Some(message) => message.to_string(),
        None => default_message(field, error),
    };

    FieldError {
        field: field.to_string(),
        message,
        value: error.params.get("value").cloned(),
    }
}

fn default_message(field: &str, error: &ValidationError) -> String {
    let param = |name: &str| error.params.get(name).map(|v| v.to_string());

    match error.code.as_ref() {
        "length" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => format!("{field} must be between {min} and {max} characters"),
            (Some(min), None) => format!("{field} must be at least {min} characters"),
            (None, Some(max)) => format!("{field} must be at most {max} characters"),
            _ => format!("{field} has an invalid length"),
        },
        "range" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => format!("{field} must be between {min} and {max}"),
            (Some(min), None) => format!("{field} must be at least {min}"),
            (None, Some(max)) => format!("{field} must be at most {max}"),
            _ => format!("{field} is out of range"),
        },
        "email" => format!("{field} must be a valid email address"),
        "required" => format!("{field} is required"),
        _ => format!("{field} is invalid"),
    }
}
