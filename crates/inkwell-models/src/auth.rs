//! Authentication request and response DTOs.
//!
//! Password length limits live here as validator rules. The character-class
//! rules are checked separately by
//! [`check_password_strength`](inkwell_core::check_password_strength) so their
//! failure reads as its own error rather than a field validation error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::UserId;
use crate::users::{User, validate_username};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 30), custom(function = "validate_username"))]
    #[schema(example = "ada_lovelace")]
    pub username: String,
    #[validate(email(message = "Please provide a valid email"))]
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    #[schema(example = "Secret123")]
    pub password: String,
}

/// Login accepts either the email or the username as `identifier`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[serde(alias = "email", alias = "username")]
    #[validate(length(min = 1))]
    #[schema(example = "ada@example.com")]
    pub identifier: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Returned by register and login.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 6, max = 128))]
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A pending password reset. Only the SHA-256 digest of the emailed token is
/// kept.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PasswordReset {
    pub user_id: UserId,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}
