use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use inkwell_core::{AppError, ErrorEnvelope};
use inkwell_models::{
    AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, MessageResponse,
    RegisterRequest, ResetPasswordRequest, User,
};
use tracing::instrument;

use super::service::AuthService;
use crate::middleware::auth::CurrentUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation error, weak password or user already exists", body = ErrorEnvelope),
        (status = 429, description = "Too many requests", body = ErrorEnvelope)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let response = AuthService::register(&state, dto).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Log in with email or username
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorEnvelope),
        (status = 403, description = "Account deactivated", body = ErrorEnvelope),
        (status = 429, description = "Too many requests", body = ErrorEnvelope)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    Ok(Json(AuthService::login(&state, dto).await?))
}

/// Current account
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "The authenticated account", body = User),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorEnvelope),
        (status = 403, description = "Account deactivated", body = ErrorEnvelope)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
pub async fn me(user: CurrentUser) -> Json<User> {
    Json(user.0.as_ref().clone())
}

/// Change the password of the current account
#[utoipa::path(
    put,
    path = "/api/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Validation error or weak password", body = ErrorEnvelope),
        (status = 401, description = "Current password is incorrect", body = ErrorEnvelope)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
#[instrument(skip(state, user, dto))]
pub async fn change_password(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(dto): ValidatedJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::change_password(&state, &user, dto).await?;
    Ok(Json(MessageResponse::new("Password changed successfully")))
}

/// Request a password reset email
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset email sent if the account exists", body = MessageResponse),
        (status = 400, description = "Validation error", body = ErrorEnvelope),
        (status = 429, description = "Too many requests", body = ErrorEnvelope)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::forgot_password(&state, dto).await?;
    Ok(Json(MessageResponse::new(
        "If an account exists with that email, a password reset link has been sent.",
    )))
}

/// Reset the password with an emailed token
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Invalid or expired token, or weak password", body = ErrorEnvelope),
        (status = 429, description = "Too many requests", body = ErrorEnvelope)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::reset_password(&state, dto).await?;
    Ok(Json(MessageResponse::new(
        "Password has been reset successfully. You can now log in with your new password.",
    )))
}
