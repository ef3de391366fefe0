use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use inkwell_core::{AppError, ErrorEnvelope, PaginationParams};
use inkwell_models::{
    PaginatedUsersResponse, UpdateRoleDto, UpdateStatusDto, UpdateUserDto, User, UserId,
    UserProfile,
};
use tracing::instrument;

use super::service::UserService;
use crate::middleware::auth::{CurrentUser, MaybeUser};
use crate::state::AppState;
use crate::validator::{IdPath, ValidatedJson, ValidatedQuery};

/// List all users
#[utoipa::path(
    get,
    path = "/api/users",
    params(PaginationParams),
    responses(
        (status = 200, description = "One page of users", body = PaginatedUsersResponse),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorEnvelope),
        (status = 403, description = "Insufficient permissions", body = ErrorEnvelope)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<PaginationParams>,
) -> Result<Json<PaginatedUsersResponse>, AppError> {
    Ok(Json(UserService::list_users(&state, params).await?))
}

/// Get a user profile
///
/// Email and status are only included for the account owner and admins.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = UserId, Path, description = "User ID")),
    responses(
        (status = 200, description = "User profile", body = UserProfile),
        (status = 400, description = "Invalid resource ID format", body = ErrorEnvelope),
        (status = 404, description = "User not found", body = ErrorEnvelope)
    ),
    tag = "Users"
)]
#[instrument(skip(state, viewer))]
pub async fn get_user(
    State(state): State<AppState>,
    viewer: MaybeUser,
    IdPath(id): IdPath<UserId>,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(UserService::get_profile(&state, id, viewer.user()).await?))
}

/// Update a user profile
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = UserId, Path, description = "User ID")),
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Validation error or duplicate value", body = ErrorEnvelope),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorEnvelope),
        (status = 403, description = "Not your account", body = ErrorEnvelope),
        (status = 404, description = "User not found", body = ErrorEnvelope)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, dto))]
pub async fn update_user(
    State(state): State<AppState>,
    IdPath(id): IdPath<UserId>,
    ValidatedJson(dto): ValidatedJson<UpdateUserDto>,
) -> Result<Json<User>, AppError> {
    Ok(Json(UserService::update_user(&state, id, dto).await?))
}

/// Delete a user account
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = UserId, Path, description = "User ID")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorEnvelope),
        (status = 403, description = "Not your account", body = ErrorEnvelope),
        (status = 404, description = "User not found", body = ErrorEnvelope)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    IdPath(id): IdPath<UserId>,
) -> Result<StatusCode, AppError> {
    UserService::delete_user(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Activate or deactivate an account
#[utoipa::path(
    patch,
    path = "/api/users/{id}/status",
    params(("id" = UserId, Path, description = "User ID")),
    request_body = UpdateStatusDto,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Cannot deactivate yourself", body = ErrorEnvelope),
        (status = 403, description = "Insufficient permissions", body = ErrorEnvelope),
        (status = 404, description = "User not found", body = ErrorEnvelope)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, admin))]
pub async fn update_status(
    State(state): State<AppState>,
    admin: CurrentUser,
    IdPath(id): IdPath<UserId>,
    ValidatedJson(dto): ValidatedJson<UpdateStatusDto>,
) -> Result<Json<User>, AppError> {
    Ok(Json(UserService::set_status(&state, &admin, id, dto.is_active).await?))
}

/// Change the role of an account
#[utoipa::path(
    patch,
    path = "/api/users/{id}/role",
    params(("id" = UserId, Path, description = "User ID")),
    request_body = UpdateRoleDto,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Cannot demote yourself", body = ErrorEnvelope),
        (status = 403, description = "Insufficient permissions", body = ErrorEnvelope),
        (status = 404, description = "User not found", body = ErrorEnvelope)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, admin))]
pub async fn update_role(
    State(state): State<AppState>,
    admin: CurrentUser,
    IdPath(id): IdPath<UserId>,
    ValidatedJson(dto): ValidatedJson<UpdateRoleDto>,
) -> Result<Json<User>, AppError> {
    Ok(Json(UserService::set_role(&state, &admin, id, dto.role).await?))
}
