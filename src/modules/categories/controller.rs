use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use inkwell_core::{AppError, ErrorEnvelope};
use inkwell_models::{Category, CategoryId, CreateCategoryDto, UpdateCategoryDto};
use tracing::instrument;

use super::service::CategoryService;
use crate::state::AppState;
use crate::validator::{IdPath, ValidatedJson};

/// List categories
#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "All categories ordered by name", body = Vec<Category>)
    ),
    tag = "Categories"
)]
#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(CategoryService::list_categories(&state).await?))
}

/// Get a category
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(("id" = CategoryId, Path, description = "Category ID")),
    responses(
        (status = 200, description = "The category", body = Category),
        (status = 400, description = "Invalid resource ID format", body = ErrorEnvelope),
        (status = 404, description = "Category not found", body = ErrorEnvelope)
    ),
    tag = "Categories"
)]
#[instrument(skip(state))]
pub async fn get_category(
    State(state): State<AppState>,
    IdPath(id): IdPath<CategoryId>,
) -> Result<Json<Category>, AppError> {
    Ok(Json(CategoryService::get_category(&state, id).await?))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategoryDto,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Validation error or duplicate name", body = ErrorEnvelope),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorEnvelope),
        (status = 403, description = "Insufficient permissions", body = ErrorEnvelope)
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
#[instrument(skip(state, dto))]
pub async fn create_category(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateCategoryDto>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let category = CategoryService::create_category(&state, dto).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Update a category
#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(("id" = CategoryId, Path, description = "Category ID")),
    request_body = UpdateCategoryDto,
    responses(
        (status = 200, description = "Updated category", body = Category),
        (status = 400, description = "Validation error or duplicate name", body = ErrorEnvelope),
        (status = 403, description = "Insufficient permissions", body = ErrorEnvelope),
        (status = 404, description = "Category not found", body = ErrorEnvelope)
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
#[instrument(skip(state, dto))]
pub async fn update_category(
    State(state): State<AppState>,
    IdPath(id): IdPath<CategoryId>,
    ValidatedJson(dto): ValidatedJson<UpdateCategoryDto>,
) -> Result<Json<Category>, AppError> {
    Ok(Json(CategoryService::update_category(&state, id, dto).await?))
}

/// Delete a category
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = CategoryId, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 403, description = "Insufficient permissions", body = ErrorEnvelope),
        (status = 404, description = "Category not found", body = ErrorEnvelope)
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
#[instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    IdPath(id): IdPath<CategoryId>,
) -> Result<StatusCode, AppError> {
    CategoryService::delete_category(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
