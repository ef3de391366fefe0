use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use inkwell_core::{AppError, ErrorEnvelope};
use inkwell_models::{
    CreatePostDto, PaginatedPostsResponse, Post, PostId, PostListParams, UpdatePostDto,
};
use tracing::instrument;
use utoipa::ToSchema;

use super::service::{CoverUpload, PostService};
use crate::middleware::auth::{CurrentUser, MaybeUser};
use crate::state::AppState;
use crate::utils::file_storage::{ALLOWED_IMAGE_TYPES, image_extension};
use crate::validator::{IdPath, ValidatedJson, ValidatedQuery};

/// Multipart field that carries the cover image.
pub const COVER_FIELD: &str = "cover";

/// Shape of the cover upload form, for the API docs.
#[derive(ToSchema)]
pub struct CoverForm {
    #[schema(value_type = String, format = Binary)]
    pub cover: Vec<u8>,
}

/// List posts
///
/// Anonymous callers only see published posts. Authenticated callers also
/// see their own drafts, admins see everything.
#[utoipa::path(
    get,
    path = "/api/posts",
    params(PostListParams),
    responses(
        (status = 200, description = "One page of posts", body = PaginatedPostsResponse),
        (status = 400, description = "Invalid query parameters", body = ErrorEnvelope)
    ),
    tag = "Posts"
)]
#[instrument(skip(state, viewer))]
pub async fn list_posts(
    State(state): State<AppState>,
    viewer: MaybeUser,
    ValidatedQuery(params): ValidatedQuery<PostListParams>,
) -> Result<Json<PaginatedPostsResponse>, AppError> {
    Ok(Json(PostService::list_posts(&state, params, viewer.user()).await?))
}

/// Get a post
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    params(("id" = PostId, Path, description = "Post ID")),
    responses(
        (status = 200, description = "The post", body = Post),
        (status = 400, description = "Invalid resource ID format", body = ErrorEnvelope),
        (status = 404, description = "Post not found", body = ErrorEnvelope)
    ),
    tag = "Posts"
)]
#[instrument(skip(state, viewer))]
pub async fn get_post(
    State(state): State<AppState>,
    viewer: MaybeUser,
    IdPath(id): IdPath<PostId>,
) -> Result<Json<Post>, AppError> {
    Ok(Json(PostService::get_post(&state, id, viewer.user()).await?))
}

/// Create a post
#[utoipa::path(
    post,
    path = "/api/posts",
    request_body = CreatePostDto,
    responses(
        (status = 201, description = "Post created", body = Post),
        (status = 400, description = "Validation error, duplicate slug or unknown category", body = ErrorEnvelope),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorEnvelope)
    ),
    security(("bearer_auth" = [])),
    tag = "Posts"
)]
#[instrument(skip(state, user, dto))]
pub async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(dto): ValidatedJson<CreatePostDto>,
) -> Result<(StatusCode, Json<Post>), AppError> {
    let post = PostService::create_post(&state, &user, dto).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// Update a post
#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    params(("id" = PostId, Path, description = "Post ID")),
    request_body = UpdatePostDto,
    responses(
        (status = 200, description = "Updated post", body = Post),
        (status = 400, description = "Validation error", body = ErrorEnvelope),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorEnvelope),
        (status = 403, description = "Not the author", body = ErrorEnvelope),
        (status = 404, description = "Post not found", body = ErrorEnvelope)
    ),
    security(("bearer_auth" = [])),
    tag = "Posts"
)]
#[instrument(skip(state, user, dto))]
pub async fn update_post(
    State(state): State<AppState>,
    user: CurrentUser,
    IdPath(id): IdPath<PostId>,
    ValidatedJson(dto): ValidatedJson<UpdatePostDto>,
) -> Result<Json<Post>, AppError> {
    Ok(Json(PostService::update_post(&state, &user, id, dto).await?))
}

/// Delete a post
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    params(("id" = PostId, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorEnvelope),
        (status = 403, description = "Not the author", body = ErrorEnvelope),
        (status = 404, description = "Post not found", body = ErrorEnvelope)
    ),
    security(("bearer_auth" = [])),
    tag = "Posts"
)]
#[instrument(skip(state, user))]
pub async fn delete_post(
    State(state): State<AppState>,
    user: CurrentUser,
    IdPath(id): IdPath<PostId>,
) -> Result<StatusCode, AppError> {
    PostService::delete_post(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Upload a cover image
///
/// Expects `multipart/form-data` with a single image field named `cover`.
#[utoipa::path(
    put,
    path = "/api/posts/{id}/cover",
    params(("id" = PostId, Path, description = "Post ID")),
    request_body(content = CoverForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Post with the new cover image", body = Post),
        (status = 400, description = "No file, wrong type, unexpected field or file too large", body = ErrorEnvelope),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorEnvelope),
        (status = 403, description = "Not the author", body = ErrorEnvelope),
        (status = 404, description = "Post not found", body = ErrorEnvelope)
    ),
    security(("bearer_auth" = [])),
    tag = "Posts"
)]
#[instrument(skip(state, user, multipart))]
pub async fn upload_cover(
    State(state): State<AppState>,
    user: CurrentUser,
    IdPath(id): IdPath<PostId>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Post>, AppError> {
    let mut multipart = multipart.map_err(|rejection| {
        AppError::bad_request("Expected a multipart/form-data body").with_details(rejection.body_text())
    })?;

    let upload = read_cover(&mut multipart, state.config.upload.max_bytes).await?;
    Ok(Json(PostService::set_cover(&state, &user, id, upload).await?))
}

async fn read_cover(multipart: &mut Multipart, max_bytes: usize) -> Result<CoverUpload, AppError> {
    let mut cover = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name != COVER_FIELD || cover.is_some() {
            return Err(AppError::UnexpectedField(name));
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let Some(extension) = image_extension(&content_type) else {
            let accepted = ALLOWED_IMAGE_TYPES
                .iter()
                .map(|(mime, _)| *mime)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(AppError::bad_request("Only image files are allowed")
                .with_details(format!("Accepted types: {accepted}")));
        };

        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.len() > max_bytes {
            return Err(AppError::PayloadTooLarge);
        }

        cover = Some(CoverUpload { extension, bytes });
    }

    cover.ok_or_else(|| AppError::bad_request("No file uploaded"))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::bad_request("Malformed multipart body").with_details(err.body_text())
    }
}
