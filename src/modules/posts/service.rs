use axum::body::Bytes;
use inkwell_core::{AppError, PaginationMeta};
use inkwell_models::{
    CreatePostDto, NewPost, PaginatedPostsResponse, Post, PostChanges, PostId, PostListParams,
    PostQuery, PostViewer, UpdatePostDto, User, slugify,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::middleware::ownership::ensure_owner;
use crate::state::AppState;

/// A validated cover image, ready to store.
#[derive(Debug)]
pub struct CoverUpload {
    pub extension: &'static str,
    pub bytes: Bytes,
}

pub struct PostService;

impl PostService {
    #[instrument(skip(state, viewer))]
    pub async fn list_posts(
        state: &AppState,
        params: PostListParams,
        viewer: Option<&User>,
    ) -> Result<PaginatedPostsResponse, AppError> {
        let pagination = params.pagination();
        let query = PostQuery {
            viewer: PostViewer::from_user(viewer),
            status: params.status,
            author_id: params.author_id,
            category_id: params.category_id,
            offset: pagination.offset(),
            limit: pagination.limit(),
        };

        let (data, total) = state.storage.posts.list(query).await?;

        Ok(PaginatedPostsResponse {
            data,
            meta: PaginationMeta::new(&pagination, total),
        })
    }

    /// Drafts the viewer may not see answer exactly like missing posts.
    #[instrument(skip(state, viewer))]
    pub async fn get_post(
        state: &AppState,
        id: PostId,
        viewer: Option<&User>,
    ) -> Result<Post, AppError> {
        state
            .storage
            .posts
            .find_by_id(id)
            .await?
            .filter(|post| post.is_visible_to(viewer))
            .ok_or_else(post_not_found)
    }

    #[instrument(skip(state, author, dto), fields(author_id = %author.id))]
    pub async fn create_post(
        state: &AppState,
        author: &User,
        dto: CreatePostDto,
    ) -> Result<Post, AppError> {
        let title = dto.title.trim().to_string();
        let slug = slug_for(&title)?;

        let post = state
            .storage
            .posts
            .create(NewPost {
                title,
                slug,
                content: dto.content,
                excerpt: dto.excerpt,
                status: dto.status.unwrap_or_default(),
                author_id: author.id,
                category_id: dto.category_id,
            })
            .await?;

        info!(post_id = %post.id, "Post created");
        Ok(post)
    }

    #[instrument(skip(state, user, dto), fields(user_id = %user.id))]
    pub async fn update_post(
        state: &AppState,
        user: &User,
        id: PostId,
        dto: UpdatePostDto,
    ) -> Result<Post, AppError> {
        Self::load_owned(state, user, id).await?;

        let title = dto.title.map(|t| t.trim().to_string());
        let slug = title.as_deref().map(slug_for).transpose()?;

        let post = state
            .storage
            .posts
            .update(
                id,
                PostChanges {
                    title,
                    slug,
                    content: dto.content,
                    excerpt: dto.excerpt,
                    status: dto.status,
                    category_id: dto.category_id,
                },
            )
            .await?
            .ok_or_else(post_not_found)?;

        info!(post_id = %post.id, "Post updated");
        Ok(post)
    }

    #[instrument(skip(state, user), fields(user_id = %user.id))]
    pub async fn delete_post(state: &AppState, user: &User, id: PostId) -> Result<(), AppError> {
        let post = Self::load_owned(state, user, id).await?;

        if !state.storage.posts.delete(id).await? {
            return Err(post_not_found());
        }
        if let Some(url) = post.cover_image.as_deref() {
            remove_cover_file(state, url).await;
        }

        info!(post_id = %id, "Post deleted");
        Ok(())
    }

    /// Stores the new cover and replaces any earlier one.
    #[instrument(skip(state, user, upload), fields(user_id = %user.id, size = upload.bytes.len()))]
    pub async fn set_cover(
        state: &AppState,
        user: &User,
        id: PostId,
        upload: CoverUpload,
    ) -> Result<Post, AppError> {
        let existing = Self::load_owned(state, user, id).await?;

        let key = format!(
            "covers/{id}-{}.{}",
            Uuid::new_v4().simple(),
            upload.extension
        );
        let key = state.files.save(&key, &upload.bytes).await?;
        let url = state.files.url(&key)?;

        let post = match state.storage.posts.set_cover_image(id, Some(url.clone())).await {
            Ok(Some(post)) => post,
            outcome => {
                // The post vanished or the write failed; don't leave the file behind.
                remove_cover_file(state, &url).await;
                return Err(match outcome {
                    Err(err) => err.into(),
                    Ok(_) => post_not_found(),
                });
            }
        };

        if let Some(previous) = existing.cover_image.as_deref() {
            remove_cover_file(state, previous).await;
        }

        info!(post_id = %post.id, "Cover image updated");
        Ok(post)
    }

    /// Loads a post for modification: invisible posts are 404, posts of
    /// other authors are 403 unless the caller is an admin.
    async fn load_owned(state: &AppState, user: &User, id: PostId) -> Result<Post, AppError> {
        let post = Self::get_post(state, id, Some(user)).await?;
        ensure_owner(user, post.author_id, "You can only modify your own posts")?;
        Ok(post)
    }
}

fn post_not_found() -> AppError {
    AppError::not_found("Post not found")
}

fn slug_for(title: &str) -> Result<String, AppError> {
    let slug = slugify(title);
    if slug.is_empty() {
        return Err(AppError::bad_request("Title must contain at least one letter or number"));
    }
    Ok(slug)
}

async fn remove_cover_file(state: &AppState, url: &str) {
    let Some(key) = state.files.key_from_url(url) else {
        return;
    };
    if let Err(err) = state.files.delete(key).await {
        warn!(url, error = %err, "Failed to remove cover image file");
    }
}
