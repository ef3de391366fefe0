//! Blog post models and DTOs.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use inkwell_core::pagination::deserialize_optional_i64;
use inkwell_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::{CategoryId, PostId, UserId};
use crate::users::User;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            other => Err(format!("Invalid post status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub status: PostStatus,
    pub author_id: UserId,
    pub category_id: Option<CategoryId>,
    /// Public URL of the uploaded cover image
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Published posts are public. Drafts are visible to their author and to
    /// admins only.
    pub fn is_visible_to(&self, viewer: Option<&User>) -> bool {
        match (self.status, viewer) {
            (PostStatus::Published, _) => true,
            (PostStatus::Draft, Some(user)) => user.is_admin() || user.id == self.author_id,
            (PostStatus::Draft, None) => false,
        }
    }
}

impl<'r> FromRow<'r, PgRow> for Post {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let status = status.parse().map_err(|e: String| sqlx::Error::ColumnDecode {
            index: "status".to_string(),
            source: e.into(),
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            slug: row.try_get("slug")?,
            content: row.try_get("content")?,
            excerpt: row.try_get("excerpt")?,
            status,
            author_id: row.try_get("author_id")?,
            category_id: row.try_get("category_id")?,
            cover_image: row.try_get("cover_image")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            published_at: row.try_get("published_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub status: PostStatus,
    pub author_id: UserId,
    pub category_id: Option<CategoryId>,
}

/// Partial post update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub status: Option<PostStatus>,
    pub category_id: Option<CategoryId>,
}

/// Who is asking for a post listing. Decides whether drafts are included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostViewer {
    Anonymous,
    Member(UserId),
    Admin,
}

impl PostViewer {
    pub fn from_user(user: Option<&User>) -> Self {
        match user {
            None => Self::Anonymous,
            Some(user) if user.is_admin() => Self::Admin,
            Some(user) => Self::Member(user.id),
        }
    }
}

/// Filters for listing posts, already resolved against the viewer.
#[derive(Debug, Clone)]
pub struct PostQuery {
    pub viewer: PostViewer,
    pub status: Option<PostStatus>,
    pub author_id: Option<UserId>,
    pub category_id: Option<CategoryId>,
    pub offset: i64,
    pub limit: i64,
}

impl PostQuery {
    /// True when `post` belongs in this listing.
    pub fn matches(&self, post: &Post) -> bool {
        let visible = match self.viewer {
            PostViewer::Admin => true,
            PostViewer::Member(id) => post.status == PostStatus::Published || post.author_id == id,
            PostViewer::Anonymous => post.status == PostStatus::Published,
        };

        visible
            && self.status.is_none_or(|s| post.status == s)
            && self.author_id.is_none_or(|a| post.author_id == a)
            && self.category_id.is_none_or(|c| post.category_id == Some(c))
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePostDto {
    #[validate(length(min = 5, max = 200))]
    #[schema(example = "Writing middleware in axum")]
    pub title: String,
    #[validate(length(min = 1))]
    pub content: String,
    #[validate(length(max = 500))]
    pub excerpt: Option<String>,
    pub status: Option<PostStatus>,
    pub category_id: Option<CategoryId>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdatePostDto {
    #[validate(length(min = 5, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub content: Option<String>,
    #[validate(length(max = 500))]
    pub excerpt: Option<String>,
    pub status: Option<PostStatus>,
    pub category_id: Option<CategoryId>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PostListParams {
    /// Items per page (1-100, default: 10)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    /// Page number (1-indexed, default: 1)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    #[validate(range(min = 1, max = 1_000_000))]
    pub page: Option<i64>,
    pub status: Option<PostStatus>,
    pub author_id: Option<UserId>,
    pub category_id: Option<CategoryId>,
}

impl PostListParams {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            limit: self.limit,
            page: self.page,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedPostsResponse {
    pub data: Vec<Post>,
    pub meta: PaginationMeta,
}

/// Lowercases `title` and joins its alphanumeric runs with single dashes.
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkwell_auth::Role;

    fn user(role: Role) -> User {
        User {
            id: UserId::new(),
            username: "someone".into(),
            email: "someone@example.com".into(),
            role,
            is_active: true,
            bio: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn post(author: UserId, status: PostStatus) -> Post {
        Post {
            id: PostId::new(),
            title: "Hello world".into(),
            slug: "hello-world".into(),
            content: "...".into(),
            excerpt: None,
            status,
            author_id: author,
            category_id: None,
            cover_image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            published_at: None,
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Rust   2024 -- edition "), "rust-2024-edition");
        assert_eq!(slugify("Ünïcode Títle"), "ünïcode-títle");
    }

    #[test]
    fn test_draft_visibility() {
        let author = user(Role::User);
        let stranger = user(Role::User);
        let admin = user(Role::Admin);
        let draft = post(author.id, PostStatus::Draft);

        assert!(draft.is_visible_to(Some(&author)));
        assert!(draft.is_visible_to(Some(&admin)));
        assert!(!draft.is_visible_to(Some(&stranger)));
        assert!(!draft.is_visible_to(None));
    }

    #[test]
    fn test_published_visible_to_everyone() {
        let published = post(UserId::new(), PostStatus::Published);
        assert!(published.is_visible_to(None));
    }

    #[test]
    fn test_query_matches_respects_viewer() {
        let author = user(Role::User);
        let draft = post(author.id, PostStatus::Draft);
        let query = |viewer| PostQuery {
            viewer,
            status: None,
            author_id: None,
            category_id: None,
            offset: 0,
            limit: 10,
        };

        assert!(!query(PostViewer::Anonymous).matches(&draft));
        assert!(query(PostViewer::Member(author.id)).matches(&draft));
        assert!(!query(PostViewer::Member(UserId::new())).matches(&draft));
        assert!(query(PostViewer::Admin).matches(&draft));
    }

    #[test]
    fn test_title_length_rule() {
        let dto = CreatePostDto {
            title: "Tiny".into(),
            content: "body".into(),
            excerpt: None,
            status: None,
            category_id: None,
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }
}
