//! # Inkwell Models
//!
//! Domain records and request/response DTOs for the Inkwell API.
//!
//! - [`ids`]: Typed identifiers ([`UserId`], [`PostId`], [`CategoryId`])
//! - [`users`]: Accounts, credentials and profile updates
//! - [`auth`]: Register, login and password flows
//! - [`posts`]: Posts, visibility rules and slugs
//! - [`categories`]: Post categories
//!
//! Request DTOs carry `validator` rules and `utoipa` schemas. Records that
//! map to database rows implement `sqlx::FromRow`.

pub mod auth;
pub mod categories;
pub mod ids;
pub mod posts;
pub mod users;

// Re-export commonly used types at crate root
pub use auth::{
    AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, MessageResponse,
    PasswordReset, RegisterRequest, ResetPasswordRequest,
};
pub use categories::{Category, CreateCategoryDto, UpdateCategoryDto};
pub use ids::{CategoryId, PostId, UserId};
pub use posts::{
    CreatePostDto, NewPost, PaginatedPostsResponse, Post, PostChanges, PostListParams, PostQuery,
    PostStatus, PostViewer, UpdatePostDto, slugify,
};
pub use users::{
    NewUser, PaginatedUsersResponse, PublicUser, UpdateRoleDto, UpdateStatusDto, UpdateUserDto,
    User, UserChanges, UserCredentials, UserProfile,
};
