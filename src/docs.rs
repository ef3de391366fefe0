use inkwell_auth::Role;
use inkwell_core::{ErrorDetails, ErrorEnvelope, FieldError, PaginationMeta, PaginationParams};
use inkwell_models::{
    AuthResponse, Category, ChangePasswordRequest, CreateCategoryDto, CreatePostDto,
    ForgotPasswordRequest, LoginRequest, MessageResponse, PaginatedPostsResponse,
    PaginatedUsersResponse, Post, PostStatus, PublicUser, RegisterRequest, ResetPasswordRequest,
    UpdateCategoryDto, UpdatePostDto, UpdateRoleDto, UpdateStatusDto, UpdateUserDto, User,
    UserProfile,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::posts::controller::CoverForm;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register,
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::me,
        crate::modules::auth::controller::change_password,
        crate::modules::auth::controller::forgot_password,
        crate::modules::auth::controller::reset_password,
        crate::modules::users::controller::list_users,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::delete_user,
        crate::modules::users::controller::update_status,
        crate::modules::users::controller::update_role,
        crate::modules::posts::controller::list_posts,
        crate::modules::posts::controller::get_post,
        crate::modules::posts::controller::create_post,
        crate::modules::posts::controller::update_post,
        crate::modules::posts::controller::delete_post,
        crate::modules::posts::controller::upload_cover,
        crate::modules::categories::controller::list_categories,
        crate::modules::categories::controller::get_category,
        crate::modules::categories::controller::create_category,
        crate::modules::categories::controller::update_category,
        crate::modules::categories::controller::delete_category,
    ),
    components(
        schemas(
            ErrorEnvelope,
            ErrorDetails,
            FieldError,
            PaginationMeta,
            PaginationParams,
            Role,
            User,
            PublicUser,
            UserProfile,
            UpdateUserDto,
            UpdateStatusDto,
            UpdateRoleDto,
            PaginatedUsersResponse,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            ChangePasswordRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            MessageResponse,
            Post,
            PostStatus,
            CreatePostDto,
            UpdatePostDto,
            PaginatedPostsResponse,
            CoverForm,
            Category,
            CreateCategoryDto,
            UpdateCategoryDto,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and password management"),
        (name = "Users", description = "User profiles and account administration"),
        (name = "Posts", description = "Blog posts and cover images"),
        (name = "Categories", description = "Post categories")
    ),
    info(
        title = "Inkwell API",
        version = "0.1.0",
        description = "Blog backend built with Rust, Axum, and PostgreSQL. Every error response uses the same JSON envelope.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
