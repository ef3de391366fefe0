//! The storage contract the HTTP layer is written against.
//!
//! Each resource has its own trait so handlers depend only on what they use.
//! Both [`PgStore`](crate::postgres::PgStore) and
//! [`MemoryStore`](crate::memory::MemoryStore) implement all three.
//!
//! Reads return `Ok(None)` for a missing row. Mutations that target a row by
//! id return `Ok(None)` (or `false`) when the row does not exist, leaving the
//! "not found" wording to the caller.

use std::future::Future;
use std::pin::Pin;

use inkwell_auth::Role;
use inkwell_core::Conflict;
use inkwell_models::{
    Category, CategoryId, CreateCategoryDto, NewPost, NewUser, PasswordReset, Post, PostChanges,
    PostId, PostQuery, UpdateCategoryDto, User, UserChanges, UserCredentials, UserId,
};

use crate::error::StoreResult;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait UserStore: Send + Sync {
    /// Loads a user without the password hash.
    fn find_by_id(&self, id: UserId) -> BoxFuture<'_, StoreResult<Option<User>>>;

    fn find_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, StoreResult<Option<User>>>;

    /// Loads credentials by email (case-insensitive) or exact username.
    fn find_credentials<'a>(
        &'a self,
        identifier: &'a str,
    ) -> BoxFuture<'a, StoreResult<Option<UserCredentials>>>;

    fn find_credentials_by_id(
        &self,
        id: UserId,
    ) -> BoxFuture<'_, StoreResult<Option<UserCredentials>>>;

    /// Returns every field of `(username, email)` already taken by another
    /// account.
    fn find_conflicts<'a>(
        &'a self,
        username: &'a str,
        email: &'a str,
    ) -> BoxFuture<'a, StoreResult<Vec<Conflict>>>;

    fn create(&self, user: NewUser) -> BoxFuture<'_, StoreResult<User>>;

    /// Returns one page of users, oldest first, and the total count.
    fn list(&self, offset: i64, limit: i64) -> BoxFuture<'_, StoreResult<(Vec<User>, i64)>>;

    fn update(&self, id: UserId, changes: UserChanges)
    -> BoxFuture<'_, StoreResult<Option<User>>>;

    fn set_password_hash(&self, id: UserId, hash: String) -> BoxFuture<'_, StoreResult<bool>>;

    fn set_active(&self, id: UserId, active: bool) -> BoxFuture<'_, StoreResult<Option<User>>>;

    fn set_role(&self, id: UserId, role: Role) -> BoxFuture<'_, StoreResult<Option<User>>>;

    /// Deletes the account together with its posts and reset tokens.
    fn delete(&self, id: UserId) -> BoxFuture<'_, StoreResult<bool>>;

    /// Stores a reset token digest, replacing any earlier one for the user.
    fn save_password_reset(&self, reset: PasswordReset) -> BoxFuture<'_, StoreResult<()>>;

    /// Removes and returns the reset matching `token_hash`. A token can be
    /// taken at most once.
    fn take_password_reset<'a>(
        &'a self,
        token_hash: &'a str,
    ) -> BoxFuture<'a, StoreResult<Option<PasswordReset>>>;
}

pub trait PostStore: Send + Sync {
    fn find_by_id(&self, id: PostId) -> BoxFuture<'_, StoreResult<Option<Post>>>;

    /// Returns one page of matching posts, newest first, and the total count.
    fn list(&self, query: PostQuery) -> BoxFuture<'_, StoreResult<(Vec<Post>, i64)>>;

    fn create(&self, post: NewPost) -> BoxFuture<'_, StoreResult<Post>>;

    /// Applies `changes`. Moving a post to published for the first time
    /// stamps `published_at`.
    fn update(&self, id: PostId, changes: PostChanges)
    -> BoxFuture<'_, StoreResult<Option<Post>>>;

    fn set_cover_image(
        &self,
        id: PostId,
        url: Option<String>,
    ) -> BoxFuture<'_, StoreResult<Option<Post>>>;

    fn delete(&self, id: PostId) -> BoxFuture<'_, StoreResult<bool>>;
}

pub trait CategoryStore: Send + Sync {
    fn find_by_id(&self, id: CategoryId) -> BoxFuture<'_, StoreResult<Option<Category>>>;

    /// All categories ordered by name.
    fn list(&self) -> BoxFuture<'_, StoreResult<Vec<Category>>>;

    fn create(&self, category: CreateCategoryDto) -> BoxFuture<'_, StoreResult<Category>>;

    fn update(
        &self,
        id: CategoryId,
        changes: UpdateCategoryDto,
    ) -> BoxFuture<'_, StoreResult<Option<Category>>>;

    /// Deletes the category. Posts in it become uncategorized.
    fn delete(&self, id: CategoryId) -> BoxFuture<'_, StoreResult<bool>>;
}
