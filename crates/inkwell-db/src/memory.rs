//! In-memory storage backend.
//!
//! Used by the test suite and when no `DATABASE_URL` is configured. All
//! three stores share one state behind a single `RwLock`, and every mutation
//! runs its uniqueness and reference checks under the same write guard it
//! writes with, so concurrent inserts of the same key produce exactly one
//! winner, as a unique index would.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use inkwell_auth::Role;
use inkwell_core::Conflict;
use inkwell_models::{
    Category, CategoryId, CreateCategoryDto, NewPost, NewUser, PasswordReset, Post, PostChanges,
    PostId, PostQuery, PostStatus, UpdateCategoryDto, User, UserChanges, UserCredentials, UserId,
};
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::store::{BoxFuture, CategoryStore, PostStore, UserStore};

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, UserCredentials>,
    posts: HashMap<PostId, Post>,
    categories: HashMap<CategoryId, Category>,
    resets: HashMap<UserId, PasswordReset>,
}

impl State {
    fn user_conflicts(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        except: Option<UserId>,
    ) -> Vec<Conflict> {
        let others = || {
            self.users
                .values()
                .map(|c| &c.user)
                .filter(move |u| Some(u.id) != except)
        };

        let mut conflicts = Vec::new();
        if let Some(username) = username {
            if others().any(|u| u.username == username) {
                conflicts.push(Conflict::new("username", username));
            }
        }
        if let Some(email) = email {
            if others().any(|u| u.email.eq_ignore_ascii_case(email)) {
                conflicts.push(Conflict::new("email", email));
            }
        }
        conflicts
    }

    fn slug_taken(&self, slug: &str, except: Option<PostId>) -> bool {
        self.posts
            .values()
            .any(|p| p.slug == slug && Some(p.id) != except)
    }

    fn category_name_taken(&self, name: &str, except: Option<CategoryId>) -> bool {
        self.categories
            .values()
            .any(|c| c.name == name && Some(c.id) != except)
    }

    fn check_category(&self, id: Option<CategoryId>) -> StoreResult<()> {
        match id {
            Some(id) if !self.categories.contains_key(&id) => Err(StoreError::MissingReference(
                "posts_category_id_fkey".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn user_mut(&mut self, id: UserId) -> Option<&mut User> {
        self.users.get_mut(&id).map(|c| &mut c.user)
    }
}

fn page<T>(items: Vec<T>, offset: i64, limit: i64) -> Vec<T> {
    let offset = usize::try_from(offset).unwrap_or(0);
    let limit = usize::try_from(limit).unwrap_or(0);
    items.into_iter().skip(offset).take(limit).collect()
}

fn count(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for MemoryStore {
    fn find_by_id(&self, id: UserId) -> BoxFuture<'_, StoreResult<Option<User>>> {
        Box::pin(async move {
            let state = self.state.read().await;
            Ok(state.users.get(&id).map(|c| c.user.clone()))
        })
    }

    fn find_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, StoreResult<Option<User>>> {
        Box::pin(async move {
            let state = self.state.read().await;
            Ok(state
                .users
                .values()
                .find(|c| c.user.email.eq_ignore_ascii_case(email))
                .map(|c| c.user.clone()))
        })
    }

    fn find_credentials<'a>(
        &'a self,
        identifier: &'a str,
    ) -> BoxFuture<'a, StoreResult<Option<UserCredentials>>> {
        Box::pin(async move {
            let state = self.state.read().await;
            Ok(state
                .users
                .values()
                .find(|c| {
                    c.user.email.eq_ignore_ascii_case(identifier) || c.user.username == identifier
                })
                .cloned())
        })
    }

    fn find_credentials_by_id(
        &self,
        id: UserId,
    ) -> BoxFuture<'_, StoreResult<Option<UserCredentials>>> {
        Box::pin(async move {
            let state = self.state.read().await;
            Ok(state.users.get(&id).cloned())
        })
    }

    fn find_conflicts<'a>(
        &'a self,
        username: &'a str,
        email: &'a str,
    ) -> BoxFuture<'a, StoreResult<Vec<Conflict>>> {
        Box::pin(async move {
            let state = self.state.read().await;
            Ok(state.user_conflicts(Some(username), Some(email), None))
        })
    }

    fn create(&self, new: NewUser) -> BoxFuture<'_, StoreResult<User>> {
        Box::pin(async move {
            let mut state = self.state.write().await;

            let conflicts = state.user_conflicts(Some(&new.username), Some(&new.email), None);
            if !conflicts.is_empty() {
                return Err(StoreError::UniqueViolation(conflicts));
            }

            let now = Utc::now();
            let user = User {
                id: UserId::new(),
                username: new.username,
                email: new.email,
                role: new.role,
                is_active: true,
                bio: None,
                created_at: now,
                updated_at: now,
            };
            state.users.insert(
                user.id,
                UserCredentials {
                    user: user.clone(),
                    password_hash: new.password_hash,
                },
            );
            Ok(user)
        })
    }

    fn list(&self, offset: i64, limit: i64) -> BoxFuture<'_, StoreResult<(Vec<User>, i64)>> {
        Box::pin(async move {
            let state = self.state.read().await;
            let mut users: Vec<User> = state.users.values().map(|c| c.user.clone()).collect();
            users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            let total = count(users.len());
            Ok((page(users, offset, limit), total))
        })
    }

    fn update(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> BoxFuture<'_, StoreResult<Option<User>>> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            if !state.users.contains_key(&id) {
                return Ok(None);
            }

            let conflicts = state.user_conflicts(
                changes.username.as_deref(),
                changes.email.as_deref(),
                Some(id),
            );
            if !conflicts.is_empty() {
                return Err(StoreError::UniqueViolation(conflicts));
            }

            let Some(user) = state.user_mut(id) else {
                return Ok(None);
            };
            if let Some(username) = changes.username {
                user.username = username;
            }
            if let Some(email) = changes.email {
                user.email = email;
            }
            if let Some(bio) = changes.bio {
                user.bio = Some(bio);
            }
            user.updated_at = Utc::now();
            Ok(Some(user.clone()))
        })
    }

    fn set_password_hash(&self, id: UserId, hash: String) -> BoxFuture<'_, StoreResult<bool>> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            match state.users.get_mut(&id) {
                Some(credentials) => {
                    credentials.password_hash = hash;
                    credentials.user.updated_at = Utc::now();
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn set_active(&self, id: UserId, active: bool) -> BoxFuture<'_, StoreResult<Option<User>>> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            Ok(state.user_mut(id).map(|user| {
                user.is_active = active;
                user.updated_at = Utc::now();
                user.clone()
            }))
        })
    }

    fn set_role(&self, id: UserId, role: Role) -> BoxFuture<'_, StoreResult<Option<User>>> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            Ok(state.user_mut(id).map(|user| {
                user.role = role;
                user.updated_at = Utc::now();
                user.clone()
            }))
        })
    }

    fn delete(&self, id: UserId) -> BoxFuture<'_, StoreResult<bool>> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            if state.users.remove(&id).is_none() {
                return Ok(false);
            }
            state.posts.retain(|_, post| post.author_id != id);
            state.resets.remove(&id);
            Ok(true)
        })
    }

    fn save_password_reset(&self, reset: PasswordReset) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            if !state.users.contains_key(&reset.user_id) {
                return Err(StoreError::MissingReference(
                    "password_resets_user_id_fkey".to_string(),
                ));
            }
            state.resets.insert(reset.user_id, reset);
            Ok(())
        })
    }

    fn take_password_reset<'a>(
        &'a self,
        token_hash: &'a str,
    ) -> BoxFuture<'a, StoreResult<Option<PasswordReset>>> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            let user_id = state
                .resets
                .values()
                .find(|r| r.token_hash == token_hash)
                .map(|r| r.user_id);
            Ok(user_id.and_then(|id| state.resets.remove(&id)))
        })
    }
}

impl PostStore for MemoryStore {
    fn find_by_id(&self, id: PostId) -> BoxFuture<'_, StoreResult<Option<Post>>> {
        Box::pin(async move {
            let state = self.state.read().await;
            Ok(state.posts.get(&id).cloned())
        })
    }

    fn list(&self, query: PostQuery) -> BoxFuture<'_, StoreResult<(Vec<Post>, i64)>> {
        Box::pin(async move {
            let state = self.state.read().await;
            let mut posts: Vec<Post> = state
                .posts
                .values()
                .filter(|p| query.matches(p))
                .cloned()
                .collect();
            posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
            let total = count(posts.len());
            Ok((page(posts, query.offset, query.limit), total))
        })
    }

    fn create(&self, new: NewPost) -> BoxFuture<'_, StoreResult<Post>> {
        Box::pin(async move {
            let mut state = self.state.write().await;

            if state.slug_taken(&new.slug, None) {
                return Err(StoreError::UniqueViolation(vec![Conflict::new(
                    "slug", &new.slug,
                )]));
            }
            if !state.users.contains_key(&new.author_id) {
                return Err(StoreError::MissingReference(
                    "posts_author_id_fkey".to_string(),
                ));
            }
            state.check_category(new.category_id)?;

            let now = Utc::now();
            let post = Post {
                id: PostId::new(),
                title: new.title,
                slug: new.slug,
                content: new.content,
                excerpt: new.excerpt,
                status: new.status,
                author_id: new.author_id,
                category_id: new.category_id,
                cover_image: None,
                created_at: now,
                updated_at: now,
                published_at: (new.status == PostStatus::Published).then_some(now),
            };
            state.posts.insert(post.id, post.clone());
            Ok(post)
        })
    }

    fn update(
        &self,
        id: PostId,
        changes: PostChanges,
    ) -> BoxFuture<'_, StoreResult<Option<Post>>> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            if !state.posts.contains_key(&id) {
                return Ok(None);
            }
            if let Some(slug) = &changes.slug {
                if state.slug_taken(slug, Some(id)) {
                    return Err(StoreError::UniqueViolation(vec![Conflict::new("slug", slug)]));
                }
            }
            state.check_category(changes.category_id)?;

            let Some(post) = state.posts.get_mut(&id) else {
                return Ok(None);
            };
            let now = Utc::now();
            if let Some(title) = changes.title {
                post.title = title;
            }
            if let Some(slug) = changes.slug {
                post.slug = slug;
            }
            if let Some(content) = changes.content {
                post.content = content;
            }
            if let Some(excerpt) = changes.excerpt {
                post.excerpt = Some(excerpt);
            }
            if let Some(status) = changes.status {
                if status == PostStatus::Published && post.published_at.is_none() {
                    post.published_at = Some(now);
                }
                post.status = status;
            }
            if let Some(category_id) = changes.category_id {
                post.category_id = Some(category_id);
            }
            post.updated_at = now;
            Ok(Some(post.clone()))
        })
    }

    fn set_cover_image(
        &self,
        id: PostId,
        url: Option<String>,
    ) -> BoxFuture<'_, StoreResult<Option<Post>>> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            Ok(state.posts.get_mut(&id).map(|post| {
                post.cover_image = url;
                post.updated_at = Utc::now();
                post.clone()
            }))
        })
    }

    fn delete(&self, id: PostId) -> BoxFuture<'_, StoreResult<bool>> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            Ok(state.posts.remove(&id).is_some())
        })
    }
}

impl CategoryStore for MemoryStore {
    fn find_by_id(&self, id: CategoryId) -> BoxFuture<'_, StoreResult<Option<Category>>> {
        Box::pin(async move {
            let state = self.state.read().await;
            Ok(state.categories.get(&id).cloned())
        })
    }

    fn list(&self) -> BoxFuture<'_, StoreResult<Vec<Category>>> {
        Box::pin(async move {
            let state = self.state.read().await;
            let mut categories: Vec<Category> = state.categories.values().cloned().collect();
            categories.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(categories)
        })
    }

    fn create(&self, dto: CreateCategoryDto) -> BoxFuture<'_, StoreResult<Category>> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            if state.category_name_taken(&dto.name, None) {
                return Err(StoreError::UniqueViolation(vec![Conflict::new(
                    "name", &dto.name,
                )]));
            }

            let now = Utc::now();
            let category = Category {
                id: CategoryId::new(),
                name: dto.name,
                description: dto.description,
                created_at: now,
                updated_at: now,
            };
            state.categories.insert(category.id, category.clone());
            Ok(category)
        })
    }

    fn update(
        &self,
        id: CategoryId,
        changes: UpdateCategoryDto,
    ) -> BoxFuture<'_, StoreResult<Option<Category>>> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            if let Some(name) = &changes.name {
                if state.category_name_taken(name, Some(id)) {
                    return Err(StoreError::UniqueViolation(vec![Conflict::new("name", name)]));
                }
            }

            Ok(state.categories.get_mut(&id).map(|category| {
                if let Some(name) = changes.name {
                    category.name = name;
                }
                if let Some(description) = changes.description {
                    category.description = Some(description);
                }
                category.updated_at = Utc::now();
                category.clone()
            }))
        })
    }

    fn delete(&self, id: CategoryId) -> BoxFuture<'_, StoreResult<bool>> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            if state.categories.remove(&id).is_none() {
                return Ok(false);
            }
            for post in state.posts.values_mut() {
                if post.category_id == Some(id) {
                    post.category_id = None;
                }
            }
            Ok(true)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role: Role::User,
        }
    }

    fn new_post(author_id: UserId, slug: &str) -> NewPost {
        NewPost {
            title: "Some title".to_string(),
            slug: slug.to_string(),
            content: "body".to_string(),
            excerpt: None,
            status: PostStatus::Draft,
            author_id,
            category_id: None,
        }
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_registrations_have_one_winner() {
        let store = MemoryStore::new();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    UserStore::create(&store, new_user("ada", "ada@example.com")).await
                })
            })
            .collect();

        let mut successes = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(StoreError::UniqueViolation(_)) => duplicates += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(duplicates, 7);
    }

    #[tokio::test]
    async fn test_conflicts_report_every_field() {
        let store = MemoryStore::new();
        UserStore::create(&store, new_user("ada", "ada@example.com"))
            .await
            .unwrap();

        let conflicts = store.find_conflicts("ada", "ADA@example.com").await.unwrap();
        let fields: Vec<_> = conflicts.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["username", "email"]);
    }

    #[tokio::test]
    async fn test_find_credentials_by_username_or_email() {
        let store = MemoryStore::new();
        let user = UserStore::create(&store, new_user("ada", "ada@example.com"))
            .await
            .unwrap();

        let by_name = store.find_credentials("ada").await.unwrap().unwrap();
        let by_email = store.find_credentials("Ada@Example.com").await.unwrap().unwrap();
        assert_eq!(by_name.user.id, user.id);
        assert_eq!(by_email.user.id, user.id);
        assert!(store.find_credentials("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reset_token_is_taken_once() {
        let store = MemoryStore::new();
        let user = UserStore::create(&store, new_user("ada", "ada@example.com"))
            .await
            .unwrap();

        store
            .save_password_reset(PasswordReset {
                user_id: user.id,
                token_hash: "digest".to_string(),
                expires_at: Utc::now() + Duration::hours(1),
            })
            .await
            .unwrap();

        assert!(store.take_password_reset("digest").await.unwrap().is_some());
        assert!(store.take_password_reset("digest").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deleting_user_removes_their_posts() {
        let store = MemoryStore::new();
        let user = UserStore::create(&store, new_user("ada", "ada@example.com"))
            .await
            .unwrap();
        let post = PostStore::create(&store, new_post(user.id, "first-post"))
            .await
            .unwrap();

        assert!(UserStore::delete(&store, user.id).await.unwrap());
        assert!(PostStore::find_by_id(&store, post.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_unique_violation() {
        let store = MemoryStore::new();
        let user = UserStore::create(&store, new_user("ada", "ada@example.com"))
            .await
            .unwrap();
        PostStore::create(&store, new_post(user.id, "same"))
            .await
            .unwrap();

        let err = PostStore::create(&store, new_post(user.id, "same"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(c) if c[0].field == "slug"));
    }

    #[tokio::test]
    async fn test_unknown_category_is_missing_reference() {
        let store = MemoryStore::new();
        let user = UserStore::create(&store, new_user("ada", "ada@example.com"))
            .await
            .unwrap();

        let mut post = new_post(user.id, "with-category");
        post.category_id = Some(CategoryId::new());
        let err = PostStore::create(&store, post).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingReference(_)));
    }

    #[tokio::test]
    async fn test_deleting_category_uncategorizes_posts() {
        let store = MemoryStore::new();
        let user = UserStore::create(&store, new_user("ada", "ada@example.com"))
            .await
            .unwrap();
        let category = CategoryStore::create(
            &store,
            CreateCategoryDto {
                name: "Rust".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();

        let mut post = new_post(user.id, "categorized");
        post.category_id = Some(category.id);
        let post = PostStore::create(&store, post).await.unwrap();

        assert!(CategoryStore::delete(&store, category.id).await.unwrap());
        let post = PostStore::find_by_id(&store, post.id).await.unwrap().unwrap();
        assert_eq!(post.category_id, None);
    }
}
