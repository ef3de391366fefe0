//! PostgreSQL storage backend.
//!
//! Uniqueness and referential integrity are left to the schema in
//! `migrations/`; violations come back as [`StoreError`] through its `From`
//! impl for `sqlx::Error`.

use inkwell_auth::Role;
use inkwell_core::Conflict;
use inkwell_models::{
    Category, CategoryId, CreateCategoryDto, NewPost, NewUser, PasswordReset, Post, PostChanges,
    PostId, PostQuery, PostViewer, UpdateCategoryDto, User, UserChanges, UserCredentials, UserId,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use crate::error::StoreResult;
use crate::store::{BoxFuture, CategoryStore, PostStore, UserStore};

const USER_COLUMNS: &str = "id, username, email, role, is_active, bio, created_at, updated_at";
const CREDENTIAL_COLUMNS: &str =
    "id, username, email, role, is_active, bio, created_at, updated_at, password_hash";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserStore for PgStore {
    #[instrument(skip(self))]
    fn find_by_id(&self, id: UserId) -> BoxFuture<'_, StoreResult<Option<User>>> {
        Box::pin(async move {
            let user = sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
            ))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(user)
        })
    }

    fn find_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, StoreResult<Option<User>>> {
        Box::pin(async move {
            let user = sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
            ))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
            Ok(user)
        })
    }

    fn find_credentials<'a>(
        &'a self,
        identifier: &'a str,
    ) -> BoxFuture<'a, StoreResult<Option<UserCredentials>>> {
        Box::pin(async move {
            let credentials = sqlx::query_as::<_, UserCredentials>(&format!(
                "SELECT {CREDENTIAL_COLUMNS} FROM users \
                 WHERE LOWER(email) = LOWER($1) OR username = $1 \
                 LIMIT 1"
            ))
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?;
            Ok(credentials)
        })
    }

    fn find_credentials_by_id(
        &self,
        id: UserId,
    ) -> BoxFuture<'_, StoreResult<Option<UserCredentials>>> {
        Box::pin(async move {
            let credentials = sqlx::query_as::<_, UserCredentials>(&format!(
                "SELECT {CREDENTIAL_COLUMNS} FROM users WHERE id = $1"
            ))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(credentials)
        })
    }

    fn find_conflicts<'a>(
        &'a self,
        username: &'a str,
        email: &'a str,
    ) -> BoxFuture<'a, StoreResult<Vec<Conflict>>> {
        Box::pin(async move {
            let (username_taken, email_taken): (bool, bool) = sqlx::query_as(
                "SELECT \
                   EXISTS(SELECT 1 FROM users WHERE username = $1), \
                   EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($2))",
            )
            .bind(username)
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

            let mut conflicts = Vec::new();
            if username_taken {
                conflicts.push(Conflict::new("username", username));
            }
            if email_taken {
                conflicts.push(Conflict::new("email", email));
            }
            Ok(conflicts)
        })
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    fn create(&self, user: NewUser) -> BoxFuture<'_, StoreResult<User>> {
        Box::pin(async move {
            let user = sqlx::query_as::<_, User>(&format!(
                "INSERT INTO users (username, email, password_hash, role) \
                 VALUES ($1, $2, $3, $4) \
                 RETURNING {USER_COLUMNS}"
            ))
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .fetch_one(&self.pool)
            .await?;
            Ok(user)
        })
    }

    fn list(&self, offset: i64, limit: i64) -> BoxFuture<'_, StoreResult<(Vec<User>, i64)>> {
        Box::pin(async move {
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
                .fetch_one(&self.pool)
                .await?;

            let users = sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM users \
                 ORDER BY created_at, id \
                 LIMIT $1 OFFSET $2"
            ))
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

            Ok((users, total))
        })
    }

    fn update(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> BoxFuture<'_, StoreResult<Option<User>>> {
        Box::pin(async move {
            let user = sqlx::query_as::<_, User>(&format!(
                "UPDATE users SET \
                   username = COALESCE($2, username), \
                   email = COALESCE($3, email), \
                   bio = COALESCE($4, bio), \
                   updated_at = NOW() \
                 WHERE id = $1 \
                 RETURNING {USER_COLUMNS}"
            ))
            .bind(id)
            .bind(changes.username)
            .bind(changes.email)
            .bind(changes.bio)
            .fetch_optional(&self.pool)
            .await?;
            Ok(user)
        })
    }

    fn set_password_hash(&self, id: UserId, hash: String) -> BoxFuture<'_, StoreResult<bool>> {
        Box::pin(async move {
            let result = sqlx::query(
                "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
            )
            .bind(id)
            .bind(hash)
            .execute(&self.pool)
            .await?;
            Ok(result.rows_affected() > 0)
        })
    }

    fn set_active(&self, id: UserId, active: bool) -> BoxFuture<'_, StoreResult<Option<User>>> {
        Box::pin(async move {
            let user = sqlx::query_as::<_, User>(&format!(
                "UPDATE users SET is_active = $2, updated_at = NOW() \
                 WHERE id = $1 RETURNING {USER_COLUMNS}"
            ))
            .bind(id)
            .bind(active)
            .fetch_optional(&self.pool)
            .await?;
            Ok(user)
        })
    }

    fn set_role(&self, id: UserId, role: Role) -> BoxFuture<'_, StoreResult<Option<User>>> {
        Box::pin(async move {
            let user = sqlx::query_as::<_, User>(&format!(
                "UPDATE users SET role = $2, updated_at = NOW() \
                 WHERE id = $1 RETURNING {USER_COLUMNS}"
            ))
            .bind(id)
            .bind(role.as_str())
            .fetch_optional(&self.pool)
            .await?;
            Ok(user)
        })
    }

    fn delete(&self, id: UserId) -> BoxFuture<'_, StoreResult<bool>> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
    }

    fn save_password_reset(&self, reset: PasswordReset) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            sqlx::query(
                "INSERT INTO password_resets (user_id, token_hash, expires_at) \
                 VALUES ($1, $2, $3) \
                 ON CONFLICT (user_id) DO UPDATE \
                 SET token_hash = EXCLUDED.token_hash, expires_at = EXCLUDED.expires_at",
            )
            .bind(reset.user_id)
            .bind(&reset.token_hash)
            .bind(reset.expires_at)
            .execute(&self.pool)
            .await?;
            Ok(())
        })
    }

    fn take_password_reset<'a>(
        &'a self,
        token_hash: &'a str,
    ) -> BoxFuture<'a, StoreResult<Option<PasswordReset>>> {
        Box::pin(async move {
            let reset = sqlx::query_as::<_, PasswordReset>(
                "DELETE FROM password_resets WHERE token_hash = $1 \
                 RETURNING user_id, token_hash, expires_at",
            )
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await?;
            Ok(reset)
        })
    }
}

fn push_post_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &PostQuery) {
    builder.push(" WHERE TRUE");
    match query.viewer {
        PostViewer::Admin => {}
        PostViewer::Member(id) => {
            builder
                .push(" AND (status = 'published' OR author_id = ")
                .push_bind(id)
                .push(")");
        }
        PostViewer::Anonymous => {
            builder.push(" AND status = 'published'");
        }
    }
    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(author_id) = query.author_id {
        builder.push(" AND author_id = ").push_bind(author_id);
    }
    if let Some(category_id) = query.category_id {
        builder.push(" AND category_id = ").push_bind(category_id);
    }
}

impl PostStore for PgStore {
    fn find_by_id(&self, id: PostId) -> BoxFuture<'_, StoreResult<Option<Post>>> {
        Box::pin(async move {
            let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(post)
        })
    }

    #[instrument(skip(self))]
    fn list(&self, query: PostQuery) -> BoxFuture<'_, StoreResult<(Vec<Post>, i64)>> {
        Box::pin(async move {
            let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts");
            push_post_filters(&mut count, &query);
            let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

            let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM posts");
            push_post_filters(&mut select, &query);
            select
                .push(" ORDER BY created_at DESC, id LIMIT ")
                .push_bind(query.limit)
                .push(" OFFSET ")
                .push_bind(query.offset);
            let posts = select
                .build_query_as::<Post>()
                .fetch_all(&self.pool)
                .await?;

            Ok((posts, total))
        })
    }

    #[instrument(skip(self, post), fields(slug = %post.slug))]
    fn create(&self, post: NewPost) -> BoxFuture<'_, StoreResult<Post>> {
        Box::pin(async move {
            let post = sqlx::query_as::<_, Post>(
                "INSERT INTO posts \
                   (title, slug, content, excerpt, status, author_id, category_id, published_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, \
                   CASE WHEN $5 = 'published' THEN NOW() END) \
                 RETURNING *",
            )
            .bind(&post.title)
            .bind(&post.slug)
            .bind(&post.content)
            .bind(&post.excerpt)
            .bind(post.status.as_str())
            .bind(post.author_id)
            .bind(post.category_id)
            .fetch_one(&self.pool)
            .await?;
            Ok(post)
        })
    }

    fn update(
        &self,
        id: PostId,
        changes: PostChanges,
    ) -> BoxFuture<'_, StoreResult<Option<Post>>> {
        Box::pin(async move {
            let post = sqlx::query_as::<_, Post>(
                "UPDATE posts SET \
                   title = COALESCE($2, title), \
                   slug = COALESCE($3, slug), \
                   content = COALESCE($4, content), \
                   excerpt = COALESCE($5, excerpt), \
                   status = COALESCE($6, status), \
                   category_id = COALESCE($7, category_id), \
                   published_at = CASE \
                     WHEN $6 = 'published' AND published_at IS NULL THEN NOW() \
                     ELSE published_at END, \
                   updated_at = NOW() \
                 WHERE id = $1 \
                 RETURNING *",
            )
            .bind(id)
            .bind(changes.title)
            .bind(changes.slug)
            .bind(changes.content)
            .bind(changes.excerpt)
            .bind(changes.status.map(|s| s.as_str()))
            .bind(changes.category_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(post)
        })
    }

    fn set_cover_image(
        &self,
        id: PostId,
        url: Option<String>,
    ) -> BoxFuture<'_, StoreResult<Option<Post>>> {
        Box::pin(async move {
            let post = sqlx::query_as::<_, Post>(
                "UPDATE posts SET cover_image = $2, updated_at = NOW() \
                 WHERE id = $1 RETURNING *",
            )
            .bind(id)
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;
            Ok(post)
        })
    }

    fn delete(&self, id: PostId) -> BoxFuture<'_, StoreResult<bool>> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM posts WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
    }
}

impl CategoryStore for PgStore {
    fn find_by_id(&self, id: CategoryId) -> BoxFuture<'_, StoreResult<Option<Category>>> {
        Box::pin(async move {
            let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(category)
        })
    }

    fn list(&self) -> BoxFuture<'_, StoreResult<Vec<Category>>> {
        Box::pin(async move {
            let categories =
                sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
                    .fetch_all(&self.pool)
                    .await?;
            Ok(categories)
        })
    }

    fn create(&self, category: CreateCategoryDto) -> BoxFuture<'_, StoreResult<Category>> {
        Box::pin(async move {
            let category = sqlx::query_as::<_, Category>(
                "INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING *",
            )
            .bind(category.name)
            .bind(category.description)
            .fetch_one(&self.pool)
            .await?;
            Ok(category)
        })
    }

    fn update(
        &self,
        id: CategoryId,
        changes: UpdateCategoryDto,
    ) -> BoxFuture<'_, StoreResult<Option<Category>>> {
        Box::pin(async move {
            let category = sqlx::query_as::<_, Category>(
                "UPDATE categories SET \
                   name = COALESCE($2, name), \
                   description = COALESCE($3, description), \
                   updated_at = NOW() \
                 WHERE id = $1 RETURNING *",
            )
            .bind(id)
            .bind(changes.name)
            .bind(changes.description)
            .fetch_optional(&self.pool)
            .await?;
            Ok(category)
        })
    }

    fn delete(&self, id: CategoryId) -> BoxFuture<'_, StoreResult<bool>> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM categories WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
    }
}
