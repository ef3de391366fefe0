//! # Inkwell DB
//!
//! Storage for the Inkwell API.
//!
//! - [`store`]: The [`UserStore`], [`PostStore`] and [`CategoryStore`] traits
//! - [`postgres`]: [`PgStore`], backed by a `sqlx` PostgreSQL pool
//! - [`memory`]: [`MemoryStore`], a process-local backend for tests and demos
//! - [`error`]: [`StoreError`] and its mapping into `AppError`
//!
//! # Example
//!
//! ```ignore
//! use inkwell_db::{Storage, init_db_pool};
//!
//! let pool = init_db_pool(&database_url).await?;
//! let storage = Storage::postgres(pool);
//!
//! let user = storage.users.find_by_id(user_id).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

// Re-export commonly used types at crate root
pub use error::{StoreError, StoreResult, parse_key_detail};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use sqlx::PgPool;
pub use store::{BoxFuture, CategoryStore, PostStore, UserStore};

/// Connects a PostgreSQL pool.
///
/// Acquiring a connection gives up after five seconds, which surfaces as
/// [`StoreError::Unavailable`] on the request that waited.
///
/// # Errors
///
/// Returns the `sqlx` error if the initial connection fails.
pub async fn init_db_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// The three stores handed to the HTTP layer.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserStore>,
    pub posts: Arc<dyn PostStore>,
    pub categories: Arc<dyn CategoryStore>,
}

impl Storage {
    pub fn postgres(pool: PgPool) -> Self {
        Self::from_backend(PgStore::new(pool))
    }

    pub fn memory() -> Self {
        Self::from_backend(MemoryStore::new())
    }

    fn from_backend<B>(backend: B) -> Self
    where
        B: UserStore + PostStore + CategoryStore + Clone + 'static,
    {
        Self {
            users: Arc::new(backend.clone()),
            posts: Arc::new(backend.clone()),
            categories: Arc::new(backend),
        }
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}
