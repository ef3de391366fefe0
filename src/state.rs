use std::sync::Arc;

use inkwell_auth::TokenService;
use inkwell_config::AppConfig;
use inkwell_db::Storage;
use tokio::sync::OnceCell;

use crate::middleware::rate_limit::RateLimiters;
use crate::utils::email::EmailService;
use crate::utils::file_storage::{FileStorage, LocalFileStorage};

/// Everything a request handler can reach. Cheap to clone.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenService>,
    pub storage: Storage,
    pub files: Arc<dyn FileStorage>,
    pub email: Arc<EmailService>,
    pub limiters: RateLimiters,
    /// Hash checked when a login names no account, built on first use.
    pub dummy_hash: Arc<OnceCell<String>>,
}

impl AppState {
    pub fn new(config: AppConfig, storage: Storage) -> Self {
        let files = LocalFileStorage::new(
            config.upload.dir.clone(),
            config.upload.base_url.clone(),
            config.upload.max_bytes,
        );

        Self {
            tokens: Arc::new(TokenService::new(&config.jwt)),
            email: Arc::new(EmailService::new(config.email.clone())),
            limiters: RateLimiters::new(&config.rate_limit),
            dummy_hash: Arc::new(OnceCell::new()),
            files: Arc::new(files),
            storage,
            config: Arc::new(config),
        }
    }
}
