//! Storage for uploaded post cover images.
//!
//! Files are addressed by a relative key such as `covers/<post>-<id>.png`.
//! The key is what lands on disk; the public URL is the key appended to the
//! configured base URL.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use inkwell_core::AppError;
use thiserror::Error;
use tokio::fs;

type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, FileStorageError>> + Send + 'a>>;

/// Image types accepted as cover uploads, with the extension they are
/// stored under.
pub const ALLOWED_IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
];

/// Extension for an accepted image MIME type, `None` for anything else.
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    ALLOWED_IMAGE_TYPES
        .iter()
        .find(|(mime, _)| mime.eq_ignore_ascii_case(content_type))
        .map(|(_, ext)| *ext)
}

pub trait FileStorage: Send + Sync + std::fmt::Debug {
    /// Writes `content` under `key` and returns the key.
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String>;

    /// Removes the file. A missing file is not an error.
    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()>;

    fn url(&self, key: &str) -> Result<String, FileStorageError>;

    /// Reverses [`url`](Self::url). `None` for URLs this storage did not issue.
    fn key_from_url<'u>(&self, url: &'u str) -> Option<&'u str>;
}

#[derive(Debug, Error)]
pub enum FileStorageError {
    #[error("file exceeds maximum size of {max_bytes} bytes")]
    TooLarge { max_bytes: usize },

    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<FileStorageError> for AppError {
    fn from(err: FileStorageError) -> Self {
        match err {
            FileStorageError::TooLarge { .. } => AppError::PayloadTooLarge,
            other => AppError::internal(other),
        }
    }
}

/// Stores files in a local directory served under `base_url`.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    base_dir: PathBuf,
    base_url: String,
    max_file_size: usize,
}

impl LocalFileStorage {
    pub fn new(base_dir: PathBuf, base_url: String, max_file_size: usize) -> Self {
        Self {
            base_dir,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_file_size,
        }
    }

    fn validate_key(key: &str) -> Result<(), FileStorageError> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') || key.starts_with('\\') {
            return Err(FileStorageError::InvalidKey(
                "Key must not be empty, contain '..', or start with a separator".to_string(),
            ));
        }

        if !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/' | '.'))
        {
            return Err(FileStorageError::InvalidKey(
                "Key contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }
}

impl FileStorage for LocalFileStorage {
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String> {
        Box::pin(async move {
            Self::validate_key(key)?;

            if content.len() > self.max_file_size {
                return Err(FileStorageError::TooLarge {
                    max_bytes: self.max_file_size,
                });
            }

            let file_path = self.base_dir.join(key);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&file_path, content).await?;

            Ok(key.to_string())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            Self::validate_key(key)?;

            match fs::remove_file(self.base_dir.join(key)).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn url(&self, key: &str) -> Result<String, FileStorageError> {
        Self::validate_key(key)?;
        Ok(format!("{}/{}", self.base_url, key))
    }

    fn key_from_url<'u>(&self, url: &'u str) -> Option<&'u str> {
        url.strip_prefix(self.base_url.as_str())?.strip_prefix('/')
    }
}
