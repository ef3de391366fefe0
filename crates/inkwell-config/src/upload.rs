use std::env;
use std::path::PathBuf;

/// Where uploaded post cover images go and how large they may be.
#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub base_url: String,
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./uploads"),
            base_url: "http://localhost:3000/uploads".to_string(),
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

impl UploadConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            dir: env::var("UPLOAD_DIR").map(PathBuf::from).unwrap_or(defaults.dir),
            base_url: env::var("UPLOAD_BASE_URL").unwrap_or(defaults.base_url),
            max_bytes: env::var("UPLOAD_MAX_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_bytes),
        }
    }
}
