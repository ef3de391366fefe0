//! # Inkwell Config
//!
//! Configuration types for the Inkwell API.
//!
//! Everything here is loaded once from environment variables at process start
//! and then treated as immutable. Logic code receives these values through
//! application state and never reads the environment itself.
//!
//! - [`jwt`]: Token signing secret, lifetime, issuer and audience
//! - [`cors`]: Allowed origins
//! - [`email`]: SMTP settings for password reset mail
//! - [`environment`]: Runtime mode (development, test, production)
//! - [`password`]: Password hashing cost
//! - [`rate_limit`]: Per-IP request quotas
//! - [`upload`]: Cover image storage location and size limit
//!
//! # Example
//!
//! ```ignore
//! use inkwell_config::AppConfig;
//!
//! dotenvy::dotenv().ok();
//! let config = AppConfig::from_env();
//! println!("running in {}", config.environment);
//! ```

pub mod cors;
pub mod email;
pub mod environment;
pub mod jwt;
pub mod password;
pub mod rate_limit;
pub mod upload;

// Re-export commonly used types at crate root
pub use cors::CorsConfig;
pub use email::EmailConfig;
pub use environment::AppEnvironment;
pub use jwt::JwtConfig;
pub use password::PasswordConfig;
pub use rate_limit::RateLimitConfig;
pub use upload::UploadConfig;

/// All process-wide settings, built once at startup.
#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub jwt: JwtConfig,
    pub cors: CorsConfig,
    pub email: EmailConfig,
    pub password: PasswordConfig,
    pub rate_limit: RateLimitConfig,
    pub upload: UploadConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            environment: AppEnvironment::from_env(),
            jwt: JwtConfig::from_env(),
            cors: CorsConfig::from_env(),
            email: EmailConfig::from_env(),
            password: PasswordConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            upload: UploadConfig::from_env(),
        }
    }
}
