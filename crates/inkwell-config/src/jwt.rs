use std::env;

/// Default token lifetime: 7 days.
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 604_800;

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub expires_in_secs: i64,
    pub issuer: String,
    pub audience: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "your-secret-key-change-in-production".to_string(),
            expires_in_secs: DEFAULT_EXPIRES_IN_SECS,
            issuer: "inkwell-api".to_string(),
            audience: "inkwell-client".to_string(),
        }
    }
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            secret: env::var("JWT_SECRET").unwrap_or(defaults.secret),
            expires_in_secs: env::var("JWT_EXPIRES_IN_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs: &i64| *secs > 0)
                .unwrap_or(defaults.expires_in_secs),
            issuer: env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
            audience: env::var("JWT_AUDIENCE").unwrap_or(defaults.audience),
        }
    }
}
