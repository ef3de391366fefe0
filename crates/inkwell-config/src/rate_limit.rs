//! Rate limiting configuration for API endpoints.
//!
//! Rate limits are enforced per client IP with `governor` keyed limiters.
//!
//! # Configuration
//!
//! - `RATE_LIMIT_GENERAL_PER_SECOND`: Replenish rate for all endpoints (default: 10)
//! - `RATE_LIMIT_GENERAL_BURST_SIZE`: Burst size for all endpoints (default: 100)
//! - `RATE_LIMIT_AUTH_PER_SECOND`: Replenish rate for `/api/auth` (default: 1)
//! - `RATE_LIMIT_AUTH_BURST_SIZE`: Burst size for `/api/auth` (default: 10)
//!
//! Auth endpoints get the stricter quota to slow down credential stuffing.

use std::num::NonZeroU32;

use governor::Quota;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Tokens added per second for general endpoints.
    pub general_per_second: u32,
    /// Maximum tokens that can accumulate for general endpoints.
    pub general_burst_size: u32,
    /// Tokens added per second for auth endpoints.
    pub auth_per_second: u32,
    /// Maximum tokens that can accumulate for auth endpoints.
    pub auth_burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            general_per_second: 10,
            general_burst_size: 100,
            auth_per_second: 1,
            auth_burst_size: 10,
        }
    }
}

impl RateLimitConfig {
    /// Creates a new `RateLimitConfig` from environment variables, falling
    /// back to defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            general_per_second: read("RATE_LIMIT_GENERAL_PER_SECOND", defaults.general_per_second),
            general_burst_size: read("RATE_LIMIT_GENERAL_BURST_SIZE", defaults.general_burst_size),
            auth_per_second: read("RATE_LIMIT_AUTH_PER_SECOND", defaults.auth_per_second),
            auth_burst_size: read("RATE_LIMIT_AUTH_BURST_SIZE", defaults.auth_burst_size),
        }
    }

    #[must_use]
    pub fn general_quota(&self) -> Quota {
        quota(self.general_per_second, self.general_burst_size)
    }

    #[must_use]
    pub fn auth_quota(&self) -> Quota {
        quota(self.auth_per_second, self.auth_burst_size)
    }
}

fn read(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// Zero values fall back to the smallest quota governor can express.
fn quota(per_second: u32, burst: u32) -> Quota {
    let rate = NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN);
    let burst = NonZeroU32::new(burst).unwrap_or(NonZeroU32::MIN);
    Quota::per_second(rate).allow_burst(burst)
}
