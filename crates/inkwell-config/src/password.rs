use std::env;

/// bcrypt work factor used for new password hashes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PasswordConfig {
    pub hash_cost: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self { hash_cost: 12 }
    }
}

impl PasswordConfig {
    pub fn from_env() -> Self {
        Self {
            hash_cost: env::var("PASSWORD_HASH_COST")
                .ok()
                .and_then(|s| s.parse().ok())
                // bcrypt accepts 4..=31
                .filter(|cost| (4..=31).contains(cost))
                .unwrap_or(Self::default().hash_cost),
        }
    }
}
