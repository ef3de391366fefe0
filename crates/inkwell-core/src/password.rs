//! Password hashing and strength rules.

use bcrypt::{hash, verify};

use crate::errors::AppError;

pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost)
        .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to hash password: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to verify password: {e}")))
}

/// Checks the character-class rules a password must satisfy. Length limits
/// live on the request DTOs.
///
/// A failure is an operational error listing every broken rule, so clients
/// can show them all at once.
pub fn check_password_strength(password: &str) -> Result<(), AppError> {
    let mut broken = Vec::new();

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        broken.push("Password must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        broken.push("Password must contain at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        broken.push("Password must contain at least one number".to_string());
    }

    if broken.is_empty() {
        Ok(())
    } else {
        Err(AppError::application("Password does not meet security requirements")
            .with_details(broken))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorDetails;

    #[test]
    fn test_strong_password_accepted() {
        assert!(check_password_strength("Secret123").is_ok());
    }

    #[test]
    fn test_missing_uppercase_is_reported_alone() {
        let err = check_password_strength("abc123").unwrap_err();
        let t = err.translate();
        assert_eq!(t.status.as_u16(), 400);
        assert_eq!(t.message, "Password does not meet security requirements");
        assert_eq!(
            t.details,
            Some(ErrorDetails::Messages(vec![
                "Password must contain at least one uppercase letter".to_string()
            ]))
        );
    }

    #[test]
    fn test_every_broken_rule_is_listed() {
        let err = check_password_strength("!!!!!!").unwrap_err();
        let Some(ErrorDetails::Messages(rules)) = err.translate().details else {
            panic!("expected rule list");
        };
        assert_eq!(rules.len(), 3);
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Secret123", 4).unwrap();
        assert_ne!(hash, "Secret123");
        assert!(verify_password("Secret123", &hash).unwrap());
        assert!(!verify_password("Secret124", &hash).unwrap());
    }

    #[test]
    fn test_verify_against_garbage_hash_is_error() {
        assert!(verify_password("Secret123", "not-a-bcrypt-hash").is_err());
    }
}
