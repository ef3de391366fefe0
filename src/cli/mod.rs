//! Administrative tasks behind the `inkwell-cli` binary.

use inkwell_auth::Role;
use inkwell_core::{AppError, check_password_strength};
use inkwell_db::{Storage, StoreError};
use inkwell_models::{NewUser, RegisterRequest, User};
use tracing::info;
use validator::Validate;

use crate::modules::auth::service::hash_in_background;

/// Creates an administrator account, or fails if the username or email is
/// taken. Input goes through the same rules as public registration.
pub async fn create_admin(
    storage: &Storage,
    username: &str,
    email: &str,
    password: &str,
    hash_cost: u32,
) -> Result<User, AppError> {
    let request = RegisterRequest {
        username: username.trim().to_string(),
        email: email.trim().to_lowercase(),
        password: password.to_string(),
    };
    request.validate()?;
    check_password_strength(&request.password)?;

    let conflicts = storage
        .users
        .find_conflicts(&request.username, &request.email)
        .await?;
    if !conflicts.is_empty() {
        return Err(AppError::Duplicate(conflicts));
    }

    let password_hash = hash_in_background(request.password, hash_cost).await?;
    let user = storage
        .users
        .create(NewUser {
            username: request.username,
            email: request.email,
            password_hash,
            role: Role::Admin,
        })
        .await
        .map_err(|err| match err {
            StoreError::UniqueViolation(conflicts) => AppError::Duplicate(conflicts),
            other => other.into(),
        })?;

    info!(user_id = %user.id, "Administrator created");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_admin() {
        let storage = Storage::memory();
        let user = create_admin(&storage, "root_admin", "Root@Example.com", "Secret123", 4)
            .await
            .unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.email, "root@example.com");

        let err = create_admin(&storage, "root_admin", "other@example.com", "Secret123", 4)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Duplicate(c) if c[0].field == "username"));
    }

    #[tokio::test]
    async fn test_create_admin_enforces_password_rules() {
        let storage = Storage::memory();
        let err = create_admin(&storage, "root_admin", "root@example.com", "alllowercase1", 4)
            .await
            .unwrap_err();
        assert_eq!(err.translate().message, "Password does not meet security requirements");
    }
}
