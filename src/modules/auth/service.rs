use chrono::{Duration, Utc};
use inkwell_auth::Role;
use inkwell_core::{AppError, Conflict, check_password_strength, hash_password, verify_password};
use inkwell_db::StoreError;
use inkwell_models::{
    AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, NewUser,
    PasswordReset, RegisterRequest, ResetPasswordRequest, User,
};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

use crate::state::AppState;

/// How long an emailed reset token stays valid.
const RESET_TOKEN_TTL_HOURS: i64 = 1;

const DUMMY_PASSWORD: &str = "inkwell-no-such-account";

pub struct AuthService;

impl AuthService {
    #[instrument(skip(state, dto), fields(username = %dto.username))]
    pub async fn register(state: &AppState, dto: RegisterRequest) -> Result<AuthResponse, AppError> {
        check_password_strength(&dto.password)?;

        let username = dto.username.trim().to_string();
        let email = dto.email.trim().to_lowercase();

        let conflicts = state.storage.users.find_conflicts(&username, &email).await?;
        if !conflicts.is_empty() {
            return Err(user_exists(&conflicts));
        }

        let password_hash = hash_in_background(dto.password, state.config.password.hash_cost).await?;

        // A concurrent registration can still win between the check and the
        // insert; the store reports that as a unique violation.
        let user = state
            .storage
            .users
            .create(NewUser {
                username,
                email,
                password_hash,
                role: Role::User,
            })
            .await
            .map_err(|err| match err {
                StoreError::UniqueViolation(conflicts) => user_exists(&conflicts),
                other => other.into(),
            })?;

        let token = state.tokens.issue(&user.token_subject())?;
        info!(user_id = %user.id, "User registered");

        Ok(AuthResponse { token, user })
    }

    #[instrument(skip(state, dto))]
    pub async fn login(state: &AppState, dto: LoginRequest) -> Result<AuthResponse, AppError> {
        let identifier = dto.identifier.trim();

        let Some(credentials) = state.storage.users.find_credentials(identifier).await? else {
            // Unknown accounts cost the same bcrypt work as a wrong password.
            let hash = dummy_hash(state).await?;
            verify_in_background(dto.password, hash).await?;
            return Err(invalid_credentials());
        };

        let valid = verify_in_background(dto.password, credentials.password_hash).await?;
        if !valid {
            warn!(user_id = %credentials.user.id, "Failed login attempt");
            return Err(invalid_credentials());
        }

        let user = credentials.user;
        if !user.is_active {
            return Err(AppError::AccountDeactivated);
        }

        let token = state.tokens.issue(&user.token_subject())?;
        info!(user_id = %user.id, "User logged in");

        Ok(AuthResponse { token, user })
    }

    #[instrument(skip(state, dto), fields(user_id = %user.id))]
    pub async fn change_password(
        state: &AppState,
        user: &User,
        dto: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        let credentials = state
            .storage
            .users
            .find_credentials_by_id(user.id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let valid = verify_in_background(dto.current_password, credentials.password_hash).await?;
        if !valid {
            return Err(AppError::unauthorized("Current password is incorrect"));
        }

        check_password_strength(&dto.new_password)?;
        let hash = hash_in_background(dto.new_password, state.config.password.hash_cost).await?;

        if !state.storage.users.set_password_hash(user.id, hash).await? {
            return Err(AppError::UserNotFound);
        }

        if let Err(err) = state
            .email
            .send_password_changed(&user.email, &user.username)
            .await
        {
            warn!(error = %err, "Failed to send password change notification");
        }

        info!("Password changed");
        Ok(())
    }

    /// Issues a reset token when the email belongs to an active account.
    /// Callers answer identically either way.
    #[instrument(skip(state, dto))]
    pub async fn forgot_password(
        state: &AppState,
        dto: ForgotPasswordRequest,
    ) -> Result<(), AppError> {
        let email = dto.email.trim().to_lowercase();

        let Some(user) = state.storage.users.find_by_email(&email).await? else {
            info!("Password reset requested for unknown email");
            return Ok(());
        };
        if !user.is_active {
            info!(user_id = %user.id, "Password reset requested for deactivated account");
            return Ok(());
        }

        let token = generate_reset_token();
        state
            .storage
            .users
            .save_password_reset(PasswordReset {
                user_id: user.id,
                token_hash: hash_reset_token(&token),
                expires_at: Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS),
            })
            .await?;

        if let Err(err) = state
            .email
            .send_password_reset(&user.email, &user.username, &token)
            .await
        {
            warn!(user_id = %user.id, error = %err, "Failed to send password reset email");
        }

        info!(user_id = %user.id, "Password reset token issued");
        Ok(())
    }

    #[instrument(skip(state, dto))]
    pub async fn reset_password(
        state: &AppState,
        dto: ResetPasswordRequest,
    ) -> Result<(), AppError> {
        let reset = state
            .storage
            .users
            .take_password_reset(&hash_reset_token(dto.token.trim()))
            .await?
            .filter(|reset| reset.expires_at > Utc::now())
            .ok_or_else(|| AppError::bad_request("Invalid or expired reset token"))?;

        check_password_strength(&dto.password)?;
        let hash = hash_in_background(dto.password, state.config.password.hash_cost).await?;

        if !state.storage.users.set_password_hash(reset.user_id, hash).await? {
            return Err(AppError::bad_request("Invalid or expired reset token"));
        }

        info!(user_id = %reset.user_id, "Password reset completed");
        Ok(())
    }
}

fn invalid_credentials() -> AppError {
    AppError::unauthorized("Invalid credentials")
}

fn user_exists(conflicts: &[Conflict]) -> AppError {
    AppError::bad_request("User already exists")
        .with_details(conflicts.iter().map(Conflict::describe).collect::<Vec<_>>())
}

/// bcrypt is deliberately slow, so it runs off the async workers.
pub async fn hash_in_background(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(AppError::internal)?
}

async fn verify_in_background(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(AppError::internal)?
}

/// Hash of a fixed password at the configured cost, computed once per state.
async fn dummy_hash(state: &AppState) -> Result<String, AppError> {
    let cost = state.config.password.hash_cost;
    state
        .dummy_hash
        .get_or_try_init(|| hash_in_background(DUMMY_PASSWORD.to_string(), cost))
        .await
        .cloned()
}

/// 32 random bytes, hex encoded. Sent to the user and never stored.
fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
