//! Token issuing and verification.
//!
//! Tokens are HS256 JWTs bound to the configured issuer and audience. A token
//! is accepted only when its signature, expiry, issuer and audience all check
//! out. Every failure collapses into one of two outcomes: [`TokenError::Expired`]
//! or [`TokenError::Invalid`].

use std::fmt;

use axum::http::{HeaderMap, header::AUTHORIZATION};
use chrono::Utc;
use inkwell_config::JwtConfig;
use inkwell_core::AppError;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::claims::{Claims, TokenSubject};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed, forged or bound to another issuer/audience")]
    Invalid,
    #[error("token has expired")]
    Expired,
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => AppError::TokenInvalid,
            TokenError::Expired => AppError::TokenExpired,
        }
    }
}

/// Issues and verifies identity tokens.
///
/// Built once at startup from [`JwtConfig`] and shared through application
/// state. Holds the derived keys so the secret is not re-parsed per request.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    expires_in_secs: i64,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expires_in_secs", &self.expires_in_secs)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            expires_in_secs: config.expires_in_secs,
        }
    }

    /// Issues a signed token for `subject`, valid from now for the configured
    /// lifetime.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unexpected` if encoding fails.
    pub fn issue(&self, subject: &TokenSubject) -> Result<String, AppError> {
        self.issue_at(subject, Utc::now().timestamp())
    }

    /// Issues a token as if it were created at `issued_at` (Unix seconds).
    pub fn issue_at(&self, subject: &TokenSubject, issued_at: i64) -> Result<String, AppError> {
        let claims = Claims {
            id: subject.id,
            username: subject.username.clone(),
            email: subject.email.clone(),
            role: subject.role,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: to_timestamp(issued_at.saturating_add(self.expires_in_secs)),
            iat: to_timestamp(issued_at),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(AppError::internal)
    }

    /// Verifies a token and returns its claims.
    ///
    /// # Errors
    ///
    /// - [`TokenError::Expired`] if the signature is good but `exp` has passed
    /// - [`TokenError::Invalid`] for everything else: bad structure, bad
    ///   signature, wrong issuer or audience, missing claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }

    pub fn expires_in_secs(&self) -> i64 {
        self.expires_in_secs
    }
}

fn to_timestamp(secs: i64) -> usize {
    usize::try_from(secs).unwrap_or(0)
}

/// Reads the token out of an `Authorization: Bearer <token>` header.
///
/// Returns `None` when the header is absent, not valid text, uses another
/// scheme, or carries an empty token.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}
