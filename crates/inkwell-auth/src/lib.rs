//! # Inkwell Auth
//!
//! The token service of the Inkwell API.
//!
//! - [`claims`]: Identity token claims and the [`Role`] enum
//! - [`jwt`]: [`TokenService`] for issuing and verifying tokens, and
//!   [`extract_bearer`] for reading them off a request
//!
//! Tokens are self-contained HS256 JWTs. There is no revocation list: a token
//! stops working when it expires or when the signing secret rotates.
//!
//! # Example
//!
//! ```ignore
//! use inkwell_auth::{Role, TokenService, TokenSubject};
//! use inkwell_config::JwtConfig;
//!
//! let tokens = TokenService::new(&JwtConfig::from_env());
//!
//! let token = tokens.issue(&TokenSubject {
//!     id: user_id,
//!     username: "ada".into(),
//!     email: "ada@example.com".into(),
//!     role: Role::User,
//! })?;
//!
//! let claims = tokens.verify(&token)?;
//! assert_eq!(claims.username, "ada");
//! ```

pub mod claims;
pub mod jwt;

// Re-export commonly used types at crate root
pub use claims::{Claims, Role, TokenSubject};
pub use jwt::{TokenError, TokenService, extract_bearer};
