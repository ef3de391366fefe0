//! # Inkwell Core
//!
//! Core types, errors, and utilities for the Inkwell API.
//!
//! This crate provides the foundational pieces every other crate leans on:
//!
//! - [`errors`]: The closed [`AppError`] taxonomy and its translation into
//!   status code, message and details
//! - [`envelope`]: The normalized JSON error envelope returned for every
//!   non-success response
//! - [`pagination`]: Validated pagination parameters and response metadata
//! - [`password`]: Password hashing, verification and strength rules
//!
//! # Example
//!
//! ```ignore
//! use inkwell_core::{AppError, ErrorDetails};
//! use axum::http::StatusCode;
//!
//! // A domain rule violation raised by a handler
//! let error = AppError::operational(StatusCode::CONFLICT, "Post already published")
//!     .with_details(ErrorDetails::Text("Unpublish it first".into()));
//!
//! let translation = error.translate();
//! assert_eq!(translation.status, StatusCode::CONFLICT);
//! ```

pub mod envelope;
pub mod errors;
pub mod pagination;
pub mod password;

// Re-export commonly used types at crate root
pub use envelope::{EnvelopeContext, ErrorEnvelope};
pub use errors::{AppError, Conflict, ErrorDetails, FieldError, RaisedError, Translation};
pub use pagination::{PaginationMeta, PaginationParams};
pub use password::{check_password_strength, hash_password, verify_password};
