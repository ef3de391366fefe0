//! Shared utilities.
//!
//! - [`email`]: SMTP delivery of password reset mail
//! - [`file_storage`]: Local storage of uploaded cover images

pub mod email;
pub mod file_storage;
