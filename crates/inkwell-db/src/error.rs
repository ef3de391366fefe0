//! Storage error classification.
//!
//! Raw `sqlx` failures are sorted into the few kinds callers act on. The
//! PostgreSQL error codes used:
//!
//! - `23505` unique violation: the offending columns and values are parsed
//!   from the `Key (col, ...)=(val, ...) already exists.` detail line
//! - `23503` foreign key violation
//! - `22P02` invalid text representation, e.g. a malformed uuid
//!
//! Pool timeouts, a closed pool and I/O or TLS failures mean the database is
//! unreachable.

use inkwell_core::{AppError, Conflict};
use sqlx::error::DatabaseError;
use sqlx::postgres::PgDatabaseError;
use thiserror::Error;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const INVALID_TEXT_REPRESENTATION: &str = "22P02";

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated on {}", describe_fields(.0))]
    UniqueViolation(Vec<Conflict>),

    #[error("referenced row does not exist ({0})")]
    MissingReference(String),

    #[error("malformed value: {0}")]
    MalformedValue(String),

    #[error("database unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Database(sqlx::Error),
}

fn describe_fields(conflicts: &[Conflict]) -> String {
    conflicts
        .iter()
        .map(|c| c.field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(
            err,
            sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::Io(_)
                | sqlx::Error::Tls(_)
        ) {
            return Self::Unavailable(err.to_string());
        }

        let classified = err.as_database_error().and_then(|db| {
            match db.code().as_deref() {
                Some(UNIQUE_VIOLATION) => Some(Self::UniqueViolation(unique_conflicts(db))),
                Some(FOREIGN_KEY_VIOLATION) => Some(Self::MissingReference(
                    db.constraint().unwrap_or("foreign key").to_string(),
                )),
                Some(INVALID_TEXT_REPRESENTATION) => {
                    Some(Self::MalformedValue(db.message().to_string()))
                }
                _ => None,
            }
        });

        match classified {
            Some(classified) => classified,
            None => Self::Database(err),
        }
    }
}

fn unique_conflicts(db: &(dyn DatabaseError + 'static)) -> Vec<Conflict> {
    db.try_downcast_ref::<PgDatabaseError>()
        .and_then(PgDatabaseError::detail)
        .and_then(parse_key_detail)
        .unwrap_or_else(|| {
            let field = db
                .constraint()
                .map(constraint_field)
                .unwrap_or_else(|| "field".to_string());
            vec![Conflict::new(field, "")]
        })
}

/// Parses `Key (a, b)=(x, y) already exists.` into one conflict per column.
///
/// Values are split on `", "` only as many times as there are columns, so
/// the last value keeps any commas of its own.
pub fn parse_key_detail(detail: &str) -> Option<Vec<Conflict>> {
    let rest = detail.strip_prefix("Key (")?;
    let (columns, rest) = rest.split_once(")=(")?;
    let values = rest
        .strip_suffix(") already exists.")
        .or_else(|| rest.strip_suffix(") already exists"))?;

    let columns: Vec<&str> = columns.split(", ").collect();
    let values: Vec<&str> = values.splitn(columns.len(), ", ").collect();
    if columns.len() != values.len() {
        return None;
    }

    Some(
        columns
            .into_iter()
            .zip(values)
            .map(|(column, value)| Conflict::new(column, value))
            .collect(),
    )
}

// `users_email_key` -> `email`
fn constraint_field(constraint: &str) -> String {
    let trimmed = constraint.strip_suffix("_key").unwrap_or(constraint);
    match trimmed.split_once('_') {
        Some((_table, field)) => field.to_string(),
        None => trimmed.to_string(),
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(conflicts) => AppError::Duplicate(conflicts),
            StoreError::MissingReference(_) => {
                AppError::bad_request("Referenced resource does not exist")
            }
            StoreError::MalformedValue(value) => AppError::InvalidId(value),
            StoreError::Unavailable(reason) => AppError::DatabaseUnavailable(reason),
            StoreError::Database(err) => AppError::internal(err),
        }
    }
}
