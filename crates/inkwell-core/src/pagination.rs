//! Pagination utilities for API responses.
//!
//! List endpoints take page-based parameters:
//!
//! - `limit`: Items per page (1-100, default: 10)
//! - `page`: Page number (1-indexed, default: 1)
//!
//! Out-of-range values are rejected with a validation error rather than
//! silently clamped, so clients learn about the bad input.
//!
//! # Example
//!
//! ```ignore
//! use inkwell_core::pagination::{PaginationParams, PaginationMeta};
//!
//! async fn list_posts(
//!     ValidatedQuery(params): ValidatedQuery<PaginationParams>,
//! ) -> Result<Json<Paginated<Post>>, AppError> {
//!     let (posts, total) = store.list(params.offset(), params.limit()).await?;
//!     Ok(Json(Paginated { data: posts, meta: PaginationMeta::new(&params, total) }))
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;
/// Highest page a client may ask for.
pub const MAX_PAGE: i64 = 1_000_000;

/// Deserializes an optional string into an optional i64.
///
/// Query parameters may arrive as empty strings, which are treated as `None`.
pub fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse::<i64>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Metadata about a paginated response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    /// Total number of items across all pages
    pub total: i64,
    /// Items per page
    pub limit: i64,
    /// Current page (1-indexed)
    pub page: i64,
    /// Whether there are more items after this page
    pub has_more: bool,
}

impl PaginationMeta {
    pub fn new(params: &PaginationParams, total: i64) -> Self {
        let limit = params.limit();
        Self {
            total,
            limit,
            page: params.page(),
            has_more: params.offset().saturating_add(limit) < total,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Items per page (1-100, default: 10)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    /// Page number (1-indexed, default: 1)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    #[validate(range(min = 1, max = 1_000_000))]
    pub page: Option<i64>,
}

impl PaginationParams {
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}
