//! Normalized error envelope.
//!
//! Every non-2xx response body has this shape:
//!
//! ```json
//! {
//!   "error": "Validation Error",
//!   "status": 400,
//!   "timestamp": "2025-03-01T12:00:00.000Z",
//!   "path": "/api/posts",
//!   "method": "POST",
//!   "details": [{ "field": "title", "message": "...", "value": "abcd" }],
//!   "requestId": "3b1f...",
//!   "stack": "..."
//! }
//! ```
//!
//! `details`, `requestId` and `stack` are omitted when absent. `stack` is only
//! ever filled in development.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use utoipa::ToSchema;

use crate::errors::{AppError, ErrorDetails};

/// The request facts an envelope needs.
#[derive(Debug, Clone, Default)]
pub struct EnvelopeContext {
    pub method: String,
    pub path: String,
    pub request_id: Option<String>,
    pub include_stack: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    #[schema(example = "Validation Error")]
    pub error: String,
    #[schema(example = 400)]
    pub status: u16,
    #[serde(serialize_with = "iso8601")]
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: DateTime<Utc>,
    #[schema(example = "/api/posts")]
    pub path: String,
    #[schema(example = "POST")]
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(error: &AppError, context: &EnvelopeContext) -> Self {
        Self::at(error, context, Utc::now())
    }

    pub fn at(error: &AppError, context: &EnvelopeContext, timestamp: DateTime<Utc>) -> Self {
        let translation = error.translate();

        Self {
            error: translation.message,
            status: translation.status.as_u16(),
            timestamp,
            path: context.path.clone(),
            method: context.method.clone(),
            details: translation.details,
            request_id: context.request_id.clone(),
            stack: context.include_stack.then(|| format!("{error:?}")),
        }
    }
}

fn iso8601<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Conflict;
    use chrono::TimeZone;

    fn context() -> EnvelopeContext {
        EnvelopeContext {
            method: "POST".to_string(),
            path: "/api/auth/register".to_string(),
            request_id: None,
            include_stack: false,
        }
    }

    #[test]
    fn test_envelope_required_fields() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let envelope = ErrorEnvelope::at(&AppError::Unauthenticated, &context(), ts);
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["error"], "Access denied");
        assert_eq!(json["status"], 401);
        assert_eq!(json["timestamp"], "2025-03-01T12:00:00.000Z");
        assert_eq!(json["path"], "/api/auth/register");
        assert_eq!(json["method"], "POST");
        assert_eq!(json["details"], "No token provided");
        assert!(json.get("requestId").is_none());
        assert!(json.get("stack").is_none());
    }

    #[test]
    fn test_envelope_includes_request_id_when_present() {
        let mut ctx = context();
        ctx.request_id = Some("req-42".to_string());
        let envelope = ErrorEnvelope::new(&AppError::RateLimited, &ctx);
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["requestId"], "req-42");
    }

    #[test]
    fn test_envelope_stack_only_when_requested() {
        let err = AppError::internal(anyhow::anyhow!("disk on fire"));

        let hidden = ErrorEnvelope::new(&err, &context());
        assert!(hidden.stack.is_none());
        assert_eq!(hidden.error, "Internal Server Error");

        let mut ctx = context();
        ctx.include_stack = true;
        let shown = ErrorEnvelope::new(&err, &ctx);
        assert!(shown.stack.unwrap().contains("disk on fire"));
    }

    #[test]
    fn test_envelope_duplicate_details() {
        let err = AppError::Duplicate(vec![Conflict::new("username", "quill")]);
        let json = serde_json::to_value(ErrorEnvelope::new(&err, &context())).unwrap();
        assert_eq!(json["details"], "username 'quill' already exists");
    }
}
