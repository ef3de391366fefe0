//! The single exit point for failures.
//!
//! [`translate_errors`] wraps the whole router. Any response with a 4xx or
//! 5xx status leaves through it as an [`ErrorEnvelope`]: either rendered
//! from the [`AppError`] a handler, extractor or gate raised, or synthesized
//! from the bare status the framework produced (405, 413, and so on).

use std::any::Any;
use std::sync::Arc;

use anyhow::anyhow;
use axum::Json;
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode, Uri, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use inkwell_core::{AppError, EnvelopeContext, ErrorEnvelope, RaisedError};
use tracing::{error, warn};

use crate::middleware::auth::CallerId;
use crate::middleware::rate_limit::request_ip;
use crate::middleware::request_id::read_request_id;
use crate::state::AppState;

pub async fn translate_errors(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let request_id = read_request_id(req.headers());
    let ip = request_ip(&req);

    let mut response = next.run(req).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let error = match response.extensions_mut().remove::<RaisedError>() {
        Some(RaisedError(error)) => error,
        None => Arc::new(synthesize(status, &method, &path)),
    };
    let caller = response
        .extensions()
        .get::<CallerId>()
        .map(|CallerId(id)| id.to_string());

    if error.is_operational() && !error.status().is_server_error() {
        warn!(
            error = %error,
            path = %path,
            method = %method,
            user_id = caller.as_deref(),
            ip = %ip,
            request_id = request_id.as_deref(),
            "Request failed"
        );
    } else {
        error!(
            error = ?error,
            path = %path,
            method = %method,
            user_id = caller.as_deref(),
            ip = %ip,
            request_id = request_id.as_deref(),
            "Request failed"
        );
    }

    let context = EnvelopeContext {
        method: method.to_string(),
        path,
        request_id,
        include_stack: state.config.environment.is_development(),
    };
    let envelope = ErrorEnvelope::new(&error, &context);

    let mut rendered = (error.status(), Json(envelope)).into_response();
    for (name, value) in response.headers() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            rendered.headers_mut().append(name.clone(), value.clone());
        }
    }
    rendered
}

/// Builds the error for a response that carried only a status code.
fn synthesize(status: StatusCode, method: &Method, path: &str) -> AppError {
    match status {
        StatusCode::NOT_FOUND => AppError::route_not_found(method.as_str(), path),
        StatusCode::METHOD_NOT_ALLOWED => {
            AppError::operational(status, "Method not allowed")
                .with_details(format!("Cannot {method} {path}"))
        }
        StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge,
        StatusCode::TOO_MANY_REQUESTS => AppError::RateLimited,
        s if s.is_server_error() => AppError::internal(anyhow!("{method} {path} responded with {s}")),
        s => AppError::operational(s, s.canonical_reason().unwrap_or("Request failed")),
    }
}

/// Router fallback for unmatched paths.
pub async fn route_not_found(method: Method, uri: Uri) -> AppError {
    AppError::route_not_found(method.as_str(), uri.path())
}

/// `CatchPanicLayer` hook. The panic becomes an unexpected error that the
/// translator renders like any other.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::internal(anyhow!("handler panicked: {message}")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesized_not_found_names_route() {
        let err = synthesize(StatusCode::NOT_FOUND, &Method::GET, "/api/nope");
        let t = err.translate();
        assert_eq!(t.message, "Route not found");
        assert_eq!(t.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_synthesized_statuses() {
        let cases = [
            (StatusCode::METHOD_NOT_ALLOWED, 405, "Method not allowed"),
            (StatusCode::PAYLOAD_TOO_LARGE, 400, "File too large"),
            (StatusCode::TOO_MANY_REQUESTS, 429, "Too many requests"),
            (StatusCode::BAD_GATEWAY, 500, "Internal Server Error"),
            (StatusCode::UNSUPPORTED_MEDIA_TYPE, 415, "Unsupported Media Type"),
        ];

        for (status, expected, message) in cases {
            let t = synthesize(status, &Method::POST, "/api/posts").translate();
            assert_eq!(t.status.as_u16(), expected, "{status}");
            assert_eq!(t.message, message, "{status}");
        }
    }

    #[test]
    fn test_panic_payload_becomes_unexpected() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let raised = response.extensions().get::<RaisedError>().unwrap();
        assert!(!raised.0.is_operational());
        assert!(raised.0.to_string().contains("boom"));
    }
}
