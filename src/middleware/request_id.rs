//! Client supplied correlation ids.

use axum::extract::Request;
use axum::http::{HeaderMap, HeaderName};
use axum::middleware::Next;
use axum::response::Response;

pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Correlation id of the current request, present only when the client sent
/// one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

pub fn read_request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= 128)
        .map(str::to_string)
}

/// Stores the id in request extensions and echoes it on the response.
pub async fn capture_request_id(mut req: Request, next: Next) -> Response {
    let Some(id) = read_request_id(req.headers()) else {
        return next.run(req).await;
    };

    let echoed = req.headers().get(&REQUEST_ID_HEADER).cloned();
    req.extensions_mut().insert(RequestId(id));

    let mut response = next.run(req).await;
    if let Some(value) = echoed {
        response.headers_mut().insert(REQUEST_ID_HEADER.clone(), value);
    }
    response
}
