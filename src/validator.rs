//! Request extractors that fail with [`AppError`] instead of axum's plain
//! text rejections.

use std::str::FromStr;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::Json;
use inkwell_core::AppError;
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON body that is deserialized and then checked with `validator`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;

        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge;
    }

    let message = match &rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "Expected request with `Content-Type: application/json`".to_string()
        }
        JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON".to_string(),
        _ => schema_message(
            &rejection.body_text(),
            "Failed to deserialize the JSON body into the target type: ",
        ),
    };
    AppError::SchemaValidation(vec![message])
}

/// Turns a serde failure into one readable line.
///
/// `missing field `title` at line 1 column 2` becomes `title is required`.
/// Anything else loses the prefix and the position suffix.
fn schema_message(body_text: &str, prefix: &str) -> String {
    let text = body_text.strip_prefix(prefix).unwrap_or(body_text);

    if let Some(field) = text
        .split("missing field `")
        .nth(1)
        .and_then(|rest| rest.split('`').next())
    {
        return format!("{field} is required");
    }

    match text.rfind(" at line ") {
        Some(idx) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Query string that is deserialized and then checked with `validator`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: QueryRejection| {
                AppError::SchemaValidation(vec![schema_message(
                    &rejection.body_text(),
                    "Failed to deserialize query string: ",
                )])
            })?;

        value.validate()?;
        Ok(ValidatedQuery(value))
    }
}

/// Single path parameter parsed into an id type. A value of the wrong shape
/// is an `InvalidId` error rather than a 404.
#[derive(Debug, Clone, Copy)]
pub struct IdPath<T>(pub T);

impl<T, S> FromRequestParts<S> for IdPath<T>
where
    T: FromStr,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::InvalidId(rejection.body_text()))?;

        raw.parse::<T>()
            .map(IdPath)
            .map_err(|_| AppError::InvalidId(raw))
    }
}
