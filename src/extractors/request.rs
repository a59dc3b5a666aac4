//! Absolute request URL, JSON body and id path segment.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, OriginalUri, Path, Request},
    http::{header, request::Parts, StatusCode},
    Json,
};
use serde::de::DeserializeOwned;

pub const FORWARDED_PROTO_HEADER: &str = "x-forwarded-proto";

/// The absolute URL of the request as the client sent it, query included.
///
/// Uses the original (un-nested) URI; when it carries no scheme and
/// authority, they come from `X-Forwarded-Proto` (default `http`) and `Host`.
#[derive(Clone, Debug)]
pub struct RequestUrl(pub String);

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn absolute_url(parts: &Parts) -> String {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map(|o| &o.0)
        .unwrap_or(&parts.uri);
    if uri.scheme().is_some() && uri.authority().is_some() {
        return uri.to_string();
    }
    let scheme = header_str(parts, FORWARDED_PROTO_HEADER).unwrap_or("http");
    let host = header_str(parts, header::HOST.as_str()).unwrap_or("localhost");
    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    format!("{}://{}{}", scheme, host, path)
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestUrl
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestUrl(absolute_url(parts)))
    }
}

/// `Json<T>` whose decode failures are 422 validation errors.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidJson(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(e) => AppError::invalid_body(e.body_text()),
        JsonRejection::JsonSyntaxError(e) => AppError::invalid_body(e.body_text()),
        JsonRejection::MissingJsonContentType(e) => AppError::BadRequest(e.body_text()),
        other if other.status() == StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(other.body_text()),
        other => AppError::BadRequest(other.body_text()),
    }
}

/// The `:id` path segment decoded as the model id type; 422 when it does not parse.
#[derive(Clone, Debug)]
pub struct IdPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for IdPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::invalid_field("path", "id", e.body_text()))?;
        Ok(IdPath(id))
    }
}
