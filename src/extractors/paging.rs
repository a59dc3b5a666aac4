//! `page`, `size` and `sort` query parameters.

use crate::domain::{PageRequest, Sort};
use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;

/// Page size used when the request has no `size`. Install it as a request
/// extension to override [`PageRequest::DEFAULT_SIZE`].
#[derive(Clone, Copy, Debug)]
pub struct DefaultPageSize(pub u64);

#[derive(Deserialize)]
struct PageQuery {
    page: Option<String>,
    size: Option<String>,
}

#[derive(Deserialize)]
struct SortQuery {
    sort: Option<String>,
}

/// `?page=<n>&size=<n>`; page defaults to 0. Negative page or non-positive
/// size is rejected with 422.
#[derive(Clone, Copy, Debug)]
pub struct Pageable(pub PageRequest);

fn parse_index(name: &str, raw: Option<&str>) -> Result<Option<i64>, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<i64>()
        .map(Some)
        .map_err(|_| AppError::invalid_field("query", name, "value is not a valid integer"))
}

#[async_trait]
impl<S> FromRequestParts<S> for Pageable
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(q) = Query::<PageQuery>::try_from_uri(&parts.uri)
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        let default_size = parts
            .extensions
            .get::<DefaultPageSize>()
            .map(|d| d.0)
            .unwrap_or(PageRequest::DEFAULT_SIZE);

        let page = parse_index("page", q.page.as_deref())?.unwrap_or(0);
        if page < 0 {
            return Err(AppError::invalid_field("query", "page", "must not be negative"));
        }
        let size = match parse_index("size", q.size.as_deref())? {
            Some(size) => size,
            None => i64::try_from(default_size).unwrap_or(i64::MAX),
        };
        if size <= 0 {
            return Err(AppError::invalid_field("query", "size", "must be greater than 0"));
        }
        Ok(Pageable(PageRequest::new(page, size)?))
    }
}

/// `?sort=id.asc,value.des`; absent or blank means unsorted.
#[derive(Clone, Debug, Default)]
pub struct SortParam(pub Option<Sort>);

#[async_trait]
impl<S> FromRequestParts<S> for SortParam
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(q) = Query::<SortQuery>::try_from_uri(&parts.uri)
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        let Some(raw) = q.sort.filter(|s| !s.trim().is_empty()) else {
            return Ok(SortParam(None));
        };
        let sort = raw
            .parse::<Sort>()
            .map_err(|e| AppError::invalid_field("query", "sort", e.to_string()))?;
        Ok(SortParam(Some(sort)))
    }
}
