//! Response bodies and headers for CRUD endpoints.

use crate::domain::Page;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Paged listing body: `{content, page, page_size, total_pages, total_elements}`.
#[derive(Debug, Serialize)]
pub struct PageBody<T> {
    pub content: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub total_elements: u64,
}

impl<T> From<Page<T>> for PageBody<T> {
    fn from(page: Page<T>) -> Self {
        let page_number = page.number();
        let page_size = page.size();
        let total_pages = page.total_pages();
        let total_elements = page
            .total_elements()
            .unwrap_or(page.number_of_elements() as u64);
        PageBody {
            content: page.into_content(),
            page: page_number,
            page_size,
            total_pages,
            total_elements,
        }
    }
}

/// 200 with a page body and, when non-empty, a `Link` header.
pub fn paginated<T: Serialize>(body: PageBody<T>, link: String) -> Response {
    let mut headers = HeaderMap::new();
    if !link.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&link) {
            headers.insert(header::LINK, value);
        }
    }
    (StatusCode::OK, headers, Json(body)).into_response()
}

/// 201 with the created resource and its `Location`.
pub fn created<T: Serialize>(body: T, location: &str) -> Response {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(location) {
        headers.insert(header::LOCATION, value);
    }
    (StatusCode::CREATED, headers, Json(body)).into_response()
}
