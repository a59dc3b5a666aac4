//! REST routes for one resource, mounted under a URL prefix.

use crate::extractors::DefaultPageSize;
use crate::handlers::crud as h;
use crate::repository::{PagingRepository, UnitOfWork};
use crate::service::Mapper;
use axum::{routing::get, Extension, Router};
use std::marker::PhantomData;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// The five CRUD endpoints of a resource described by mapper `Mp`, stored in `R`.
///
/// | method | path            | handler                |
/// |--------|-----------------|------------------------|
/// | GET    | `{prefix}/`     | paged listing + `Link` |
/// | POST   | `{prefix}/`     | create, 201 + `Location` |
/// | GET    | `{prefix}/:id`  | read one               |
/// | PUT    | `{prefix}/:id`  | overwrite              |
/// | DELETE | `{prefix}/:id`  | delete, 204            |
///
/// The collection path answers with and without the trailing slash.
pub struct CrudEndpoints<Mp, R> {
    repository: R,
    prefix: String,
    body_limit: usize,
    default_page_size: u64,
    _mapper: PhantomData<fn() -> Mp>,
}

/// `notes`, `/notes/` and `/notes` all become `/notes`; `/` becomes empty.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

impl<Mp, R> CrudEndpoints<Mp, R>
where
    Mp: Mapper,
    R: PagingRepository<Mp::Model> + UnitOfWork + 'static,
{
    pub fn new(prefix: &str, repository: R) -> Self {
        CrudEndpoints {
            repository,
            prefix: normalize_prefix(prefix),
            body_limit: DEFAULT_BODY_LIMIT,
            default_page_size: crate::domain::PageRequest::DEFAULT_SIZE,
            _mapper: PhantomData,
        }
    }

    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    /// Page size when a listing request has no `size`; zero is ignored.
    pub fn with_default_page_size(mut self, size: u64) -> Self {
        if size > 0 {
            self.default_page_size = size;
        }
        self
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn router<S>(self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let prefix = self.prefix.clone();
        let page_size = DefaultPageSize(self.default_page_size);
        let body_limit = self.body_limit;
        let collection = || get(h::read_all::<Mp, R>).post(h::create::<Mp, R>);

        let mut router = Router::new().route(&format!("{}/", prefix), collection());
        if !prefix.is_empty() {
            router = router.route(&prefix, collection());
        }
        router
            .route(
                &format!("{}/:id", prefix),
                get(h::read_one::<Mp, R>)
                    .put(h::update::<Mp, R>)
                    .delete(h::delete::<Mp, R>),
            )
            .layer(Extension(page_size))
            .layer(RequestBodyLimitLayer::new(body_limit))
            .with_state(Arc::new(self))
    }
}
