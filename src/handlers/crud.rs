//! The five CRUD handlers, generic over a resource mapper and its repository.
//!
//! Each request runs on its own repository session: begun before the first
//! repository call, committed after the last. An error drops the session,
//! which discards its writes.

use crate::domain::{Model, Page};
use crate::error::AppError;
use crate::extractors::{IdPath, Pageable, RequestUrl, SortParam, ValidJson};
use crate::repository::{PagingRepository, UnitOfWork};
use crate::response::{created, paginated, PageBody};
use crate::routes::CrudEndpoints;
use crate::service::{CrudService, Mapper};
use axum::{extract::State, http::StatusCode, response::Response, Json};
use std::sync::Arc;

type Id<Mp> = <<Mp as Mapper>::Model as Model>::Id;

async fn begin<Mp, R>(ep: &CrudEndpoints<Mp, R>) -> Result<CrudService<Mp::Model, R>, AppError>
where
    Mp: Mapper,
    R: PagingRepository<Mp::Model> + UnitOfWork + 'static,
{
    Ok(CrudService::begin(ep.repository()).await?)
}

/// GET `{prefix}/`: one page of resources plus `Link` navigation.
pub async fn read_all<Mp, R>(
    State(ep): State<Arc<CrudEndpoints<Mp, R>>>,
    RequestUrl(url): RequestUrl,
    Pageable(page_request): Pageable,
    SortParam(sort): SortParam,
) -> Result<Response, AppError>
where
    Mp: Mapper,
    R: PagingRepository<Mp::Model> + UnitOfWork + 'static,
{
    let service = begin(&*ep).await?;
    let page = service.find_page(&page_request, sort.as_ref()).await?;
    service.commit().await?;
    let link = link_header(&url, &page);
    Ok(paginated(PageBody::from(page.map(Mp::to_read)), link))
}

/// POST `{prefix}/`: 201 with the stored resource and its `Location`.
pub async fn create<Mp, R>(
    State(ep): State<Arc<CrudEndpoints<Mp, R>>>,
    RequestUrl(url): RequestUrl,
    ValidJson(payload): ValidJson<Mp::Create>,
) -> Result<Response, AppError>
where
    Mp: Mapper,
    R: PagingRepository<Mp::Model> + UnitOfWork + 'static,
{
    let service = begin(&*ep).await?;
    let model = service.create(Mp::to_model(payload)).await?;
    service.commit().await?;
    let location = created_location(&url, &model)?;
    Ok(created(Mp::to_read(model), &location))
}

pub async fn read_one<Mp, R>(
    State(ep): State<Arc<CrudEndpoints<Mp, R>>>,
    IdPath(id): IdPath<Id<Mp>>,
) -> Result<Json<Mp::Read>, AppError>
where
    Mp: Mapper,
    R: PagingRepository<Mp::Model> + UnitOfWork + 'static,
{
    let service = begin(&*ep).await?;
    let model = service.find_by_id(&id).await?;
    service.commit().await?;
    Ok(Json(Mp::to_read(model)))
}

/// PUT `{prefix}/:id`: full overwrite of an existing resource.
pub async fn update<Mp, R>(
    State(ep): State<Arc<CrudEndpoints<Mp, R>>>,
    IdPath(id): IdPath<Id<Mp>>,
    ValidJson(payload): ValidJson<Mp::Create>,
) -> Result<Json<Mp::Read>, AppError>
where
    Mp: Mapper,
    R: PagingRepository<Mp::Model> + UnitOfWork + 'static,
{
    let service = begin(&*ep).await?;
    let model = service.update(&id, Mp::to_model(payload)).await?;
    service.commit().await?;
    Ok(Json(Mp::to_read(model)))
}

pub async fn delete<Mp, R>(
    State(ep): State<Arc<CrudEndpoints<Mp, R>>>,
    IdPath(id): IdPath<Id<Mp>>,
) -> Result<StatusCode, AppError>
where
    Mp: Mapper,
    R: PagingRepository<Mp::Model> + UnitOfWork + 'static,
{
    let service = begin(&*ep).await?;
    service.delete(&id).await?;
    service.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `Link` value for `page`, built from the request URL by rewriting its
/// `page=<current>` parameter. Empty when there is nowhere to go.
pub fn link_header<T>(url: &str, page: &Page<T>) -> String {
    let number = page.number();
    let current = format!("page={}", number);
    let to_page = |n: u64| url.replace(&current, &format!("page={}", n));
    let mut links = Vec::new();
    if page.has_next() {
        links.push(link(&to_page(number + 1), "next"));
    }
    if page.has_previous() {
        links.push(link(&to_page(number - 1), "prev"));
    }
    if !page.is_first() {
        links.push(link(&to_page(0), "first"));
    }
    // `last` carries total_pages, one past the final zero-based index.
    if !page.is_last() && page.total_pages() > 1 {
        links.push(link(&to_page(page.total_pages()), "last"));
    }
    links.join(", ")
}

fn link(uri: &str, rel: &str) -> String {
    format!("<{}>; rel=\"{}\"", uri, rel)
}

/// `Location` of a created resource: the request URL without trailing slashes, then `/{id}`.
pub fn location(url: &str, id: &str) -> String {
    format!("{}/{}", url.trim_end_matches('/'), id)
}

/// `Location` for a stored model; a model the store returned without an id is a server fault.
fn created_location<M: Model>(url: &str, model: &M) -> Result<String, AppError> {
    let id = model
        .id()
        .ok_or_else(|| AppError::Internal(format!("{} saved without an id", M::COLLECTION)))?;
    Ok(location(url, &id.to_string()))
}
