//! Storage capability traits and their backends.
//!
//! A backend implements [`CrudRepository`] and [`PagingRepository`] for a
//! [`Model`] type, plus [`UnitOfWork`] so the HTTP layer can scope one session
//! per request.

pub mod document;
pub mod sql;

pub use document::DocumentRepository;
pub use sql::SqlRepository;

use crate::domain::{Model, Page, PageRequest, Sort};
use crate::error::DataError;
use async_trait::async_trait;

pub type DataResult<T> = Result<T, DataError>;

/// Generic CRUD operations for one model type.
#[async_trait]
pub trait CrudRepository<M: Model>: Send + Sync {
    async fn count(&self) -> DataResult<u64>;

    async fn delete_all(&self) -> DataResult<()>;

    async fn delete_all_by_id(&self, ids: &[M::Id]) -> DataResult<()>;

    async fn delete_by_id(&self, id: &M::Id) -> DataResult<()>;

    async fn exists_by_id(&self, id: &M::Id) -> DataResult<bool>;

    async fn find_all(&self, sort: Option<&Sort>) -> DataResult<Vec<M>>;

    async fn find_all_by_id(&self, ids: &[M::Id]) -> DataResult<Vec<M>>;

    async fn find_by_id(&self, id: &M::Id) -> DataResult<Option<M>>;

    /// Inserts when the model has no id, otherwise replaces the record at that id.
    /// Returns the stored record as reloaded from the backend.
    async fn save(&self, model: M) -> DataResult<M>;

    /// Saves every model within one session or batch.
    async fn save_all(&self, models: Vec<M>) -> DataResult<Vec<M>>;
}

/// Adds windowed retrieval to [`CrudRepository`].
#[async_trait]
pub trait PagingRepository<M: Model>: CrudRepository<M> {
    /// Content for the requested window; `total_elements` is the unwindowed count.
    async fn find_page(&self, page_request: &PageRequest, sort: Option<&Sort>) -> DataResult<Page<M>>;
}

/// Request-scoped session lifecycle.
///
/// `begin` opens a handle bound to a fresh session; `commit` makes its writes
/// durable. Dropping a begun handle without committing discards its writes
/// where the backend supports it.
#[async_trait]
pub trait UnitOfWork: Sized + Send + Sync {
    async fn begin(&self) -> DataResult<Self>;

    async fn commit(self) -> DataResult<()>;
}
