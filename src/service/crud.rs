//! Generic CRUD use cases over any paging repository.

use crate::domain::{Model, Page, PageRequest, Sort};
use crate::error::ServiceError;
use crate::repository::{PagingRepository, UnitOfWork};
use std::marker::PhantomData;

pub struct CrudService<M, R> {
    repository: R,
    _model: PhantomData<fn() -> M>,
}

impl<M, R> CrudService<M, R>
where
    M: Model,
    R: PagingRepository<M>,
{
    pub fn new(repository: R) -> Self {
        CrudService {
            repository,
            _model: PhantomData,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub async fn find_all(&self, sort: Option<&Sort>) -> Result<Vec<M>, ServiceError> {
        Ok(self.repository.find_all(sort).await?)
    }

    pub async fn find_page(&self, page_request: &PageRequest, sort: Option<&Sort>) -> Result<Page<M>, ServiceError> {
        Ok(self.repository.find_page(page_request, sort).await?)
    }

    /// Fails with `EntityNotFound` when nothing is stored at `id`.
    pub async fn find_by_id(&self, id: &M::Id) -> Result<M, ServiceError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found::<M>(id))
    }

    pub async fn create(&self, model: M) -> Result<M, ServiceError> {
        Ok(self.repository.save(model).await?)
    }

    /// Overwrites every non-id attribute of the stored record with `patch`,
    /// then saves it. A missing record is `EntityNotFound`, never an insert.
    pub async fn update(&self, id: &M::Id, patch: M) -> Result<M, ServiceError> {
        let mut existing = self.find_by_id(id).await?;
        existing.overwrite_with(patch);
        Ok(self.repository.save(existing).await?)
    }

    pub async fn delete(&self, id: &M::Id) -> Result<(), ServiceError> {
        if !self.repository.exists_by_id(id).await? {
            return Err(not_found::<M>(id));
        }
        self.repository.delete_by_id(id).await?;
        Ok(())
    }
}

impl<M, R> CrudService<M, R>
where
    M: Model,
    R: PagingRepository<M> + UnitOfWork,
{
    /// A service bound to a fresh session of `repository`.
    pub async fn begin(repository: &R) -> Result<Self, ServiceError> {
        Ok(CrudService::new(repository.begin().await?))
    }

    pub async fn commit(self) -> Result<(), ServiceError> {
        self.repository.commit().await?;
        Ok(())
    }
}

fn not_found<M: Model>(id: &M::Id) -> ServiceError {
    ServiceError::EntityNotFound {
        model: M::COLLECTION,
        id: id.to_string(),
    }
}
