//! Relational backend over the sqlx `Any` driver (PostgreSQL or SQLite).
//!
//! Sort becomes ORDER BY, a page request becomes LIMIT/OFFSET, and every
//! statement is built by [`builder`] with values bound as parameters.

mod builder;
mod params;

pub use builder::QueryBuf;
pub use params::{bind_all, row_to_json, BindValue};

use crate::domain::model::{record_id, to_record};
use crate::domain::{resolve_sort, validate_model, Model, Page, PageRequest, Sort};
use crate::error::DataError;
use crate::repository::{CrudRepository, DataResult, PagingRepository, UnitOfWork};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::any::{Any, AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Row, Transaction};
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::Mutex;

type SharedTx = Arc<Mutex<Option<Transaction<'static, Any>>>>;

/// Open a pool for `database_url` (`postgres://...`, `sqlite::memory:`, `sqlite://file.db`).
///
/// An in-memory SQLite database lives on a single connection, so pass
/// `max_connections = 1` for it.
pub async fn connect(database_url: &str, max_connections: u32) -> DataResult<AnyPool> {
    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(max_connections)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Repository for one table. A handle obtained from [`UnitOfWork::begin`]
/// runs every statement inside its own transaction; the root handle runs
/// them on the pool.
pub struct SqlRepository<M> {
    pool: AnyPool,
    tx: Option<SharedTx>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> SqlRepository<M> {
    /// Fails with `InvalidArgument` when the declaration of `M` is unusable.
    pub fn new(pool: AnyPool) -> DataResult<Self> {
        validate_model::<M>()?;
        Ok(SqlRepository {
            pool,
            tx: None,
            _model: PhantomData,
        })
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn in_session(&self) -> bool {
        self.tx.is_some()
    }

    async fn fetch_all(&self, q: &QueryBuf) -> DataResult<Vec<AnyRow>> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let query = bind_all(sqlx::query(&q.sql), &q.params);
        let rows = match &self.tx {
            Some(tx) => {
                let mut guard = tx.lock().await;
                let conn = guard.as_mut().ok_or(DataError::SessionClosed)?;
                query.fetch_all(&mut **conn).await?
            }
            None => query.fetch_all(&self.pool).await?,
        };
        Ok(rows)
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> DataResult<Option<AnyRow>> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let query = bind_all(sqlx::query(&q.sql), &q.params);
        let row = match &self.tx {
            Some(tx) => {
                let mut guard = tx.lock().await;
                let conn = guard.as_mut().ok_or(DataError::SessionClosed)?;
                query.fetch_optional(&mut **conn).await?
            }
            None => query.fetch_optional(&self.pool).await?,
        };
        Ok(row)
    }

    async fn execute(&self, q: &QueryBuf) -> DataResult<u64> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let query = bind_all(sqlx::query(&q.sql), &q.params);
        let result = match &self.tx {
            Some(tx) => {
                let mut guard = tx.lock().await;
                let conn = guard.as_mut().ok_or(DataError::SessionClosed)?;
                query.execute(&mut **conn).await?
            }
            None => query.execute(&self.pool).await?,
        };
        Ok(result.rows_affected())
    }

    async fn count_rows(&self, q: &QueryBuf) -> DataResult<u64> {
        let row = self
            .fetch_optional(q)
            .await?
            .ok_or(DataError::Sql(sqlx::Error::RowNotFound))?;
        let n: i64 = row.try_get(0)?;
        Ok(n.max(0) as u64)
    }

    fn decode(row: &AnyRow) -> DataResult<M> {
        Ok(serde_json::from_value(row_to_json(row))?)
    }

    fn decode_all(rows: &[AnyRow]) -> DataResult<Vec<M>> {
        rows.iter().map(Self::decode).collect()
    }

    fn id_value(id: &M::Id) -> DataResult<Value> {
        Ok(serde_json::to_value(id)?)
    }

    fn id_values(ids: &[M::Id]) -> DataResult<Vec<Value>> {
        ids.iter().map(Self::id_value).collect()
    }

    /// Insert or full replace on the current executor. A replace that matches
    /// no row inserts the record with its id.
    async fn save_record(&self, model: M) -> DataResult<M> {
        let record = to_record(&model)?;
        let row = match record_id(&record).cloned() {
            None => {
                let q = builder::insert(M::COLLECTION, M::FIELDS, &record, false);
                self.fetch_optional(&q).await?
            }
            Some(id) => {
                let q = builder::update(M::COLLECTION, M::FIELDS, id, &record);
                match self.fetch_optional(&q).await? {
                    Some(row) => Some(row),
                    None => {
                        let q = builder::insert(M::COLLECTION, M::FIELDS, &record, true);
                        self.fetch_optional(&q).await?
                    }
                }
            }
        };
        let row = row.ok_or(DataError::Sql(sqlx::Error::RowNotFound))?;
        Self::decode(&row)
    }

    async fn save_records(&self, models: Vec<M>) -> DataResult<Vec<M>> {
        let mut out = Vec::with_capacity(models.len());
        for model in models {
            out.push(self.save_record(model).await?);
        }
        Ok(out)
    }
}

impl<M> Clone for SqlRepository<M> {
    fn clone(&self) -> Self {
        SqlRepository {
            pool: self.pool.clone(),
            tx: self.tx.clone(),
            _model: PhantomData,
        }
    }
}

#[async_trait]
impl<M: Model> CrudRepository<M> for SqlRepository<M> {
    async fn count(&self) -> DataResult<u64> {
        self.count_rows(&builder::count(M::COLLECTION)).await
    }

    async fn delete_all(&self) -> DataResult<()> {
        self.execute(&builder::delete_all(M::COLLECTION)).await?;
        Ok(())
    }

    async fn delete_all_by_id(&self, ids: &[M::Id]) -> DataResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let q = builder::delete_by_ids(M::COLLECTION, &Self::id_values(ids)?);
        self.execute(&q).await?;
        Ok(())
    }

    async fn delete_by_id(&self, id: &M::Id) -> DataResult<()> {
        let q = builder::delete_by_id(M::COLLECTION, Self::id_value(id)?);
        self.execute(&q).await?;
        Ok(())
    }

    async fn exists_by_id(&self, id: &M::Id) -> DataResult<bool> {
        let q = builder::count_by_id(M::COLLECTION, Self::id_value(id)?);
        Ok(self.count_rows(&q).await? > 0)
    }

    async fn find_all(&self, sort: Option<&Sort>) -> DataResult<Vec<M>> {
        let orders = resolve_sort::<M>(sort)?;
        let rows = self.fetch_all(&builder::select_all(M::COLLECTION, &orders)).await?;
        Self::decode_all(&rows)
    }

    async fn find_all_by_id(&self, ids: &[M::Id]) -> DataResult<Vec<M>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let q = builder::select_by_ids(M::COLLECTION, &Self::id_values(ids)?);
        let rows = self.fetch_all(&q).await?;
        Self::decode_all(&rows)
    }

    async fn find_by_id(&self, id: &M::Id) -> DataResult<Option<M>> {
        let q = builder::select_by_id(M::COLLECTION, Self::id_value(id)?);
        self.fetch_optional(&q).await?.as_ref().map(Self::decode).transpose()
    }

    async fn save(&self, model: M) -> DataResult<M> {
        self.save_record(model).await
    }

    async fn save_all(&self, models: Vec<M>) -> DataResult<Vec<M>> {
        if self.in_session() {
            return self.save_records(models).await;
        }
        let session = self.begin().await?;
        let saved = session.save_records(models).await?;
        session.commit().await?;
        Ok(saved)
    }
}

#[async_trait]
impl<M: Model> PagingRepository<M> for SqlRepository<M> {
    async fn find_page(&self, page_request: &PageRequest, sort: Option<&Sort>) -> DataResult<Page<M>> {
        let orders = resolve_sort::<M>(sort)?;
        let q = builder::select_page(M::COLLECTION, &orders, page_request.size(), page_request.offset());
        let content = Self::decode_all(&self.fetch_all(&q).await?)?;
        let total = self.count().await?;
        Ok(Page::new(content, Some(*page_request), Some(total)))
    }
}

#[async_trait]
impl<M: Model> UnitOfWork for SqlRepository<M> {
    async fn begin(&self) -> DataResult<Self> {
        let tx = self.pool.begin().await?;
        Ok(SqlRepository {
            pool: self.pool.clone(),
            tx: Some(Arc::new(Mutex::new(Some(tx)))),
            _model: PhantomData,
        })
    }

    /// Commits the session; a root handle has nothing to commit.
    async fn commit(self) -> DataResult<()> {
        let Some(shared) = self.tx else { return Ok(()) };
        let tx = shared.lock().await.take().ok_or(DataError::SessionClosed)?;
        tx.commit().await?;
        tracing::debug!(table = M::COLLECTION, "session committed");
        Ok(())
    }
}
