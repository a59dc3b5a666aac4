//! Document backend over an embedded sled database.
//!
//! One tree per collection. Keys are the string form of the id; values are
//! the JSON record with `id` stored under `_id`. Sorting and windowing happen
//! in memory, after the scan.

use crate::domain::model::{record_id, to_record};
use crate::domain::{resolve_sort, validate_model, Model, Order, Page, PageRequest, Sort, ID_FIELD};
use crate::error::DataError;
use crate::repository::{CrudRepository, DataResult, PagingRepository, UnitOfWork};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sled::transaction::{ConflictableTransactionResult, TransactionError};
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::path::Path;

/// Name of the stored identity attribute.
pub const DOCUMENT_ID: &str = "_id";

/// Open the database at `path`, or a temporary one that is removed on drop.
pub fn open(path: Option<&Path>) -> DataResult<sled::Db> {
    let db = match path {
        Some(path) => sled::open(path)?,
        None => sled::Config::new()
            .temporary(true)
            .flush_every_ms(None)
            .open()?,
    };
    Ok(db)
}

pub struct DocumentRepository<M> {
    tree: sled::Tree,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> DocumentRepository<M> {
    /// Opens (or creates) the tree named after `M::COLLECTION`.
    ///
    /// Generated ids are strings, so `M::Id` must deserialize from one.
    pub fn new(db: &sled::Db) -> DataResult<Self> {
        validate_model::<M>()?;
        let probe = Value::String(uuid::Uuid::now_v7().to_string());
        if serde_json::from_value::<M::Id>(probe).is_err() {
            return Err(DataError::invalid_argument(format!(
                "{}: document ids must deserialize from a string",
                M::COLLECTION
            )));
        }
        Ok(DocumentRepository {
            tree: db.open_tree(M::COLLECTION)?,
            _model: PhantomData,
        })
    }

    pub fn tree(&self) -> &sled::Tree {
        &self.tree
    }

    /// Runs `f` against the tree on the blocking pool.
    async fn blocking<T, F>(&self, op: &'static str, f: F) -> DataResult<T>
    where
        T: Send + 'static,
        F: FnOnce(sled::Tree) -> DataResult<T> + Send + 'static,
    {
        tracing::debug!(collection = M::COLLECTION, op, "document");
        let tree = self.tree.clone();
        tokio::task::spawn_blocking(move || f(tree))
            .await
            .map_err(|e| DataError::Task(e.to_string()))?
    }

    fn key_of(id: &M::Id) -> DataResult<String> {
        Ok(match serde_json::to_value(id)? {
            Value::String(s) => s,
            other => other.to_string(),
        })
    }

    fn keys_of(ids: &[M::Id]) -> DataResult<Vec<String>> {
        ids.iter().map(Self::key_of).collect()
    }
}

impl<M> Clone for DocumentRepository<M> {
    fn clone(&self) -> Self {
        DocumentRepository {
            tree: self.tree.clone(),
            _model: PhantomData,
        }
    }
}

/// Record to stored bytes; the id moves to `_id` and is always the key.
fn encode(mut record: Map<String, Value>, key: &str) -> DataResult<Vec<u8>> {
    record.remove(ID_FIELD);
    record.insert(DOCUMENT_ID.to_string(), Value::String(key.to_string()));
    Ok(serde_json::to_vec(&record)?)
}

/// Stored bytes to record, with `_id` renamed back to `id`.
fn decode_record(bytes: &[u8]) -> DataResult<Map<String, Value>> {
    let mut record: Map<String, Value> = serde_json::from_slice(bytes)?;
    if let Some(id) = record.remove(DOCUMENT_ID) {
        record.insert(ID_FIELD.to_string(), id);
    }
    Ok(record)
}

fn into_model<M: Model>(record: Map<String, Value>) -> DataResult<M> {
    Ok(serde_json::from_value(Value::Object(record))?)
}

fn load<M: Model>(tree: &sled::Tree, key: &str) -> DataResult<Option<M>> {
    match tree.get(key.as_bytes())? {
        Some(bytes) => Ok(Some(into_model(decode_record(&bytes)?)?)),
        None => Ok(None),
    }
}

fn scan(tree: &sled::Tree) -> DataResult<Vec<Map<String, Value>>> {
    tree.iter()
        .values()
        .map(|bytes| decode_record(&bytes?))
        .collect()
}

/// Null and missing sort first, then numbers, strings, objects, arrays, booleans.
fn type_rank(v: Option<&Value>) -> u8 {
    match v {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let by_rank = type_rank(a).cmp(&type_rank(b));
    if by_rank != Ordering::Equal {
        return by_rank;
    }
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x @ (Value::Object(_) | Value::Array(_))), Some(y)) => x.to_string().cmp(&y.to_string()),
        _ => Ordering::Equal,
    }
}

/// Stable multi-key sort; earlier orders take precedence.
fn sort_records(records: &mut [Map<String, Value>], orders: &[Order]) {
    if orders.is_empty() {
        return;
    }
    records.sort_by(|a, b| {
        orders
            .iter()
            .map(|o| {
                let ord = compare_values(a.get(o.field()), b.get(o.field()));
                if o.direction().is_descending() {
                    ord.reverse()
                } else {
                    ord
                }
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

fn owned_orders<M: Model>(sort: Option<&Sort>) -> DataResult<Vec<Order>> {
    Ok(resolve_sort::<M>(sort)?.into_iter().cloned().collect())
}

/// Assigns a key to `model` (a fresh UUIDv7 when it has no id) and encodes it.
fn prepare<M: Model>(model: &M) -> DataResult<(String, Vec<u8>)> {
    let record = to_record(model)?;
    let key = match record_id(&record) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => uuid::Uuid::now_v7().to_string(),
    };
    let bytes = encode(record, &key)?;
    Ok((key, bytes))
}

#[async_trait]
impl<M: Model> CrudRepository<M> for DocumentRepository<M> {
    /// Number of entries in the tree, without a scan.
    async fn count(&self) -> DataResult<u64> {
        self.blocking("count", |tree| Ok(tree.len() as u64)).await
    }

    async fn delete_all(&self) -> DataResult<()> {
        self.blocking("delete_all", |tree| Ok(tree.clear()?)).await
    }

    async fn delete_all_by_id(&self, ids: &[M::Id]) -> DataResult<()> {
        let keys = Self::keys_of(ids)?;
        self.blocking("delete_all_by_id", move |tree| {
            let mut batch = sled::Batch::default();
            for key in keys {
                batch.remove(key.as_bytes());
            }
            Ok(tree.apply_batch(batch)?)
        })
        .await
    }

    async fn delete_by_id(&self, id: &M::Id) -> DataResult<()> {
        let key = Self::key_of(id)?;
        self.blocking("delete_by_id", move |tree| {
            tree.remove(key.as_bytes())?;
            Ok(())
        })
        .await
    }

    async fn exists_by_id(&self, id: &M::Id) -> DataResult<bool> {
        let key = Self::key_of(id)?;
        self.blocking("exists_by_id", move |tree| Ok(tree.contains_key(key.as_bytes())?))
            .await
    }

    async fn find_all(&self, sort: Option<&Sort>) -> DataResult<Vec<M>> {
        let orders = owned_orders::<M>(sort)?;
        self.blocking("find_all", move |tree| {
            let mut records = scan(&tree)?;
            sort_records(&mut records, &orders);
            records.into_iter().map(into_model).collect()
        })
        .await
    }

    async fn find_all_by_id(&self, ids: &[M::Id]) -> DataResult<Vec<M>> {
        let keys = Self::keys_of(ids)?;
        self.blocking("find_all_by_id", move |tree| {
            let mut found = Vec::with_capacity(keys.len());
            for key in &keys {
                if let Some(model) = load(&tree, key)? {
                    found.push(model);
                }
            }
            Ok(found)
        })
        .await
    }

    async fn find_by_id(&self, id: &M::Id) -> DataResult<Option<M>> {
        let key = Self::key_of(id)?;
        self.blocking("find_by_id", move |tree| load(&tree, &key)).await
    }

    /// Inserts or replaces the whole document, then reloads it.
    async fn save(&self, model: M) -> DataResult<M> {
        let (key, bytes) = prepare(&model)?;
        self.blocking("save", move |tree| {
            tree.insert(key.as_bytes(), bytes)?;
            load(&tree, &key)?.ok_or_else(|| DataError::Task(format!("document '{}' vanished after save", key)))
        })
        .await
    }

    /// Writes every document in one tree transaction.
    async fn save_all(&self, models: Vec<M>) -> DataResult<Vec<M>> {
        let docs = models.iter().map(prepare).collect::<DataResult<Vec<_>>>()?;
        self.blocking("save_all", move |tree| {
            tree.transaction(|tx| -> ConflictableTransactionResult<(), ()> {
                for (key, bytes) in &docs {
                    tx.insert(key.as_bytes(), bytes.as_slice())?;
                }
                Ok(())
            })
            .map_err(|e| match e {
                TransactionError::Storage(e) => DataError::Document(e),
                TransactionError::Abort(()) => DataError::Task("save_all aborted".into()),
            })?;
            let mut saved = Vec::with_capacity(docs.len());
            for (key, _) in &docs {
                if let Some(model) = load(&tree, key)? {
                    saved.push(model);
                }
            }
            Ok(saved)
        })
        .await
    }
}

#[async_trait]
impl<M: Model> PagingRepository<M> for DocumentRepository<M> {
    async fn find_page(&self, page_request: &PageRequest, sort: Option<&Sort>) -> DataResult<Page<M>> {
        let orders = owned_orders::<M>(sort)?;
        let request = *page_request;
        self.blocking("find_page", move |tree| {
            // Same source as `count`, so `total_elements` agrees with it.
            let total = tree.len() as u64;
            let mut records = scan(&tree)?;
            sort_records(&mut records, &orders);
            let content = records
                .into_iter()
                .skip(usize::try_from(request.offset()).unwrap_or(usize::MAX))
                .take(usize::try_from(request.size()).unwrap_or(usize::MAX))
                .map(into_model)
                .collect::<DataResult<Vec<M>>>()?;
            Ok(Page::new(content, Some(request), Some(total)))
        })
        .await
    }
}

/// Writes apply immediately; `commit` flushes them to disk.
#[async_trait]
impl<M: Model> UnitOfWork for DocumentRepository<M> {
    async fn begin(&self) -> DataResult<Self> {
        Ok(self.clone())
    }

    async fn commit(self) -> DataResult<()> {
        self.tree.flush_async().await?;
        Ok(())
    }
}
