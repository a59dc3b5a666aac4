//! Persisted model declaration shared by every repository backend.

use crate::domain::sort::{is_identifier, Order, Sort};
use crate::error::DataError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Name of the identity attribute on every model.
pub const ID_FIELD: &str = "id";

/// An identified record that a repository can persist.
///
/// The type serializes to a keyed record (a JSON object) whose keys include
/// the names in [`Model::FIELDS`]. An absent or null `id` means "not yet
/// persisted"; the backend assigns one on save.
///
/// ```ignore
/// impl Model for Note {
///     type Id = i64;
///     const COLLECTION: &'static str = "note";
///     const FIELDS: &'static [&'static str] = &["id", "value"];
///     fn id(&self) -> Option<&i64> { self.id.as_ref() }
///     fn overwrite_with(&mut self, patch: Self) { self.value = patch.value; }
/// }
/// ```
pub trait Model: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    type Id: Serialize + DeserializeOwned + Clone + fmt::Display + fmt::Debug + Send + Sync + 'static;

    /// Table or collection name.
    const COLLECTION: &'static str;

    /// Persisted attribute names, identity included.
    const FIELDS: &'static [&'static str];

    fn id(&self) -> Option<&Self::Id>;

    /// Copies every attribute except the identity from `patch`, defaults included.
    fn overwrite_with(&mut self, patch: Self);

    fn has_field(name: &str) -> bool {
        Self::FIELDS.contains(&name)
    }
}

/// Checks the declaration of `M`: identifier names, no duplicates, `id` present.
pub fn validate_model<M: Model>() -> Result<(), DataError> {
    if !is_identifier(M::COLLECTION) {
        return Err(DataError::invalid_argument(format!(
            "invalid collection name: '{}'",
            M::COLLECTION
        )));
    }
    let mut seen = HashSet::new();
    for field in M::FIELDS {
        if !is_identifier(field) {
            return Err(DataError::invalid_argument(format!(
                "{}: invalid field name '{}'",
                M::COLLECTION,
                field
            )));
        }
        if !seen.insert(*field) {
            return Err(DataError::invalid_argument(format!(
                "{}: duplicate field '{}'",
                M::COLLECTION,
                field
            )));
        }
    }
    if !M::has_field(ID_FIELD) {
        return Err(DataError::invalid_argument(format!(
            "{}: fields must include '{}'",
            M::COLLECTION,
            ID_FIELD
        )));
    }
    Ok(())
}

/// Resolves every order against the declared fields of `M`.
pub fn resolve_sort<'a, M: Model>(sort: Option<&'a Sort>) -> Result<Vec<&'a Order>, DataError> {
    let Some(sort) = sort else { return Ok(Vec::new()) };
    sort.iter()
        .map(|order| {
            if M::has_field(order.field()) {
                Ok(order)
            } else {
                Err(DataError::UnknownSortKey {
                    model: M::COLLECTION,
                    key: order.field().to_string(),
                })
            }
        })
        .collect()
}

/// Serializes `model` into its keyed record.
pub fn to_record<M: Model>(model: &M) -> Result<serde_json::Map<String, serde_json::Value>, DataError> {
    match serde_json::to_value(model)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(DataError::UnsupportedModelType(format!(
            "{} must serialize to an object, got {}",
            M::COLLECTION,
            json_kind(&other)
        ))),
    }
}

/// The identity of a record, `None` when absent or null.
pub fn record_id(record: &serde_json::Map<String, serde_json::Value>) -> Option<&serde_json::Value> {
    record.get(ID_FIELD).filter(|v| !v.is_null())
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
