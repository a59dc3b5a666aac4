//! Builds parameterized SELECT, COUNT, INSERT, UPDATE, DELETE for one table.
//! Identifiers come from model declarations only; values are always parameters.

use crate::domain::{Order, ID_FIELD};
use serde_json::{Map, Value};

/// Quote identifier (safe: only from validated model declarations).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> String {
        self.params.push(v);
        format!("${}", self.params.len())
    }
}

fn order_clause(orders: &[&Order]) -> String {
    if orders.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = orders
        .iter()
        .map(|o| format!("{} {}", quoted(o.field()), o.direction().as_sql()))
        .collect();
    format!(" ORDER BY {}", parts.join(", "))
}

/// SELECT * with optional ORDER BY.
pub fn select_all(table: &str, orders: &[&Order]) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!("SELECT * FROM {}{}", quoted(table), order_clause(orders));
    q
}

/// SELECT * with optional ORDER BY, LIMIT and OFFSET.
pub fn select_page(table: &str, orders: &[&Order], limit: u64, offset: u64) -> QueryBuf {
    let mut q = select_all(table, orders);
    q.sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));
    q
}

pub fn select_by_id(table: &str, id: Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(id);
    q.sql = format!("SELECT * FROM {} WHERE {} = {}", quoted(table), quoted(ID_FIELD), ph);
    q
}

/// SELECT * WHERE id IN ($1, $2, ...) ORDER BY id.
pub fn select_by_ids(table: &str, ids: &[Value]) -> QueryBuf {
    let mut q = QueryBuf::new();
    if ids.is_empty() {
        q.sql = format!("SELECT * FROM {} WHERE 1 = 0", quoted(table));
        return q;
    }
    let placeholders: Vec<String> = ids.iter().map(|v| q.push_param(v.clone())).collect();
    q.sql = format!(
        "SELECT * FROM {} WHERE {} IN ({}) ORDER BY {}",
        quoted(table),
        quoted(ID_FIELD),
        placeholders.join(", "),
        quoted(ID_FIELD)
    );
    q
}

pub fn count(table: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!("SELECT COUNT(*) FROM {}", quoted(table));
    q
}

pub fn count_by_id(table: &str, id: Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(id);
    q.sql = format!("SELECT COUNT(*) FROM {} WHERE {} = {}", quoted(table), quoted(ID_FIELD), ph);
    q
}

/// INSERT ... RETURNING *. Writes the declared fields present in `record`;
/// absent fields are omitted so the column default applies. The id is written
/// only when `include_id` is set.
pub fn insert(table: &str, fields: &[&str], record: &Map<String, Value>, include_id: bool) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for field in fields {
        if *field == ID_FIELD && !include_id {
            continue;
        }
        let Some(val) = record.get(*field) else { continue };
        placeholders.push(q.push_param(val.clone()));
        cols.push(quoted(field));
    }
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING *", quoted(table))
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
            quoted(table),
            cols.join(", "),
            placeholders.join(", ")
        )
    };
    q
}

/// UPDATE by id ... RETURNING *. Sets every declared non-id field; fields
/// missing from `record` are written as NULL (full replace).
pub fn update(table: &str, fields: &[&str], id: Value, record: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for field in fields {
        if *field == ID_FIELD {
            continue;
        }
        let val = record.get(*field).cloned().unwrap_or(Value::Null);
        let ph = q.push_param(val);
        sets.push(format!("{} = {}", quoted(field), ph));
    }
    if sets.is_empty() {
        return select_by_id(table, id);
    }
    let id_ph = q.push_param(id);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING *",
        quoted(table),
        sets.join(", "),
        quoted(ID_FIELD),
        id_ph
    );
    q
}

pub fn delete_all(table: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!("DELETE FROM {}", quoted(table));
    q
}

pub fn delete_by_id(table: &str, id: Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(id);
    q.sql = format!("DELETE FROM {} WHERE {} = {}", quoted(table), quoted(ID_FIELD), ph);
    q
}

pub fn delete_by_ids(table: &str, ids: &[Value]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let placeholders: Vec<String> = ids.iter().map(|v| q.push_param(v.clone())).collect();
    q.sql = format!(
        "DELETE FROM {} WHERE {} IN ({})",
        quoted(table),
        quoted(ID_FIELD),
        placeholders.join(", ")
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn select_orders_in_sequence() {
        let id = Order::asc("id");
        let value = Order::desc("value");
        let q = select_page("note", &[&id, &value], 1, 1);
        assert_eq!(
            q.sql,
            r#"SELECT * FROM "note" ORDER BY "id" ASC, "value" DESC LIMIT 1 OFFSET 1"#
        );
        assert!(q.params.is_empty());

        assert_eq!(select_all("note", &[]).sql, r#"SELECT * FROM "note""#);
    }

    #[test]
    fn insert_skips_missing_id() {
        let q = insert("note", &["id", "value"], &record(json!({"id": null, "value": "v"})), false);
        assert_eq!(q.sql, r#"INSERT INTO "note" ("value") VALUES ($1) RETURNING *"#);
        assert_eq!(q.params, vec![json!("v")]);

        let q = insert("note", &["id", "value"], &record(json!({"id": 9, "value": "v"})), true);
        assert_eq!(q.sql, r#"INSERT INTO "note" ("id", "value") VALUES ($1, $2) RETURNING *"#);
        assert_eq!(q.params, vec![json!(9), json!("v")]);
    }

    #[test]
    fn update_replaces_every_field() {
        let q = update("note", &["id", "value", "tag"], json!(3), &record(json!({"value": "v"})));
        assert_eq!(
            q.sql,
            r#"UPDATE "note" SET "value" = $1, "tag" = $2 WHERE "id" = $3 RETURNING *"#
        );
        assert_eq!(q.params, vec![json!("v"), Value::Null, json!(3)]);
    }

    #[test]
    fn id_lists() {
        let q = select_by_ids("note", &[json!(1), json!(2)]);
        assert_eq!(
            q.sql,
            r#"SELECT * FROM "note" WHERE "id" IN ($1, $2) ORDER BY "id""#
        );
        assert_eq!(select_by_ids("note", &[]).sql, r#"SELECT * FROM "note" WHERE 1 = 0"#);

        let q = delete_by_ids("note", &[json!(4)]);
        assert_eq!(q.sql, r#"DELETE FROM "note" WHERE "id" IN ($1)"#);
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(count("we\"ird").sql, r#"SELECT COUNT(*) FROM "we""ird""#);
        assert_eq!(count_by_id("note", json!(1)).sql, r#"SELECT COUNT(*) FROM "note" WHERE "id" = $1"#);
    }
}
