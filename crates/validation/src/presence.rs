//! Existence and uniqueness lookups for `exists` / `unique` rules.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PresenceError {
    #[error("unknown table or column: {table}.{column}")]
    UnknownColumn { table: String, column: String },

    #[error("presence lookup failed: {0}")]
    Backend(String),
}

/// Counts rows whose `column` equals `value`.
///
/// Storage adapters implement this; the validator never sees a connection.
#[async_trait]
pub trait PresenceVerifier: Send + Sync {
    /// Count matching rows, skipping the row whose `id` equals `ignore_id`.
    async fn count(
        &self,
        table: &str,
        column: &str,
        value: &Value,
        ignore_id: Option<i64>,
    ) -> Result<u64, PresenceError>;
}

/// Compare a stored value with a submitted one the way a SQL `=` on a loosely
/// typed column would: `5` matches `"5"`, strings compare exactly.
pub fn loosely_equal(stored: &Value, submitted: &Value) -> bool {
    match (scalar_text(stored), scalar_text(submitted)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Text form of a scalar as a database would compare it; `None` for
/// null, arrays and objects.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => format!("{}", f as i64),
            _ => n.to_string(),
        }),
        Value::Bool(b) => Some(if *b { "1".into() } else { "0".into() }),
        _ => None,
    }
}

/// Fixed row set keyed by table, for tests and request-level unit checks.
#[derive(Debug, Default)]
pub struct InMemoryPresenceVerifier {
    rows: RwLock<HashMap<String, Vec<(i64, serde_json::Map<String, Value>)>>>,
}

impl InMemoryPresenceVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a row. `row` must be a JSON object; its `id` is taken from the argument.
    pub fn insert(&self, table: &str, id: i64, row: Value) {
        let mut map = match row {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        map.insert("id".to_string(), Value::from(id));
        if let Ok(mut rows) = self.rows.write() {
            rows.entry(table.to_string()).or_default().push((id, map));
        }
    }

    /// Builder-style `insert`.
    pub fn with_row(self, table: &str, id: i64, row: Value) -> Self {
        self.insert(table, id, row);
        self
    }
}

#[async_trait]
impl PresenceVerifier for InMemoryPresenceVerifier {
    async fn count(
        &self,
        table: &str,
        column: &str,
        value: &Value,
        ignore_id: Option<i64>,
    ) -> Result<u64, PresenceError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| PresenceError::Backend("lock poisoned".into()))?;
        let Some(table_rows) = rows.get(table) else {
            return Ok(0);
        };
        let n = table_rows
            .iter()
            .filter(|(id, _)| Some(*id) != ignore_id)
            .filter(|(_, row)| row.get(column).is_some_and(|stored| loosely_equal(stored, value)))
            .count();
        Ok(n as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_and_numeric_strings_compare_equal() {
        assert!(loosely_equal(&json!(5), &json!("5")));
        assert!(loosely_equal(&json!(5.0), &json!(5)));
        assert!(!loosely_equal(&json!("a@b.io"), &json!("A@b.io")));
        assert!(!loosely_equal(&Value::Null, &Value::Null));
    }

    #[tokio::test]
    async fn count_respects_ignore_id() {
        let v = InMemoryPresenceVerifier::new()
            .with_row("providers", 1, json!({"email": "a@x.io"}))
            .with_row("providers", 2, json!({"email": "b@x.io"}));

        assert_eq!(v.count("providers", "email", &json!("a@x.io"), None).await.unwrap(), 1);
        assert_eq!(v.count("providers", "email", &json!("a@x.io"), Some(1)).await.unwrap(), 0);
        assert_eq!(v.count("providers", "id", &json!("2"), None).await.unwrap(), 1);
        assert_eq!(v.count("brands", "id", &json!(1), None).await.unwrap(), 0);
    }
}
