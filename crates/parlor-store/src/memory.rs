use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};

use parlor_types::models::tables;

use crate::error::{Result, StoreError};
use crate::table::{Order, Select, TableBackend};

/// In-process table store with the filter/insert/order behaviour of the
/// hosted one: identity columns are assigned on insert and unique columns
/// reject duplicates with a 409.
#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<HashMap<String, MemTable>>,
}

#[derive(Default)]
struct MemTable {
    rows: Vec<Map<String, Value>>,
    identity: Option<String>,
    next_id: i64,
    unique: Vec<String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tables shaped like the hosted chat schema.
    pub fn chat_schema() -> Self {
        Self::new()
            .with_identity(tables::USERS, "user_id")
            .with_unique(tables::USERS, "username")
            .with_unique(tables::CHATS, "chat_id")
            .with_identity(tables::MESSAGES, "meseg_id")
    }

    pub fn with_identity(self, table: &str, column: &str) -> Self {
        self.configure(table, |t| t.identity = Some(column.to_string()))
    }

    pub fn with_unique(self, table: &str, column: &str) -> Self {
        self.configure(table, |t| t.unique.push(column.to_string()))
    }

    fn configure(self, table: &str, f: impl FnOnce(&mut MemTable)) -> Self {
        if let Ok(mut tables) = self.tables.lock() {
            f(tables.entry(table.to_string()).or_default());
        }
        self
    }

    /// Number of rows currently stored in `table`.
    pub fn row_count(&self, table: &str) -> usize {
        self.tables
            .lock()
            .map(|t| t.get(table).map_or(0, |t| t.rows.len()))
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, MemTable>>> {
        self.tables.lock().map_err(|e| StoreError::Api {
            status: 500,
            message: format!("memory store lock poisoned: {e}"),
        })
    }
}

#[async_trait]
impl TableBackend for MemoryBackend {
    async fn select(&self, query: &Select) -> Result<Vec<Value>> {
        let tables = self.lock()?;
        let Some(table) = tables.get(query.table()) else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<&Map<String, Value>> = table
            .rows
            .iter()
            .filter(|row| {
                query
                    .filters()
                    .iter()
                    .all(|(column, value)| row.get(column).unwrap_or(&Value::Null) == value)
            })
            .collect();

        if let Some((column, order)) = query.ordering() {
            rows.sort_by(|a, b| {
                let ord = compare(a.get(column), b.get(column));
                match order {
                    Order::Ascending => ord,
                    Order::Descending => ord.reverse(),
                }
            });
        }

        let columns = query.column_names();
        Ok(rows
            .into_iter()
            .map(|row| {
                if columns.is_empty() {
                    return Value::Object(row.clone());
                }
                let projected = columns
                    .iter()
                    .filter_map(|c| row.get(*c).map(|v| ((*c).to_string(), v.clone())))
                    .collect();
                Value::Object(projected)
            })
            .collect())
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>> {
        let Value::Object(mut row) = row else {
            return Err(StoreError::Api {
                status: 400,
                message: format!("insert into {table} expects an object"),
            });
        };

        let mut tables = self.lock()?;
        let table_state = tables.entry(table.to_string()).or_default();

        for column in &table_state.unique {
            if let Some(value) = row.get(column) {
                if table_state.rows.iter().any(|r| r.get(column) == Some(value)) {
                    return Err(StoreError::Api {
                        status: 409,
                        message: format!("duplicate key value violates unique constraint on {table}.{column}"),
                    });
                }
            }
        }

        if let Some(identity) = &table_state.identity {
            if !row.contains_key(identity) {
                table_state.next_id += 1;
                row.insert(identity.clone(), Value::from(table_state.next_id));
            }
        }

        table_state.rows.push(row.clone());
        Ok(vec![Value::Object(row)])
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn identity_is_assigned_in_insert_order() {
        let store = MemoryBackend::chat_schema();
        let first = store.insert("meseges", json!({ "meseg": "a" })).await.unwrap();
        let second = store.insert("meseges", json!({ "meseg": "b" })).await.unwrap();

        assert_eq!(first[0]["meseg_id"], 1);
        assert_eq!(second[0]["meseg_id"], 2);
    }

    #[tokio::test]
    async fn unique_column_rejects_duplicates() {
        let store = MemoryBackend::chat_schema();
        store.insert("users", json!({ "username": "alice" })).await.unwrap();

        let err = store.insert("users", json!({ "username": "alice" })).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.row_count("users"), 1);
    }

    #[tokio::test]
    async fn select_filters_projects_and_orders() {
        let store = MemoryBackend::new();
        for (id, chat) in [(3, 0), (1, 0), (2, 5)] {
            store
                .insert("meseges", json!({ "meseg_id": id, "chat_id": chat, "meseg": format!("m{id}") }))
                .await
                .unwrap();
        }

        let rows = store
            .select(
                &Select::from("meseges")
                    .columns("meseg_id")
                    .eq("chat_id", 0)
                    .order("meseg_id", Order::Ascending),
            )
            .await
            .unwrap();

        assert_eq!(rows, vec![json!({ "meseg_id": 1 }), json!({ "meseg_id": 3 })]);
    }

    #[tokio::test]
    async fn unknown_table_reads_empty() {
        let rows = MemoryBackend::new().select(&Select::from("nothing")).await.unwrap();
        assert!(rows.is_empty());
    }
}
