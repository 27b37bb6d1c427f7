use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

/// A single-table read: column projection, equality filters and an
/// optional sort column.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    table: String,
    columns: String,
    filters: Vec<(String, Value)>,
    order: Option<(String, Order)>,
}

impl Select {
    /// Select every column of `table`.
    pub fn from(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: None,
        }
    }

    /// Comma separated column list, e.g. `"user_id, username"`.
    pub fn columns(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push((column.to_string(), value.into()));
        self
    }

    pub fn order(mut self, column: &str, order: Order) -> Self {
        self.order = Some((column.to_string(), order));
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Requested column names with whitespace removed; empty for `*`.
    pub fn column_names(&self) -> Vec<&str> {
        if self.columns.trim() == "*" {
            return Vec::new();
        }
        self.columns
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect()
    }

    pub fn filters(&self) -> &[(String, Value)] {
        &self.filters
    }

    pub fn ordering(&self) -> Option<(&str, Order)> {
        self.order.as_ref().map(|(c, o)| (c.as_str(), *o))
    }
}

/// Transport to a table store. Implementations return raw JSON rows;
/// [`crate::Store`] does the typed decoding.
#[async_trait]
pub trait TableBackend: Send + Sync {
    async fn select(&self, query: &Select) -> Result<Vec<Value>>;

    /// Insert one row, returning the stored representation
    /// (including service-assigned columns).
    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>>;
}
