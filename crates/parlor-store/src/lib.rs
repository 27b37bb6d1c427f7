pub mod error;
#[cfg(any(test, feature = "memory"))]
pub mod memory;
pub mod queries;
pub mod rest;
pub mod table;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

pub use error::{Result, StoreError};
pub use table::{Order, Select, TableBackend};

/// Typed handle to the remote table store.
///
/// Cloning is cheap; all clones share the same backend.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn TableBackend>,
}

impl Store {
    pub fn new(backend: impl TableBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Run a select and decode every returned row as `T`.
    pub async fn fetch<T: DeserializeOwned>(&self, query: &Select) -> Result<Vec<T>> {
        let rows = self.backend.select(query).await?;
        decode_rows(query.table(), rows)
    }

    /// Insert one row built from `row`'s serialized fields.
    pub async fn insert<T: serde::Serialize>(&self, table: &str, row: &T) -> Result<Vec<Value>> {
        let row = serde_json::to_value(row).map_err(|source| StoreError::Encode {
            table: table.to_string(),
            source,
        })?;
        self.backend.insert(table, row).await
    }
}

fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|source| StoreError::Decode {
                table: table.to_string(),
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::memory::MemoryBackend;

    #[tokio::test]
    async fn unserializable_row_is_an_encode_error() {
        let store = Store::new(MemoryBackend::new());
        let row: HashMap<(i32, i32), i32> = HashMap::from([((1, 2), 3)]);

        let err = store.insert("users", &row).await.unwrap_err();
        assert!(matches!(err, StoreError::Encode { ref table, .. } if table == "users"), "{err}");
    }

    #[tokio::test]
    async fn wrong_row_shape_is_a_decode_error() {
        let backend = MemoryBackend::new();
        backend
            .insert("chats", serde_json::json!({ "chat_id": "zero", "name": "General chat" }))
            .await
            .unwrap();
        let store = Store::new(backend);

        let err = store
            .fetch::<parlor_types::models::Chat>(&Select::from("chats"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Decode { ref table, .. } if table == "chats"), "{err}");
    }
}
