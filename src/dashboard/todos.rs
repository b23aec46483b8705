use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use utoipa::ToSchema;

use super::Snapshot;
use crate::storage::{local_id, todos_key, JsonList, KeyValueStore, StorageError};

/// One line of an order card's todo list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Todo {
    pub id: String,
    pub text: String,
    pub done: bool,
}

/// The todo list of one order. Each operation reads the list fresh from
/// storage, changes it and writes it back whole.
pub struct TodoList {
    list: JsonList<Todo>,
}

impl TodoList {
    pub fn new(store: Arc<dyn KeyValueStore>, order_id: &str) -> Self {
        Self {
            list: JsonList::new(store, todos_key(order_id)),
        }
    }

    pub async fn items(&self) -> Result<Vec<Todo>, StorageError> {
        self.list.load().await
    }

    /// Appends a todo. Blank text changes nothing.
    pub async fn add(&self, text: &str) -> Result<Snapshot<Todo>, StorageError> {
        let mut items = self.list.load().await?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(Snapshot::stored(items));
        }
        items.push(Todo {
            id: local_id(),
            text: text.to_string(),
            done: false,
        });
        Ok(self.write(items).await)
    }

    /// Flips the done flag. Unknown ids change nothing.
    pub async fn toggle(&self, id: &str) -> Result<Snapshot<Todo>, StorageError> {
        let mut items = self.list.load().await?;
        let Some(index) = items.iter().position(|todo| todo.id == id) else {
            return Ok(Snapshot::stored(items));
        };
        items[index].done = !items[index].done;
        Ok(self.write(items).await)
    }

    pub async fn delete(&self, id: &str) -> Result<Snapshot<Todo>, StorageError> {
        let mut items = self.list.load().await?;
        let before = items.len();
        items.retain(|todo| todo.id != id);
        if items.len() == before {
            return Ok(Snapshot::stored(items));
        }
        Ok(self.write(items).await)
    }

    async fn write(&self, items: Vec<Todo>) -> Snapshot<Todo> {
        let persisted = match self.list.save(&items).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %self.list.key(), error = %e, "failed to persist todos");
                false
            }
        };
        Snapshot { items, persisted }
    }
}
