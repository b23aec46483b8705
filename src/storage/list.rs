use super::{KeyValueStore, StorageError};
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

/// A JSON array stored whole at one key.
///
/// `load` and `save` are the only primitives: every mutation is a
/// read-modify-write of the entire list by the caller, and concurrent writers
/// overwrite each other.
pub struct JsonList<T> {
    store: Arc<dyn KeyValueStore>,
    key: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonList<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            key: self.key.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> JsonList<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Reads the list. A missing key or an undecodable value yields an empty list.
    pub async fn load(&self) -> Result<Vec<T>, StorageError> {
        let Some(raw) = self.store.get_item(&self.key).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(items) => Ok(items),
            Err(e) => {
                warn!(key = %self.key, error = %e, "discarding unreadable stored list");
                Ok(Vec::new())
            }
        }
    }

    /// Replaces the stored list.
    pub async fn save(&self, items: &[T]) -> Result<(), StorageError> {
        let raw =
            serde_json::to_string(items).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.store.set_item(&self.key, raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn missing_and_corrupt_values_load_empty() {
        let store = Arc::new(MemoryStore::new());
        let list: JsonList<u32> = JsonList::new(store.clone(), "numbers");
        assert!(list.load().await.unwrap().is_empty());

        store.set_item("numbers", "{not json".into()).await.unwrap();
        assert!(list.load().await.unwrap().is_empty());

        list.save(&[3, 1, 2]).await.unwrap();
        assert_eq!(list.load().await.unwrap(), vec![3, 1, 2]);
        assert_eq!(
            store.get_item("numbers").await.unwrap().as_deref(),
            Some("[3,1,2]")
        );
    }

    #[tokio::test]
    async fn concurrent_writers_overwrite_each_other() {
        let store = Arc::new(MemoryStore::new());
        let list: JsonList<String> = JsonList::new(store, "k");
        list.save(&["orig".to_string()]).await.unwrap();

        let mut a = list.load().await.unwrap();
        let mut b = list.load().await.unwrap();
        a.insert(0, "x".to_string());
        list.save(&a).await.unwrap();
        b.insert(0, "y".to_string());
        list.save(&b).await.unwrap();

        assert_eq!(list.load().await.unwrap(), vec!["y", "orig"]);
    }
}
