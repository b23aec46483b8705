//! Key/value backend on the `kv_entries` table.

use super::{KeyValueStore, StorageError};
use crate::entities::kv_entry::{self, Entity as KvEntry};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use std::sync::Arc;

/// Durable storage area shared by every instance pointing at the same database.
#[derive(Clone)]
pub struct SqlStore {
    db: Arc<DatabaseConnection>,
}

impl SqlStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl KeyValueStore for SqlStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entry = KvEntry::find_by_id(key.to_string())
            .one(self.db.as_ref())
            .await?;
        Ok(entry.map(|e| e.value))
    }

    async fn set_item(&self, key: &str, value: String) -> Result<(), StorageError> {
        let entry = kv_entry::ActiveModel {
            storage_key: Set(key.to_string()),
            value: Set(value),
            updated_at: Set(Utc::now()),
        };
        KvEntry::insert(entry)
            .on_conflict(
                OnConflict::column(kv_entry::Column::StorageKey)
                    .update_columns([kv_entry::Column::Value, kv_entry::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        KvEntry::delete_by_id(key.to_string())
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }
}
