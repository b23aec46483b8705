//! Shared key/value area for ephemeral dashboard data.
//!
//! Every open dashboard ("tab") talks to one [`SharedStorage`] through its own
//! [`StorageSession`]. Values are whole JSON documents: there is no partial
//! update, no locking and no versioning, so the last writer wins. Writes are
//! announced to every other session of the same area, mirroring how a browser
//! notifies other tabs of a local storage change.

use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

pub mod list;
pub mod memory;
pub mod sql;

pub use list::JsonList;
pub use memory::MemoryStore;
pub use sql::SqlStore;

/// Key of the PRT request queue.
pub const PRT_REQUESTS_KEY: &str = "printdesk:prt-requests";

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Key of one order's todo scratchpad.
pub fn todos_key(order_id: &str) -> String {
    format!("printdesk:todos:{}", order_id)
}

/// Key of one order's image slots.
pub fn images_key(order_id: &str) -> String {
    format!("printdesk:images:{}", order_id)
}

/// Locally unique id: `<unix-millis>-<6 base36 chars>`.
pub fn local_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{}-{}", chrono::Utc::now().timestamp_millis(), suffix)
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The write would push the area past its byte quota.
    #[error("Quota exceeded writing '{key}': {needed} bytes needed, quota is {quota}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },
    /// A value could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error that occurs in the storage backend.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<sea_orm::DbErr> for StorageError {
    fn from(err: sea_orm::DbErr) -> Self {
        StorageError::Backend(err.to_string())
    }
}

/// Low-level interface of a key/value backend. Keys and values are strings.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored at `key`, `None` when absent.
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replaces the value stored at `key`.
    async fn set_item(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// A write announced to the sessions of a storage area.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    /// Session that performed the write
    pub source: Uuid,
}

/// One storage area: a backend plus the change notifications of its sessions.
#[derive(Clone)]
pub struct SharedStorage {
    backend: Arc<dyn KeyValueStore>,
    events: broadcast::Sender<StorageEvent>,
}

impl SharedStorage {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { backend, events }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Opens a new session, the equivalent of one open tab.
    pub fn session(&self) -> StorageSession {
        StorageSession {
            id: Uuid::new_v4(),
            storage: self.clone(),
        }
    }

    /// Every write of every session, including ones made by the observer.
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }

    fn announce(&self, key: &str, source: Uuid) {
        // No receivers is fine: nobody is listening yet.
        let _ = self.events.send(StorageEvent {
            key: key.to_string(),
            source,
        });
    }
}

/// A handle on a [`SharedStorage`] whose writes are announced to the other
/// sessions, and whose event stream skips its own writes.
#[derive(Clone)]
pub struct StorageSession {
    id: Uuid,
    storage: SharedStorage,
}

impl StorageSession {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Changes made by other sessions, from now on.
    pub fn events(&self) -> SessionEvents {
        SessionEvents {
            own: self.id,
            rx: self.storage.subscribe(),
        }
    }
}

#[async_trait]
impl KeyValueStore for StorageSession {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage.backend.get_item(key).await
    }

    async fn set_item(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.storage.backend.set_item(key, value).await?;
        self.storage.announce(key, self.id);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.storage.backend.remove_item(key).await?;
        self.storage.announce(key, self.id);
        Ok(())
    }
}

/// Receiver of foreign writes for one session.
pub struct SessionEvents {
    own: Uuid,
    rx: broadcast::Receiver<StorageEvent>,
}

impl SessionEvents {
    /// Waits for the next write made by another session. `None` once the
    /// storage area is gone.
    pub async fn recv(&mut self) -> Option<StorageEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.source == self.own => continue,
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "storage event receiver lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next pending foreign write, without waiting.
    pub fn try_recv(&mut self) -> Option<StorageEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if event.source == self.own => continue,
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "storage event receiver lagged");
                    continue;
                }
                Err(_) => return None,
            }
        }
    }
}
