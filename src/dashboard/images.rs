use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use super::Snapshot;
use crate::storage::{images_key, JsonList, KeyValueStore, StorageError};

const ALLOWED_MEDIA_TYPES: &[&str] = &["image/png", "image/jpeg", "image/gif", "image/webp"];

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("an order card holds at most {0} images")]
    LimitReached(usize),
    #[error("not a base64 data URL: {0}")]
    InvalidDataUrl(String),
    #[error("unsupported image type {0}")]
    UnsupportedType(String),
    #[error("image payload is not valid base64: {0}")]
    InvalidPayload(String),
    #[error("no image at position {0}")]
    NotFound(usize),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Checks `data:image/<type>;base64,<payload>` and that the payload decodes.
pub fn validate_data_url(data_url: &str) -> Result<(), ImageError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| ImageError::InvalidDataUrl("missing data: scheme".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ImageError::InvalidDataUrl("missing payload".into()))?;
    let media_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| ImageError::InvalidDataUrl("payload must be base64 encoded".into()))?;
    if !ALLOWED_MEDIA_TYPES.contains(&media_type.to_ascii_lowercase().as_str()) {
        return Err(ImageError::UnsupportedType(media_type.to_string()));
    }
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| ImageError::InvalidPayload(e.to_string()))?;
    if bytes.is_empty() {
        return Err(ImageError::InvalidPayload("empty image".into()));
    }
    Ok(())
}

/// The image slots of one order card, stored as a JSON array of data URLs.
pub struct ImageSlots {
    list: JsonList<String>,
    max_images: usize,
}

impl ImageSlots {
    pub fn new(store: Arc<dyn KeyValueStore>, order_id: &str, max_images: usize) -> Self {
        Self {
            list: JsonList::new(store, images_key(order_id)),
            max_images,
        }
    }

    pub async fn items(&self) -> Result<Vec<String>, ImageError> {
        Ok(self.list.load().await?)
    }

    pub async fn add(&self, data_url: &str) -> Result<Snapshot<String>, ImageError> {
        validate_data_url(data_url)?;
        let mut images = self.list.load().await?;
        if images.len() >= self.max_images {
            return Err(ImageError::LimitReached(self.max_images));
        }
        images.push(data_url.to_string());
        Ok(self.write(images).await)
    }

    pub async fn remove(&self, index: usize) -> Result<Snapshot<String>, ImageError> {
        let mut images = self.list.load().await?;
        if index >= images.len() {
            return Err(ImageError::NotFound(index));
        }
        images.remove(index);
        Ok(self.write(images).await)
    }

    async fn write(&self, images: Vec<String>) -> Snapshot<String> {
        let persisted = match self.list.save(&images).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %self.list.key(), error = %e, "failed to persist order images");
                false
            }
        };
        Snapshot {
            items: images,
            persisted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use assert_matches::assert_matches;

    const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

    fn slots(max: usize) -> ImageSlots {
        ImageSlots::new(Arc::new(MemoryStore::new()), "order-1", max)
    }

    #[test]
    fn data_url_validation() {
        assert!(validate_data_url(PNG).is_ok());
        assert!(validate_data_url("data:image/JPEG;base64,/9j/4AAQ").is_ok());
        assert_matches!(
            validate_data_url("https://example.com/a.png"),
            Err(ImageError::InvalidDataUrl(_))
        );
        assert_matches!(
            validate_data_url("data:image/png,raw"),
            Err(ImageError::InvalidDataUrl(_))
        );
        assert_matches!(
            validate_data_url("data:image/svg+xml;base64,PHN2Zz4="),
            Err(ImageError::UnsupportedType(_))
        );
        assert_matches!(
            validate_data_url("data:image/png;base64,@@@"),
            Err(ImageError::InvalidPayload(_))
        );
        assert_matches!(
            validate_data_url("data:image/png;base64,"),
            Err(ImageError::InvalidPayload(_))
        );
    }

    #[tokio::test]
    async fn at_most_max_images() {
        let slots = slots(2);
        slots.add(PNG).await.unwrap();
        let snap = slots.add(PNG).await.unwrap();
        assert_eq!(snap.items.len(), 2);
        assert_matches!(slots.add(PNG).await, Err(ImageError::LimitReached(2)));
        assert_eq!(slots.items().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn remove_by_position() {
        let slots = slots(2);
        slots.add(PNG).await.unwrap();
        slots.add("data:image/gif;base64,R0lGODlh").await.unwrap();

        let snap = slots.remove(0).await.unwrap();
        assert_eq!(snap.items, vec!["data:image/gif;base64,R0lGODlh".to_string()]);
        assert_matches!(slots.remove(1).await, Err(ImageError::NotFound(1)));
    }
}
