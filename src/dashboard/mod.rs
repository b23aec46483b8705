//! Per-order helpers behind the order cards: the todo scratchpad, the image
//! slots and the status editor.

pub mod images;
pub mod status_editor;
pub mod todos;

use serde::Serialize;

/// State of a scratchpad after a mutation. `persisted` is false when the
/// write failed and storage no longer matches `items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot<T> {
    pub items: Vec<T>,
    pub persisted: bool,
}

impl<T> Snapshot<T> {
    pub fn stored(items: Vec<T>) -> Self {
        Self {
            items,
            persisted: true,
        }
    }
}
