//! HTTP handlers for the `/api/v1` surface.

pub mod images;
pub mod orders;
pub mod requests;
pub mod storage_events;
pub mod todos;
