//! PRT requests: short production/supply requests staff send to the
//! designated recipients, kept in the shared storage area.

pub mod model;
pub mod panel;
pub mod queue;

use thiserror::Error;

pub use model::{PrtRequest, RequestCategory, RequestDraft, RequestStatus};
pub use panel::RequestPanel;
pub use queue::RequestQueue;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("invalid request: {0}")]
    InvalidDraft(String),
    #[error("PRT request {0} not found")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
}
