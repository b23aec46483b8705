use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{FulfillmentStatus, PaymentStatus};
use crate::services::orders::{append_note, OrderDetail, OrderPatch, OrderService};

/// Where the status editor sends its patches.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn update_order(&self, order_id: Uuid, patch: OrderPatch) -> Result<OrderDetail, ServiceError>;
}

#[async_trait]
impl OrderGateway for OrderService {
    async fn update_order(&self, order_id: Uuid, patch: OrderPatch) -> Result<OrderDetail, ServiceError> {
        self.apply_patch(order_id, patch).await
    }
}

/// Audit line appended to the notes when the fulfillment status changes.
pub fn status_change_line(actor: &str, at: DateTime<Utc>) -> String {
    format!(
        "status changed by {} on {} at {}",
        actor,
        at.format("%d/%m/%Y"),
        at.format("%H:%M")
    )
}

/// Edits the two status axes of one displayed order.
///
/// The committed order only ever changes to what the server echoes back. The
/// drafts are tracked independently; a save always sends both.
pub struct StatusEditor {
    gateway: Arc<dyn OrderGateway>,
    committed: OrderDetail,
    fulfillment_draft: FulfillmentStatus,
    payment_draft: PaymentStatus,
    editing_fulfillment: bool,
    editing_payment: bool,
    notices: Vec<String>,
}

impl StatusEditor {
    pub fn new(gateway: Arc<dyn OrderGateway>, committed: OrderDetail) -> Self {
        Self {
            gateway,
            fulfillment_draft: committed.fulfillment_status,
            payment_draft: committed.payment_status,
            committed,
            editing_fulfillment: false,
            editing_payment: false,
            notices: Vec::new(),
        }
    }

    pub fn committed(&self) -> &OrderDetail {
        &self.committed
    }

    pub fn fulfillment_draft(&self) -> FulfillmentStatus {
        self.fulfillment_draft
    }

    pub fn payment_draft(&self) -> PaymentStatus {
        self.payment_draft
    }

    pub fn is_editing_fulfillment(&self) -> bool {
        self.editing_fulfillment
    }

    pub fn is_editing_payment(&self) -> bool {
        self.editing_payment
    }

    pub fn select_fulfillment(&mut self, status: FulfillmentStatus) {
        self.fulfillment_draft = status;
        self.editing_fulfillment = true;
    }

    pub fn select_payment(&mut self, status: PaymentStatus) {
        self.payment_draft = status;
        self.editing_payment = true;
    }

    /// Error notices raised by failed saves, oldest first.
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    /// The patch a save at `now` by `actor` would send.
    pub fn build_patch(&self, actor: &str, now: DateTime<Utc>) -> OrderPatch {
        let notes = (self.fulfillment_draft != self.committed.fulfillment_status).then(|| {
            append_note(
                self.committed.notes.as_deref(),
                &status_change_line(actor, now),
            )
        });
        OrderPatch {
            status: Some(self.fulfillment_draft),
            payment_status: Some(self.payment_draft),
            notes,
        }
    }

    /// Sends both drafts. On success the committed order becomes the server's
    /// echo and editing ends; on failure a notice is queued and the drafts stay.
    pub async fn save(&mut self, actor: &str, now: DateTime<Utc>) -> Result<&OrderDetail, ServiceError> {
        let patch = self.build_patch(actor, now);
        match self.gateway.update_order(self.committed.id, patch).await {
            Ok(echo) => {
                info!(order_id = %echo.id, status = %echo.fulfillment_status, payment = %echo.payment_status, "order status saved");
                self.fulfillment_draft = echo.fulfillment_status;
                self.payment_draft = echo.payment_status;
                self.committed = echo;
                self.editing_fulfillment = false;
                self.editing_payment = false;
                Ok(&self.committed)
            }
            Err(e) => {
                warn!(order_id = %self.committed.id, error = %e, "order status save failed");
                self.notices
                    .push(format!("Could not update order {}", self.committed.order_number));
                Err(e)
            }
        }
    }
}
