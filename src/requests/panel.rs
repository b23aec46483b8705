use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::model::{PrtRequest, RequestDraft, RequestStatus};
use super::queue::RequestQueue;
use super::QueueError;
use crate::auth::{consts, StaffUser};
use crate::storage::{
    local_id, JsonList, SessionEvents, SharedStorage, StorageError, StorageEvent,
    PRT_REQUESTS_KEY,
};

/// One open view of the PRT request queue.
///
/// Holds its own copy of the list, loaded when opened and reloaded when
/// another session writes the queue key. Every mutation persists the whole
/// list from this copy, so a stale panel overwrites newer entries. A failed
/// write is logged and the panel keeps its in-memory change, reporting
/// itself as diverged until the next successful write or reload.
pub struct RequestPanel {
    list: JsonList<PrtRequest>,
    events: SessionEvents,
    queue: RequestQueue,
    form: RequestDraft,
    feedback_for: Duration,
    feedback_until: Option<Instant>,
    diverged: bool,
}

impl RequestPanel {
    pub async fn open(storage: &SharedStorage, feedback_for: Duration) -> Result<Self, StorageError> {
        let session = storage.session();
        // Subscribe before reading so no write slips between the two.
        let events = session.events();
        let list = JsonList::new(Arc::new(session.clone()), PRT_REQUESTS_KEY);
        let queue = RequestQueue::from_entries(list.load().await?);
        debug!(session = %session.id(), entries = queue.len(), "request panel opened");
        Ok(Self {
            list,
            events,
            queue,
            form: RequestDraft::default(),
            feedback_for,
            feedback_until: None,
            diverged: false,
        })
    }

    pub fn entries(&self) -> &[PrtRequest] {
        self.queue.entries()
    }

    pub fn form(&self) -> &RequestDraft {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut RequestDraft {
        &mut self.form
    }

    /// True while the "request sent" indicator should be visible.
    pub fn show_feedback(&self) -> bool {
        self.feedback_until
            .map_or(false, |until| Instant::now() < until)
    }

    /// True when the last write failed and storage lags behind this panel.
    pub fn is_diverged(&self) -> bool {
        self.diverged
    }

    /// Submits the current form. On success the form is reset and the
    /// feedback indicator raised; an invalid form is left as typed.
    pub async fn submit(&mut self, actor: &StaffUser) -> Result<PrtRequest, QueueError> {
        if !actor.has_permission(consts::REQUESTS_SUBMIT) {
            return Err(QueueError::Forbidden(format!(
                "{} cannot submit PRT requests",
                actor.name
            )));
        }
        let entry = self
            .queue
            .submit(&self.form, local_id(), &actor.name, Utc::now())?
            .clone();
        self.persist().await;
        self.form = RequestDraft::default();
        self.feedback_until = Some(Instant::now() + self.feedback_for);
        info!(request_id = %entry.id, submitter = %entry.submitter, "PRT request submitted");
        Ok(entry)
    }

    /// Replaces the form with `draft` and submits it.
    pub async fn submit_draft(
        &mut self,
        draft: RequestDraft,
        actor: &StaffUser,
    ) -> Result<PrtRequest, QueueError> {
        self.form = draft;
        self.submit(actor).await
    }

    pub async fn advance(&mut self, id: &str, actor: &StaffUser) -> Result<RequestStatus, QueueError> {
        let (previous, current) = self.queue.advance(id, actor)?;
        if previous != current {
            self.persist().await;
            info!(request_id = %id, from = ?previous, to = ?current, "PRT request advanced");
        }
        Ok(current)
    }

    pub async fn remove(&mut self, id: &str, actor: &StaffUser) -> Result<PrtRequest, QueueError> {
        let removed = self.queue.remove(id, actor)?;
        self.persist().await;
        info!(request_id = %id, by = %actor.name, "PRT request removed");
        Ok(removed)
    }

    pub async fn clear_done(&mut self, actor: &StaffUser) -> Result<usize, QueueError> {
        let removed = self.queue.clear_done(actor)?;
        if removed > 0 {
            self.persist().await;
        }
        info!(removed, "done PRT requests cleared");
        Ok(removed)
    }

    /// Replaces the in-memory list with what storage holds now.
    pub async fn reload(&mut self) -> Result<(), StorageError> {
        self.queue = RequestQueue::from_entries(self.list.load().await?);
        self.diverged = false;
        Ok(())
    }

    /// Reloads when `event` concerns the queue key. Returns whether it did.
    pub async fn handle_event(&mut self, event: &StorageEvent) -> Result<bool, StorageError> {
        if event.key != PRT_REQUESTS_KEY {
            return Ok(false);
        }
        debug!(source = %event.source, "queue changed in another session, reloading");
        self.reload().await?;
        Ok(true)
    }

    /// Applies every change notification received so far. Returns whether the
    /// list was reloaded.
    pub async fn sync(&mut self) -> Result<bool, StorageError> {
        let mut reloaded = false;
        while let Some(event) = self.events.try_recv() {
            if event.key == PRT_REQUESTS_KEY && !reloaded {
                reloaded = self.handle_event(&event).await?;
            }
        }
        Ok(reloaded)
    }

    /// Waits for another session to write the queue, then reloads. Returns
    /// `false` if the storage area went away.
    pub async fn wait_for_change(&mut self) -> Result<bool, StorageError> {
        while let Some(event) = self.events.recv().await {
            if self.handle_event(&event).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn persist(&mut self) {
        match self.list.save(self.queue.entries()).await {
            Ok(()) => self.diverged = false,
            Err(e) => {
                warn!(key = PRT_REQUESTS_KEY, error = %e, "failed to persist PRT requests");
                self.diverged = true;
            }
        }
    }
}
