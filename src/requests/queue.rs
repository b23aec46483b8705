use chrono::{DateTime, Utc};

use super::model::{PrtRequest, RequestDraft, RequestStatus};
use super::QueueError;
use crate::auth::StaffUser;

/// The PRT request list, newest first, with the rules for who may change it.
///
/// Pure in-memory state; persisting it is the caller's business.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestQueue {
    entries: Vec<PrtRequest>,
}

impl RequestQueue {
    pub fn from_entries(entries: Vec<PrtRequest>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[PrtRequest] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&PrtRequest> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Prepends a `new` entry. An invalid draft leaves the queue untouched.
    pub fn submit(
        &mut self,
        draft: &RequestDraft,
        id: String,
        submitter: &str,
        now: DateTime<Utc>,
    ) -> Result<&PrtRequest, QueueError> {
        let entry = draft.to_request(id, submitter, now)?;
        self.entries.insert(0, entry);
        Ok(&self.entries[0])
    }

    /// Moves an entry one stage forward. Returns the previous and new status;
    /// they are equal when the entry was already done.
    pub fn advance(
        &mut self,
        id: &str,
        actor: &StaffUser,
    ) -> Result<(RequestStatus, RequestStatus), QueueError> {
        if !actor.can_manage_requests() {
            return Err(QueueError::Forbidden(format!(
                "{} cannot advance PRT requests",
                actor.name
            )));
        }
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
        let previous = entry.status;
        entry.status = previous.advanced();
        Ok((previous, entry.status))
    }

    /// Removes one entry; allowed for recipients and for whoever submitted it.
    pub fn remove(&mut self, id: &str, actor: &StaffUser) -> Result<PrtRequest, QueueError> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
        if !actor.can_manage_requests() && self.entries[index].submitter != actor.name {
            return Err(QueueError::Forbidden(format!(
                "{} cannot remove a request submitted by {}",
                actor.name, self.entries[index].submitter
            )));
        }
        Ok(self.entries.remove(index))
    }

    /// Drops every `done` entry, keeping the others in order. Returns how many
    /// were removed.
    pub fn clear_done(&mut self, actor: &StaffUser) -> Result<usize, QueueError> {
        if !actor.can_manage_requests() {
            return Err(QueueError::Forbidden(format!(
                "{} cannot clear PRT requests",
                actor.name
            )));
        }
        let before = self.entries.len();
        self.entries
            .retain(|entry| entry.status != RequestStatus::Done);
        Ok(before - self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::RoleResolver;
    use crate::requests::model::RequestCategory;
    use proptest::prelude::*;

    fn staff(name: &str) -> StaffUser {
        RoleResolver::new(["Céline", "Celine"]).resolve(name)
    }

    fn draft(size: &str, color: &str) -> RequestDraft {
        RequestDraft::new(RequestCategory::TShirt, size, 3, color)
    }

    fn queue_with(statuses: &[RequestStatus]) -> RequestQueue {
        let now = Utc::now();
        let entries = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| PrtRequest {
                id: format!("id-{}", i),
                category: RequestCategory::Polo,
                size: "M".into(),
                quantity: 1,
                color: "Blue".into(),
                submitter: "Alex".into(),
                created_at: now,
                status: *status,
            })
            .collect();
        RequestQueue::from_entries(entries)
    }

    #[test]
    fn valid_submission_lands_at_the_head() {
        let mut queue = queue_with(&[RequestStatus::Seen]);
        let head = queue
            .submit(&draft("L", "Noir"), "new-id".into(), "Alex", Utc::now())
            .unwrap()
            .clone();
        assert_eq!(head.status, RequestStatus::New);
        assert_eq!(head.quantity, 3);
        assert_eq!(head.category.label(), "T-shirt");
        assert_eq!(queue.entries()[0], head);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn advance_requires_recipient_and_stops_at_done() {
        let mut queue = queue_with(&[RequestStatus::New]);
        assert!(matches!(
            queue.advance("id-0", &staff("Alex")),
            Err(QueueError::Forbidden(_))
        ));
        assert_eq!(queue.entries()[0].status, RequestStatus::New);

        let celine = staff("céline");
        assert_eq!(
            queue.advance("id-0", &celine).unwrap(),
            (RequestStatus::New, RequestStatus::Seen)
        );
        assert_eq!(
            queue.advance("id-0", &celine).unwrap(),
            (RequestStatus::Seen, RequestStatus::Done)
        );
        assert_eq!(
            queue.advance("id-0", &celine).unwrap(),
            (RequestStatus::Done, RequestStatus::Done)
        );
        assert!(matches!(
            queue.advance("missing", &celine),
            Err(QueueError::NotFound(_))
        ));
    }

    #[test]
    fn remove_is_limited_to_owner_and_recipient() {
        let mut queue = queue_with(&[RequestStatus::New, RequestStatus::New]);
        let before = queue.clone();

        assert!(matches!(
            queue.remove("id-0", &staff("Sam")),
            Err(QueueError::Forbidden(_))
        ));
        // Owner match is exact.
        assert!(matches!(
            queue.remove("id-0", &staff("alex")),
            Err(QueueError::Forbidden(_))
        ));
        assert_eq!(queue, before);

        assert_eq!(queue.remove("id-0", &staff("Alex")).unwrap().id, "id-0");
        assert_eq!(queue.remove("id-1", &staff("Celine")).unwrap().id, "id-1");
        assert!(queue.is_empty());
    }

    #[test]
    fn clear_done_is_recipient_only() {
        let mut queue = queue_with(&[RequestStatus::Done, RequestStatus::New]);
        assert!(queue.clear_done(&staff("Alex")).is_err());
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.clear_done(&staff("Celine")).unwrap(), 1);
        assert_eq!(queue.entries()[0].id, "id-1");
    }

    fn status_strategy() -> impl Strategy<Value = RequestStatus> {
        prop_oneof![
            Just(RequestStatus::New),
            Just(RequestStatus::Seen),
            Just(RequestStatus::Done),
        ]
    }

    proptest! {
        #[test]
        fn blank_size_or_color_never_mutates(
            statuses in prop::collection::vec(status_strategy(), 0..8),
            size in "[ \t]{0,3}|[A-Z]{1,3}",
            color in "[ \t]{0,3}",
            quantity in 0u32..5,
        ) {
            let mut queue = queue_with(&statuses);
            let before = queue.clone();
            let draft = RequestDraft::new(RequestCategory::Cap, size, quantity, color);
            prop_assert!(queue.submit(&draft, "x".into(), "Alex", Utc::now()).is_err());
            prop_assert_eq!(queue, before);
        }

        #[test]
        fn valid_submissions_are_prepended_as_new(
            statuses in prop::collection::vec(status_strategy(), 0..8),
            size in "[A-Z]{1,3}",
            color in "[a-z]{1,8}",
            quantity in 1u32..500,
        ) {
            let mut queue = queue_with(&statuses);
            let before = queue.entries().to_vec();
            let draft = RequestDraft::new(RequestCategory::Hoodie, size, quantity, color);
            queue.submit(&draft, "fresh".into(), "Alex", Utc::now()).unwrap();
            prop_assert_eq!(&queue.entries()[0].id, "fresh");
            prop_assert_eq!(queue.entries()[0].status, RequestStatus::New);
            prop_assert_eq!(&queue.entries()[1..], &before[..]);
        }

        #[test]
        fn clear_done_removes_exactly_done_in_order(
            statuses in prop::collection::vec(status_strategy(), 0..16),
        ) {
            let mut queue = queue_with(&statuses);
            let expected: Vec<String> = queue
                .entries()
                .iter()
                .filter(|e| e.status != RequestStatus::Done)
                .map(|e| e.id.clone())
                .collect();
            let done = statuses.iter().filter(|s| **s == RequestStatus::Done).count();
            prop_assert_eq!(queue.clear_done(&staff("Celine")).unwrap(), done);
            let kept: Vec<String> = queue.entries().iter().map(|e| e.id.clone()).collect();
            prop_assert_eq!(kept, expected);
        }

        #[test]
        fn advancing_is_monotonic(steps in 0usize..6) {
            let mut queue = queue_with(&[RequestStatus::New]);
            let celine = staff("Celine");
            let rank = |s: RequestStatus| -> usize {
                match s {
                    RequestStatus::New => 0,
                    RequestStatus::Seen => 1,
                    RequestStatus::Done => 2,
                }
            };
            for _ in 0..steps {
                let (before, after) = queue.advance("id-0", &celine).unwrap();
                prop_assert!(rank(after) >= rank(before));
                prop_assert!(rank(after) - rank(before) <= 1);
            }
            prop_assert_eq!(rank(queue.entries()[0].status), steps.min(2));
        }
    }
}
