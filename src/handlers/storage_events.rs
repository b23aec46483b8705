use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use std::convert::Infallible;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::warn;

use crate::auth::StaffUser;
use crate::AppState;

/// Stream storage writes
///
/// Each event is named `storage` and carries `{"key": ..., "source": ...}`.
/// Dashboards reload the key unless `source` is their own session.
#[utoipa::path(
    get,
    path = "/api/v1/storage/events",
    summary = "Storage change stream",
    description = "Server-sent events, one per write to the shared storage area.",
    params(("x-staff-name" = String, Header, description = "Display name of the acting staff member")),
    responses(
        (status = 200, description = "Event stream", body = String, content_type = "text/event-stream"),
        (status = 401, description = "Missing staff identity", body = crate::errors::ErrorResponse),
    ),
    tag = "PRT Requests"
)]
pub async fn storage_events(
    State(state): State<AppState>,
    _user: StaffUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.storage.subscribe()).filter_map(|received| async move {
        match received {
            Ok(change) => {
                let payload = serde_json::json!({
                    "key": change.key,
                    "source": change.source,
                });
                Some(Ok(Event::default().event("storage").data(payload.to_string())))
            }
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(skipped, "storage event stream lagged");
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
