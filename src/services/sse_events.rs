use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        snapshot::SessionSnapshotDto,
        sse::{Handshake, ServerEvent},
    },
    state::SessionHandle,
};

const EVENT_SNAPSHOT: &str = "session.snapshot";
const EVENT_HANDSHAKE: &str = "session.handshake";

/// Broadcast a fresh session snapshot to the session's subscribers.
pub fn broadcast_snapshot(handle: &SessionHandle, snapshot: &SessionSnapshotDto) {
    send_event(handle, EVENT_SNAPSHOT, snapshot);
}

/// Broadcast the connection handshake so a new subscriber sees an immediate event.
pub fn broadcast_handshake(handle: &SessionHandle, handshake: &Handshake) {
    send_event(handle, EVENT_HANDSHAKE, handshake);
}

fn send_event(handle: &SessionHandle, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => handle.hub().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize SSE payload"),
    }
}
