//! Session registries for the two HTTP transport families.
//!
//! SSE sessions exist from the moment the client opens `GET /sse`; the
//! streamable family only registers a session once its `initialize`
//! handshake has produced a result, so a failed handshake never reserves an
//! id. Both registries drop their entry when the transport reports closure,
//! and closing twice is a no-op.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::response::sse::Event;
use tokio::sync::mpsc;
use uuid::Uuid;

pub type SseEvent = Result<Event, Infallible>;

// Bounded so a stalled client exerts backpressure on `/message` instead of
// queueing without limit.
const STREAM_BUFFER: usize = 32;

/// A freshly opened SSE session. `guard` is a sender clone whose `closed()`
/// future resolves when the client drops the stream.
pub struct SseHandle {
    pub session_id: String,
    pub events: mpsc::Receiver<SseEvent>,
    pub guard: mpsc::Sender<SseEvent>,
}

#[derive(Clone, Default)]
pub struct SseSessions {
    inner: Arc<Mutex<HashMap<String, mpsc::Sender<SseEvent>>>>,
}

impl SseSessions {
    pub fn register(&self) -> SseHandle {
        let session_id = Uuid::now_v7().to_string();
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        self.lock().insert(session_id.clone(), tx.clone());
        SseHandle {
            session_id,
            events: rx,
            guard: tx,
        }
    }

    pub fn remove(&self, session_id: &str) -> bool {
        self.lock().remove(session_id).is_some()
    }

    pub fn sender(&self, session_id: &str) -> Option<mpsc::Sender<SseEvent>> {
        self.lock().get(session_id).cloned()
    }

    /// The lone active session, if exactly one exists.
    pub fn single(&self) -> Option<(String, mpsc::Sender<SseEvent>)> {
        let sessions = self.lock();
        if sessions.len() != 1 {
            return None;
        }
        sessions
            .iter()
            .next()
            .map(|(id, tx)| (id.clone(), tx.clone()))
    }

    pub fn active_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, mpsc::Sender<SseEvent>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub enum StreamAttach {
    NotFound,
    AlreadyStreaming,
    Attached {
        events: mpsc::Receiver<SseEvent>,
        guard: mpsc::Sender<SseEvent>,
    },
}

#[derive(Default)]
struct StreamableSession {
    stream: Option<mpsc::Sender<SseEvent>>,
}

#[derive(Clone, Default)]
pub struct StreamableSessions {
    inner: Arc<Mutex<HashMap<String, StreamableSession>>>,
}

impl StreamableSessions {
    /// Mints an id and registers the session. Only called once an
    /// `initialize` handshake has completed.
    pub fn activate(&self) -> String {
        let session_id = Uuid::now_v7().to_string();
        self.lock()
            .insert(session_id.clone(), StreamableSession::default());
        session_id
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.lock().contains_key(session_id)
    }

    /// Claims the session's single server-to-client stream. A second claim
    /// reports `AlreadyStreaming` while the first is still open.
    pub fn attach_stream(&self, session_id: &str) -> StreamAttach {
        let mut sessions = self.lock();
        match sessions.get_mut(session_id) {
            None => StreamAttach::NotFound,
            Some(session) if session.stream.is_some() => StreamAttach::AlreadyStreaming,
            Some(session) => {
                let (tx, rx) = mpsc::channel(STREAM_BUFFER);
                session.stream = Some(tx.clone());
                StreamAttach::Attached {
                    events: rx,
                    guard: tx,
                }
            }
        }
    }

    /// Terminal and idempotent: closing an unknown or already-closed
    /// session does nothing.
    pub fn close(&self, session_id: &str) -> bool {
        self.lock().remove(session_id).is_some()
    }

    pub fn active_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, StreamableSession>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sse_register_issues_unique_ids() {
        let sessions = SseSessions::default();
        let first = sessions.register();
        let second = sessions.register();
        assert_ne!(first.session_id, second.session_id);
        assert_eq!(sessions.active_count(), 2);
        assert!(sessions.sender(&first.session_id).is_some());
    }

    #[test]
    fn sse_remove_is_idempotent() {
        let sessions = SseSessions::default();
        let handle = sessions.register();
        assert!(sessions.remove(&handle.session_id));
        assert!(!sessions.remove(&handle.session_id));
        assert_eq!(sessions.active_count(), 0);
    }

    #[test]
    fn single_requires_exactly_one_session() {
        let sessions = SseSessions::default();
        assert!(sessions.single().is_none());

        let only = sessions.register();
        assert_eq!(
            sessions.single().map(|(id, _)| id),
            Some(only.session_id.clone()),
        );

        let _second = sessions.register();
        assert!(sessions.single().is_none());
    }

    #[tokio::test]
    async fn dropping_the_receiver_resolves_the_guard() {
        let sessions = SseSessions::default();
        let handle = sessions.register();
        drop(handle.events);
        // Resolves only because the receiver is gone; registry clones of the
        // sender do not keep it pending.
        handle.guard.closed().await;
    }

    #[test]
    fn streamable_activation_mints_fresh_ids() {
        let sessions = StreamableSessions::default();
        let first = sessions.activate();
        let second = sessions.activate();
        assert_ne!(first, second);
        assert!(sessions.contains(&first));
        assert_eq!(sessions.active_count(), 2);
    }

    #[test]
    fn attach_stream_is_exclusive_per_session() {
        let sessions = StreamableSessions::default();
        let id = sessions.activate();

        let first = sessions.attach_stream(&id);
        assert!(matches!(first, StreamAttach::Attached { .. }));
        assert!(matches!(
            sessions.attach_stream(&id),
            StreamAttach::AlreadyStreaming,
        ));
        assert!(matches!(
            sessions.attach_stream("missing"),
            StreamAttach::NotFound,
        ));
    }

    #[test]
    fn close_is_terminal_and_idempotent() {
        let sessions = StreamableSessions::default();
        let id = sessions.activate();
        assert!(sessions.close(&id));
        assert!(!sessions.close(&id));
        assert!(!sessions.contains(&id));
        assert!(matches!(sessions.attach_stream(&id), StreamAttach::NotFound));
    }
}
