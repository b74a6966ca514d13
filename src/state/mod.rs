pub mod leaderboard;
pub mod machine;
pub mod metrics;
pub mod quiz;
pub mod score;
pub mod session;
mod sse;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{config::AppConfig, error::ServiceError, state::session::LiveSession};

pub use self::sse::SseHub;

/// Shared handle to the application state, cloned cheaply across tasks.
pub type SharedState = Arc<AppState>;

/// One registered session together with its event fan-out hub.
///
/// The mutex is the session's single serialized owner: every inbound event
/// (join, start, end, answer, tick) locks it, which is what guarantees the
/// replay-determinism invariant. Concurrent sessions are independent and
/// proceed in parallel.
pub struct SessionHandle {
    session: Mutex<LiveSession>,
    hub: SseHub,
}

impl SessionHandle {
    fn new(session: LiveSession, sse_capacity: usize) -> Self {
        Self {
            session: Mutex::new(session),
            hub: SseHub::new(sse_capacity),
        }
    }

    /// Serialized access to the session state.
    pub fn session(&self) -> &Mutex<LiveSession> {
        &self.session
    }

    /// Broadcast hub for this session's SSE stream.
    pub fn hub(&self) -> &SseHub {
        &self.hub
    }
}

/// Central application state: configuration plus the registry of live
/// sessions keyed by their identifier.
pub struct AppState {
    config: AppConfig,
    sessions: DashMap<Uuid, Arc<SessionHandle>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig) -> SharedState {
        Arc::new(Self {
            config,
            sessions: DashMap::new(),
        })
    }

    /// Runtime configuration loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Register a freshly created session and return its handle.
    pub fn insert_session(&self, session: LiveSession) -> Arc<SessionHandle> {
        let id = session.id();
        let handle = Arc::new(SessionHandle::new(session, self.config.sse_capacity));
        self.sessions.insert(id, handle.clone());
        handle
    }

    /// Look up a session handle by identifier.
    pub fn session(&self, id: Uuid) -> Result<Arc<SessionHandle>, ServiceError> {
        self.sessions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(ServiceError::SessionNotFound(id))
    }

    /// Registry of live sessions, iterated by the background ticker.
    pub fn sessions(&self) -> &DashMap<Uuid, Arc<SessionHandle>> {
        &self.sessions
    }

    /// Number of registered sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
