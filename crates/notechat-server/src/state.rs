//! Shared application state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use notechat_core::NoteChatConfig;
use notechat_runtime::{Orchestrator, Session};

pub type SessionHandle = Arc<Mutex<Session>>;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: NoteChatConfig,
    pub orchestrator: Orchestrator,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl AppState {
    pub fn new(config: NoteChatConfig, orchestrator: Orchestrator) -> Self {
        Self {
            config,
            orchestrator,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a session for `user` and return its id.
    ///
    /// Idle sessions are swept first so abandoned logins do not pile up.
    pub fn open_session(&self, user: String) -> String {
        self.evict_idle();
        let id = uuid::Uuid::new_v4().to_string();
        info!("Session opened for {}", user);
        self.sessions
            .write()
            .insert(id.clone(), Arc::new(Mutex::new(Session::new(user))));
        id
    }

    /// Look up a live session and mark it used. An idle session past the
    /// TTL is dropped and reported as missing.
    pub fn session(&self, id: &str) -> Option<SessionHandle> {
        let handle = self.sessions.read().get(id).cloned()?;
        let expired = {
            let mut session = handle.lock();
            if self.is_idle(session.idle_for()) {
                true
            } else {
                session.touch();
                false
            }
        };
        if expired {
            self.sessions.write().remove(id);
            info!("Session expired for {}", handle.lock().user());
            return None;
        }
        Some(handle)
    }

    /// Remove every session idle longer than the TTL. Sessions locked by an
    /// in-flight request are in use and stay.
    pub fn evict_idle(&self) -> usize {
        if self.config.session_ttl.is_zero() {
            return 0;
        }
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, handle| {
            handle
                .try_lock()
                .map_or(true, |session| !self.is_idle(session.idle_for()))
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!("Evicted {} idle sessions", evicted);
        }
        evicted
    }

    fn is_idle(&self, idle: Duration) -> bool {
        let ttl = self.config.session_ttl;
        !ttl.is_zero() && idle >= ttl
    }

    /// Drop a session and everything it holds.
    pub fn close_session(&self, id: &str) -> bool {
        let removed = self.sessions.write().remove(id);
        if let Some(session) = &removed {
            info!("Session closed for {}", session.lock().user());
        }
        removed.is_some()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }
}
