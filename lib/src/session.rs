//! Signed-in session and change notification.
//!
//! The identity provider handshake happens elsewhere; this module only keeps the
//! resulting session and tells listeners when it changes.

use crate::error::Result;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    /// Bearer token for the hosted backend; empty for local use
    #[serde(default)]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: String::new(),
            email: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = token.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Called with the new session (or `None` on sign-out) on every transition
pub type SessionHandler = Arc<dyn Fn(Option<&Session>) + Send + Sync>;

pub trait SessionProvider {
    fn current_session(&self) -> Option<Session>;

    /// Register `handler`; it stays registered until the returned guard is dropped
    fn on_session_change(&self, handler: SessionHandler) -> ListenerGuard;

    fn sign_out(&self) -> Result<()>;
}

#[derive(Default)]
struct HubState {
    current: Option<Session>,
    listeners: Vec<(u64, SessionHandler)>,
    next_id: u64,
    path: Option<PathBuf>,
}

/// In-process session provider, optionally persisted to a YAML file
#[derive(Clone, Default)]
pub struct SessionHub {
    state: Arc<Mutex<HubState>>,
}

fn lock(state: &Mutex<HubState>) -> MutexGuard<'_, HubState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

impl SessionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hub backed by `path`; picks up a session saved there earlier
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let current = if path.exists() {
            let contents = fs::read_to_string(path)?;
            let session: Session = serde_yaml::from_str(&contents)?;
            debug!("Loaded session for {} from {:?}", session.user_id, path);
            Some(session)
        } else {
            None
        };

        Ok(Self::with_path(path, current))
    }

    /// Like [`load_from_path`](Self::load_from_path), but an unreadable file leaves the
    /// hub signed out; the next `sign_in` overwrites it
    pub fn load(path: &Path) -> Self {
        match Self::load_from_path(path) {
            Ok(hub) => hub,
            Err(e) => {
                warn!("Ignoring unreadable session file {:?}: {}", path, e);
                Self::with_path(path, None)
            }
        }
    }

    fn with_path(path: &Path, current: Option<Session>) -> Self {
        let hub = Self::new();
        {
            let mut state = lock(&hub.state);
            state.current = current;
            state.path = Some(path.to_path_buf());
        }
        hub
    }

    pub fn sign_in(&self, session: Session) -> Result<()> {
        let path = lock(&self.state).path.clone();
        if let Some(path) = path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, serde_yaml::to_string(&session)?)?;
        }
        info!("Signed in as {}", session.user_id);
        self.set(Some(session));
        Ok(())
    }

    fn set(&self, session: Option<Session>) {
        // Handlers run without the lock held so they may call back into the hub
        let handlers: Vec<SessionHandler> = {
            let mut state = lock(&self.state);
            state.current = session.clone();
            state.listeners.iter().map(|(_, h)| h.clone()).collect()
        };
        for handler in handlers {
            handler(session.as_ref());
        }
    }
}

impl SessionProvider for SessionHub {
    fn current_session(&self) -> Option<Session> {
        lock(&self.state).current.clone()
    }

    fn on_session_change(&self, handler: SessionHandler) -> ListenerGuard {
        let mut state = lock(&self.state);
        let id = state.next_id;
        state.next_id += 1;
        state.listeners.push((id, handler));
        ListenerGuard {
            id,
            state: Arc::downgrade(&self.state),
        }
    }

    fn sign_out(&self) -> Result<()> {
        let path = lock(&self.state).path.clone();
        if let Some(path) = path {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        info!("Signed out");
        self.set(None);
        Ok(())
    }
}

/// Unregisters a session handler when dropped
pub struct ListenerGuard {
    id: u64,
    state: Weak<Mutex<HubState>>,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            lock(&state).listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Funnels session changes into a channel drained by the thread owning the sync module.
pub struct SessionBinding {
    rx: Receiver<Option<Session>>,
    _guard: ListenerGuard,
}

impl SessionBinding {
    /// Listen to `provider`; the current session is queued first
    pub fn attach<P: SessionProvider + ?Sized>(provider: &P) -> Self {
        let (tx, rx) = mpsc::channel();
        let seed = tx.clone();
        let guard = provider.on_session_change(Arc::new(move |session: Option<&Session>| {
            let _ = tx.send(session.cloned());
        }));

        // Seeding after registration cannot lose a transition; at worst it repeats one
        let _ = seed.send(provider.current_session());
        Self { rx, _guard: guard }
    }

    /// The most recent pending transition, if any arrived since the last call.
    /// Intermediate sessions are skipped.
    pub fn latest(&self) -> Option<Option<Session>> {
        self.rx.try_iter().last()
    }
}
