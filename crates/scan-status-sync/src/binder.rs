/*
[INPUT]:  Credential changes from the owner, configured SyncMode
[OUTPUT]: At most one active update session and its SessionEvents
[POS]:    Session layer - credential to session binding (close-before-open)
[UPDATE]: When changing rebind rules or adding update modes
*/

use std::future;
use std::sync::Arc;
use std::time::Duration;

use scan_status_adapter::Credential;
use tracing::{debug, info};

use crate::config::{SyncConfig, SyncMode};
use crate::polling::{DEFAULT_POLL_INTERVAL, PollingFallback, TaskLister};
use crate::reconnect::DEFAULT_RECONNECT_DELAY;
use crate::session::{SessionEvent, SessionPhase};
use crate::stream::{StreamConnector, StreamSession};

const DEFAULT_TASK_LIMIT: u32 = 50;

/// Timing applied to every session the binder opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    pub reconnect_delay: Duration,
    pub poll_interval: Duration,
    pub task_limit: u32,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            task_limit: DEFAULT_TASK_LIMIT,
        }
    }
}

impl From<&SyncConfig> for SessionTiming {
    fn from(config: &SyncConfig) -> Self {
        Self {
            reconnect_delay: config.reconnect_delay(),
            poll_interval: config.poll_interval(),
            task_limit: config.task_limit,
        }
    }
}

/// What a call to [`SessionBinder::bind`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// Same credential (or still none); nothing touched.
    Unchanged,
    /// Credential gone; the previous session was closed.
    Cleared,
    /// A session for a new credential was opened.
    Opened,
}

#[derive(Debug)]
enum ActiveSession {
    Stream(StreamSession),
    Poll(PollingFallback),
}

impl ActiveSession {
    fn credential(&self) -> &Credential {
        match self {
            ActiveSession::Stream(session) => session.credential(),
            ActiveSession::Poll(session) => session.credential(),
        }
    }

    fn phase(&self) -> SessionPhase {
        match self {
            ActiveSession::Stream(session) => session.phase(),
            ActiveSession::Poll(session) => session.phase(),
        }
    }

    async fn next_event(&mut self) -> SessionEvent {
        match self {
            ActiveSession::Stream(session) => session.next_event().await,
            ActiveSession::Poll(session) => session.next_event().await,
        }
    }

    fn close(&mut self) {
        match self {
            ActiveSession::Stream(session) => session.close(),
            ActiveSession::Poll(session) => session.stop(),
        }
    }
}

/// Keeps exactly one session bound to the current credential.
pub struct SessionBinder {
    mode: SyncMode,
    connector: Arc<dyn StreamConnector>,
    lister: Arc<dyn TaskLister>,
    timing: SessionTiming,
    active: Option<ActiveSession>,
}

impl std::fmt::Debug for SessionBinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBinder")
            .field("mode", &self.mode)
            .field("timing", &self.timing)
            .field("active", &self.active)
            .finish()
    }
}

impl SessionBinder {
    pub fn new(
        mode: SyncMode,
        connector: Arc<dyn StreamConnector>,
        lister: Arc<dyn TaskLister>,
        timing: SessionTiming,
    ) -> Self {
        Self {
            mode,
            connector,
            lister,
            timing,
            active: None,
        }
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    /// Point the binder at `credential`.
    ///
    /// The previous session is fully closed, timers included, before a new one
    /// is opened. Must be called from within a Tokio runtime.
    pub fn bind(&mut self, credential: Option<Credential>) -> BindOutcome {
        let Some(credential) = credential else {
            if self.active.is_none() {
                return BindOutcome::Unchanged;
            }
            info!("credential cleared; closing task status session");
            self.close();
            return BindOutcome::Cleared;
        };

        if self.bound_credential() == Some(&credential) {
            debug!("credential unchanged; keeping task status session");
            return BindOutcome::Unchanged;
        }

        self.close();
        info!(mode = %self.mode, "binding task status session to new credential");
        let session = match self.mode {
            SyncMode::Stream => ActiveSession::Stream(StreamSession::open(
                Arc::clone(&self.connector),
                credential,
                self.timing.reconnect_delay,
            )),
            SyncMode::Poll => ActiveSession::Poll(PollingFallback::start(
                Arc::clone(&self.lister),
                credential,
                self.timing.poll_interval,
                self.timing.task_limit,
            )),
        };
        self.active = Some(session);
        BindOutcome::Opened
    }

    /// Close the active session, if any. Idempotent.
    pub fn close(&mut self) {
        if let Some(mut session) = self.active.take() {
            session.close();
        }
    }

    pub fn bound_credential(&self) -> Option<&Credential> {
        self.active.as_ref().map(ActiveSession::credential)
    }

    /// Phase of the active session; `Idle` when nothing is bound.
    pub fn phase(&self) -> SessionPhase {
        self.active
            .as_ref()
            .map(ActiveSession::phase)
            .unwrap_or(SessionPhase::Idle)
    }

    /// Next event from the active session. Never resolves while unbound.
    pub async fn next_event(&mut self) -> SessionEvent {
        match self.active.as_mut() {
            Some(session) => session.next_event().await,
            None => future::pending().await,
        }
    }
}

impl Drop for SessionBinder {
    fn drop(&mut self) {
        self.close();
    }
}
