/*
[INPUT]:  Credential, stream connector and reconnect delay
[OUTPUT]: SessionEvents (snapshots, failures, reconnects) from one live-update channel
[POS]:    Session layer - push-based update source with explicit state machine
[UPDATE]: When changing message handling, phase transitions or reconnection
*/

use std::future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use scan_status_adapter::{
    Credential, StatusFrame, StatusWebSocket, StreamChannel, StreamEvent, parse_status_frame,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::SyncError;
use crate::reconnect::ReconnectScheduler;
use crate::session::{SessionEvent, SessionPhase};

const IGNORED_LOG_LIMIT: usize = 3;
const PARSE_FAIL_LOG_LIMIT: usize = 3;
const RAW_LOG_MAX_BYTES: usize = 1024;

static IGNORED_LOG_COUNT: AtomicUsize = AtomicUsize::new(0);
static PARSE_FAIL_LOG_COUNT: AtomicUsize = AtomicUsize::new(0);

/// Opens live-update channels.
pub trait StreamConnector: Send + Sync {
    /// Start connecting; failures are reported through the returned channel.
    fn connect(&self, credential: &Credential) -> StreamChannel;
}

impl StreamConnector for StatusWebSocket {
    fn connect(&self, credential: &Credential) -> StreamChannel {
        self.open(Some(credential))
    }
}

/// One push-based update source bound to a single credential.
///
/// Phases: `Connecting -> Live` on handshake or first frame, `-> Backoff` on
/// transport failure, `Backoff -> Connecting` when the reconnect timer fires,
/// and any phase `-> Closed` on [`StreamSession::close`]. A closed session
/// never yields another event.
pub struct StreamSession {
    id: Uuid,
    credential: Credential,
    connector: Arc<dyn StreamConnector>,
    channel: Option<StreamChannel>,
    reconnect: ReconnectScheduler,
    phase: SessionPhase,
    attempts: u32,
}

impl std::fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSession")
            .field("id", &self.id)
            .field("credential", &self.credential)
            .field("phase", &self.phase)
            .field("attempts", &self.attempts)
            .field("reconnect", &self.reconnect)
            .finish()
    }
}

impl StreamSession {
    /// Open a channel for `credential`. Never fails synchronously.
    pub fn open(
        connector: Arc<dyn StreamConnector>,
        credential: Credential,
        reconnect_delay: Duration,
    ) -> Self {
        let id = Uuid::new_v4();
        info!(session_id = %id, "opening task status stream session");
        let channel = connector.connect(&credential);
        Self {
            id,
            credential,
            connector,
            channel: Some(channel),
            reconnect: ReconnectScheduler::new(reconnect_delay),
            phase: SessionPhase::Connecting,
            attempts: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Consecutive failures since the last accepted update.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn reconnect_armed(&self) -> bool {
        self.reconnect.is_armed()
    }

    /// Next event worth reporting to the owner.
    ///
    /// Ignored and malformed frames are consumed internally. Cancel-safe.
    pub async fn next_event(&mut self) -> SessionEvent {
        loop {
            match self.phase {
                SessionPhase::Idle | SessionPhase::Closed => future::pending::<()>().await,
                SessionPhase::Backoff => {
                    self.reconnect.expired().await;
                    return self.reconnect_now();
                }
                SessionPhase::Connecting | SessionPhase::Live => {
                    let event = match self.channel.as_mut() {
                        Some(channel) => channel.recv().await,
                        None => None,
                    };
                    let outcome = match event {
                        Some(event) => self.on_stream_event(event),
                        None => Some(self.on_transport_failure(SyncError::Transport {
                            reason: "stream ended unexpectedly".to_string(),
                        })),
                    };
                    if let Some(outcome) = outcome {
                        return outcome;
                    }
                }
            }
        }
    }

    /// Release the channel and disarm the reconnect timer. Idempotent.
    pub fn close(&mut self) {
        if self.phase == SessionPhase::Closed {
            return;
        }
        self.reconnect.cancel();
        self.close_channel();
        self.phase = SessionPhase::Closed;
        info!(session_id = %self.id, "task status stream session closed");
    }

    fn on_stream_event(&mut self, event: StreamEvent) -> Option<SessionEvent> {
        match event {
            StreamEvent::Connected => {
                self.phase = SessionPhase::Live;
                Some(SessionEvent::Connected)
            }
            StreamEvent::Frame(raw) => self.on_frame(&raw),
            StreamEvent::Failed(reason) => {
                Some(self.on_transport_failure(SyncError::Transport { reason }))
            }
            StreamEvent::Closed(reason) => {
                Some(self.on_transport_failure(SyncError::StreamClosed { reason }))
            }
        }
    }

    fn on_frame(&mut self, raw: &str) -> Option<SessionEvent> {
        if !self.phase.is_open() || self.phase == SessionPhase::Backoff {
            return None;
        }
        match parse_status_frame(raw) {
            Ok(StatusFrame::TaskStatus(tasks)) => {
                self.phase = SessionPhase::Live;
                self.attempts = 0;
                debug!(session_id = %self.id, task_count = tasks.len(), "task status update");
                Some(SessionEvent::Snapshot(tasks))
            }
            Ok(StatusFrame::Other(kind)) => {
                log_ignored_once(&kind, raw);
                None
            }
            Err(err) => {
                log_parse_fail_once(&err, raw);
                None
            }
        }
    }

    fn on_transport_failure(&mut self, error: SyncError) -> SessionEvent {
        self.close_channel();
        if self.phase != SessionPhase::Closed {
            self.phase = SessionPhase::Backoff;
        }
        self.attempts = self.attempts.saturating_add(1);
        let armed = self.reconnect.schedule();
        warn!(
            session_id = %self.id,
            attempts = self.attempts,
            retry_in = ?self.reconnect.delay(),
            newly_armed = armed,
            error = %error,
            "task status stream failed; reconnect scheduled"
        );
        SessionEvent::Failed(error)
    }

    fn reconnect_now(&mut self) -> SessionEvent {
        self.close_channel();
        self.channel = Some(self.connector.connect(&self.credential));
        self.phase = SessionPhase::Connecting;
        info!(session_id = %self.id, attempt = self.attempts, "reconnecting task status stream");
        SessionEvent::Reconnecting {
            attempt: self.attempts,
        }
    }

    fn close_channel(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            channel.close();
        }
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.close();
    }
}

fn log_ignored_once(kind: &str, raw: &str) {
    let count = IGNORED_LOG_COUNT.fetch_add(1, Ordering::Relaxed);
    if count < IGNORED_LOG_LIMIT {
        debug!(
            sample_index = count + 1,
            sample_limit = IGNORED_LOG_LIMIT,
            kind,
            bytes = raw.len(),
            "ws message kind ignored"
        );
    }
}

fn log_parse_fail_once(err: &serde_json::Error, raw: &str) {
    let count = PARSE_FAIL_LOG_COUNT.fetch_add(1, Ordering::Relaxed);
    if count < PARSE_FAIL_LOG_LIMIT {
        info!(
            sample_index = count + 1,
            sample_limit = PARSE_FAIL_LOG_LIMIT,
            error = %err,
            bytes = raw.len(),
            "ws message parse failed"
        );
        let preview = truncate_for_log(raw, RAW_LOG_MAX_BYTES);
        debug!(
            sample_index = count + 1,
            sample_limit = PARSE_FAIL_LOG_LIMIT,
            message = %preview,
            "ws message parse failed"
        );
    }
}

fn truncate_for_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::with_capacity(end + 3);
    out.push_str(&value[..end]);
    out.push_str("...");
    out
}
