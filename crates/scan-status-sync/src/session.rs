/*
[INPUT]:  Transitions reported by stream and polling sessions
[OUTPUT]: SessionPhase and SessionEvent shared by every update source
[POS]:    Domain model - session state vocabulary
[UPDATE]: When adding session states or event kinds
*/

use scan_status_adapter::Task;
use serde::Serialize;

use crate::error::SyncError;

/// Where the active session is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// No session bound.
    #[default]
    Idle,
    /// Channel opening, or polling before its first successful fetch.
    Connecting,
    /// Receiving updates.
    Live,
    /// Channel failed; waiting for the reconnect timer.
    Backoff,
    /// Torn down; will never deliver again.
    Closed,
}

impl SessionPhase {
    /// Whether a session in this phase may still deliver events.
    pub fn is_open(self) -> bool {
        matches!(
            self,
            SessionPhase::Connecting | SessionPhase::Live | SessionPhase::Backoff
        )
    }
}

/// Something the active session wants its owner to act on.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Full replacement task list.
    Snapshot(Vec<Task>),
    /// Recoverable failure; already handled by the session's retry policy.
    Failed(SyncError),
    /// Channel handshake completed.
    Connected,
    /// Reconnect timer fired and a new channel was opened.
    Reconnecting { attempt: u32 },
}
