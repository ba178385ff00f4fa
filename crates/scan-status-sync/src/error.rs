/*
[INPUT]:  Transport failures and fetch errors from the adapter
[OUTPUT]: Publishable SyncError values for the "last error" projection
[POS]:    Error handling layer - failures observed by the sync subsystem
[UPDATE]: When adding failure sources
*/

use scan_status_adapter::ScanApiError;
use thiserror::Error;

/// A failure observed while keeping the task snapshot in sync.
///
/// These never abort the monitoring loop; they are published as the service's
/// last error and the loop keeps retrying.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Live-update channel failed to connect or broke mid-stream
    #[error("stream transport failed: {reason}")]
    Transport { reason: String },

    /// Server closed the live-update channel
    #[error("stream closed by server{}", .reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    StreamClosed { reason: Option<String> },

    /// Periodic task-list fetch failed
    #[error("task list fetch failed{}: {message}", .status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    Fetch { status: Option<u16>, message: String },
}

impl SyncError {
    /// The server rejected the credential.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            SyncError::Fetch {
                status: Some(401) | Some(403),
                ..
            }
        )
    }

    /// HTTP status attached to the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Fetch { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<ScanApiError> for SyncError {
    fn from(err: ScanApiError) -> Self {
        SyncError::Fetch {
            status: err.status(),
            message: err.to_string(),
        }
    }
}
