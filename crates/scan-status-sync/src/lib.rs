/*
[INPUT]:  Public API exports for scan-status-sync crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod binder;
pub mod config;
pub mod error;
pub mod indicator;
pub mod polling;
pub mod reconnect;
pub mod service;
pub mod session;
pub mod snapshot;
pub mod stream;

// Re-export main types for convenience
pub use binder::{BindOutcome, SessionBinder, SessionTiming};
pub use self::config::{SyncConfig, SyncMode};
pub use error::SyncError;
pub use indicator::{IndicatorState, derive};
pub use polling::{DEFAULT_POLL_INTERVAL, PollingFallback, TaskLister};
pub use reconnect::{DEFAULT_RECONNECT_DELAY, ReconnectScheduler};
pub use service::TaskStatusService;
pub use session::{SessionEvent, SessionPhase};
pub use snapshot::{Snapshot, StatusStore};
pub use stream::{StreamConnector, StreamSession};
