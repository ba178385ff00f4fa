/*
[INPUT]:  Accepted task lists, session failures and phase changes
[OUTPUT]: Latest Snapshot / IndicatorState / last error / phase via `watch`
[POS]:    Data layer - single writer of the exposed projections
[UPDATE]: When adding projections or changing reset semantics
*/

use std::sync::Arc;

use chrono::{DateTime, Utc};
use scan_status_adapter::Task;
use tokio::sync::watch;

use crate::error::SyncError;
use crate::indicator::{IndicatorState, derive};
use crate::session::SessionPhase;

/// The task list as of the most recent accepted update.
///
/// The indicator is derived once at construction, so it can never drift from
/// the tasks it describes.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    tasks: Vec<Task>,
    indicator: IndicatorState,
    received_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Snapshot accepted now.
    pub fn new(tasks: Vec<Task>) -> Self {
        let indicator = derive(&tasks);
        Self {
            tasks,
            indicator,
            received_at: Some(Utc::now()),
        }
    }

    /// Nothing received yet (or the previous data was discarded).
    pub fn empty() -> Self {
        Self {
            tasks: Vec::new(),
            indicator: IndicatorState::Idle,
            received_at: None,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn indicator(&self) -> IndicatorState {
        self.indicator
    }

    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        self.received_at
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Owner of the published projections.
///
/// Cloned into the service worker, which is the only writer; readers use
/// `subscribe_*` or the `current_*` accessors and only ever see whole snapshots.
#[derive(Debug, Clone)]
pub struct StatusStore {
    snapshot: watch::Sender<Arc<Snapshot>>,
    indicator: watch::Sender<IndicatorState>,
    last_error: watch::Sender<Option<SyncError>>,
    phase: watch::Sender<SessionPhase>,
}

impl StatusStore {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Snapshot::empty()));
        let (indicator, _) = watch::channel(IndicatorState::Idle);
        let (last_error, _) = watch::channel(None);
        let (phase, _) = watch::channel(SessionPhase::Idle);
        Self {
            snapshot,
            indicator,
            last_error,
            phase,
        }
    }

    /// Replace the snapshot wholesale.
    pub fn replace(&self, tasks: Vec<Task>) {
        self.publish(Snapshot::new(tasks));
    }

    /// Drop the snapshot; the indicator falls back to `Idle`.
    pub fn clear(&self) {
        self.publish(Snapshot::empty());
    }

    pub fn record_error(&self, error: SyncError) {
        self.last_error.send_replace(Some(error));
    }

    pub fn clear_error(&self) {
        self.last_error.send_if_modified(|current| current.take().is_some());
    }

    pub fn set_phase(&self, phase: SessionPhase) {
        self.phase.send_if_modified(|current| {
            if *current == phase {
                return false;
            }
            *current = phase;
            true
        });
    }

    /// Back to the pre-activation state.
    pub fn reset(&self) {
        self.clear();
        self.clear_error();
        self.set_phase(SessionPhase::Idle);
    }

    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.borrow().clone()
    }

    pub fn current_indicator(&self) -> IndicatorState {
        self.snapshot.borrow().indicator()
    }

    pub fn current_error(&self) -> Option<SyncError> {
        self.last_error.borrow().clone()
    }

    pub fn current_phase(&self) -> SessionPhase {
        *self.phase.borrow()
    }

    pub fn subscribe_snapshot(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshot.subscribe()
    }

    /// Notified only when the indicator value actually changes.
    pub fn subscribe_indicator(&self) -> watch::Receiver<IndicatorState> {
        self.indicator.subscribe()
    }

    pub fn subscribe_last_error(&self) -> watch::Receiver<Option<SyncError>> {
        self.last_error.subscribe()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<SessionPhase> {
        self.phase.subscribe()
    }

    fn publish(&self, snapshot: Snapshot) {
        let indicator = snapshot.indicator();
        self.snapshot.send_replace(Arc::new(snapshot));
        self.indicator.send_if_modified(|current| {
            if *current == indicator {
                return false;
            }
            *current = indicator;
            true
        });
    }
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new()
    }
}
