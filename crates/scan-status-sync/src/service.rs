/*
[INPUT]:  SyncConfig, StreamConnector + TaskLister seams, credential watch::Receiver
[OUTPUT]: Snapshot / IndicatorState / last error / phase projections
[POS]:    Service layer - owner-driven lifecycle around one worker task
[UPDATE]: When changing activation, teardown or event handling
*/

use std::sync::Arc;

use anyhow::Context;
use scan_status_adapter::Credential;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::binder::{BindOutcome, SessionBinder, SessionTiming};
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::indicator::IndicatorState;
use crate::polling::TaskLister;
use crate::session::{SessionEvent, SessionPhase};
use crate::snapshot::{Snapshot, StatusStore};
use crate::stream::StreamConnector;

/// Keeps a task snapshot in sync with the scan server for whichever credential
/// is currently set.
///
/// Nothing runs until [`TaskStatusService::activate`]. All mutation happens on
/// one worker task; consumers only read projections.
pub struct TaskStatusService {
    config: SyncConfig,
    connector: Arc<dyn StreamConnector>,
    lister: Arc<dyn TaskLister>,
    credentials: watch::Receiver<Option<Credential>>,
    store: StatusStore,
    shutdown: CancellationToken,
    worker_handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for TaskStatusService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskStatusService")
            .field("config", &self.config)
            .field("active", &self.is_active())
            .field("phase", &self.phase())
            .finish()
    }
}

impl TaskStatusService {
    /// Build an inactive service. Fails if `config` does not validate.
    pub fn new(
        config: SyncConfig,
        connector: Arc<dyn StreamConnector>,
        lister: Arc<dyn TaskLister>,
        credentials: watch::Receiver<Option<Credential>>,
    ) -> anyhow::Result<Self> {
        config
            .validate()
            .context("task status service config rejected")?;

        Ok(Self {
            config,
            connector,
            lister,
            credentials,
            store: StatusStore::new(),
            shutdown: CancellationToken::new(),
            worker_handle: None,
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Start the worker. Returns `false` if it was already running or no Tokio
    /// runtime is available.
    pub fn activate(&mut self) -> bool {
        if self.is_active() {
            debug!("task status service already active");
            return false;
        }

        if tokio::runtime::Handle::try_current().is_err() {
            warn!("TaskStatusService activated without Tokio runtime; worker not started");
            return false;
        }

        self.shutdown = CancellationToken::new();
        let binder = SessionBinder::new(
            self.config.mode,
            Arc::clone(&self.connector),
            Arc::clone(&self.lister),
            SessionTiming::from(&self.config),
        );
        let worker = StatusWorker {
            binder,
            credentials: self.credentials.clone(),
            store: self.store.clone(),
            shutdown: self.shutdown.clone(),
        };

        info!(mode = %self.config.mode, "activating task status service");
        self.worker_handle = Some(tokio::spawn(worker.run()));
        true
    }

    /// Stop the worker, close any session and reset every projection.
    ///
    /// Once this returns nothing can mutate the snapshot until the next
    /// [`TaskStatusService::activate`].
    pub async fn deactivate(&mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.worker_handle.take() {
            if let Err(err) = handle.await {
                warn!(error = %err, "task status worker ended abnormally");
            }
        }
        self.store.reset();
        info!("task status service deactivated");
    }

    pub fn is_active(&self) -> bool {
        self.worker_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.store.current_snapshot()
    }

    pub fn indicator(&self) -> IndicatorState {
        self.store.current_indicator()
    }

    pub fn last_error(&self) -> Option<SyncError> {
        self.store.current_error()
    }

    pub fn phase(&self) -> SessionPhase {
        self.store.current_phase()
    }

    pub fn subscribe_snapshot(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.store.subscribe_snapshot()
    }

    pub fn subscribe_indicator(&self) -> watch::Receiver<IndicatorState> {
        self.store.subscribe_indicator()
    }

    pub fn subscribe_last_error(&self) -> watch::Receiver<Option<SyncError>> {
        self.store.subscribe_last_error()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<SessionPhase> {
        self.store.subscribe_phase()
    }
}

impl Drop for TaskStatusService {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[derive(Debug)]
struct StatusWorker {
    binder: SessionBinder,
    credentials: watch::Receiver<Option<Credential>>,
    store: StatusStore,
    shutdown: CancellationToken,
}

impl StatusWorker {
    async fn run(mut self) {
        let initial = self.credentials.borrow_and_update().clone();
        self.apply_credential(initial);
        let mut credentials_open = true;

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    debug!("task status worker shutdown requested");
                    break;
                }
                changed = self.credentials.changed(), if credentials_open => {
                    let credential = match changed {
                        Ok(()) => self.credentials.borrow_and_update().clone(),
                        Err(_) => {
                            info!("credential source dropped; treating as signed out");
                            credentials_open = false;
                            None
                        }
                    };
                    self.apply_credential(credential);
                }
                event = self.binder.next_event() => {
                    self.handle_event(event);
                }
            }
            self.store.set_phase(self.binder.phase());
        }

        self.binder.close();
        self.store.set_phase(self.binder.phase());
    }

    fn apply_credential(&mut self, credential: Option<Credential>) {
        match self.binder.bind(credential) {
            BindOutcome::Unchanged => {}
            BindOutcome::Cleared | BindOutcome::Opened => {
                self.store.clear();
                self.store.clear_error();
            }
        }
        self.store.set_phase(self.binder.phase());
    }

    fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Snapshot(tasks) => {
                self.store.replace(tasks);
                self.store.clear_error();
            }
            SessionEvent::Failed(error) => {
                self.store.record_error(error);
            }
            SessionEvent::Connected => {
                debug!("task status stream connected");
            }
            SessionEvent::Reconnecting { attempt } => {
                debug!(attempt, "task status stream reconnecting");
            }
        }
    }
}
