/*
[INPUT]:  Credential, task lister and poll interval
[OUTPUT]: SessionEvents from periodic full task-list fetches
[POS]:    Session layer - pull-based fallback update source
[UPDATE]: When changing poll cadence, overlap rules or fetch error handling
*/

use std::future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use scan_status_adapter::{Credential, ScanApiError, ScanClient, Task, TaskQuery};
use tokio::time::{Interval, MissedTickBehavior, interval};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::SyncError;
use crate::session::{SessionEvent, SessionPhase};

/// Period between polling fetches.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(6);

/// Source of full task lists.
#[async_trait]
pub trait TaskLister: Send + Sync {
    async fn list_tasks(&self, credential: &Credential, limit: u32)
    -> Result<Vec<Task>, ScanApiError>;
}

#[async_trait]
impl TaskLister for ScanClient {
    async fn list_tasks(
        &self,
        credential: &Credential,
        limit: u32,
    ) -> Result<Vec<Task>, ScanApiError> {
        ScanClient::list_tasks(self, Some(credential), TaskQuery::with_limit(limit)).await
    }
}

type FetchFuture = BoxFuture<'static, Result<Vec<Task>, ScanApiError>>;

/// Periodic fetcher bound to a single credential.
///
/// The first fetch starts immediately. A tick that lands while a fetch is
/// still outstanding is skipped, so at most one fetch is ever in flight.
pub struct PollingFallback {
    id: Uuid,
    lister: Arc<dyn TaskLister>,
    credential: Credential,
    limit: u32,
    ticker: Interval,
    in_flight: Option<FetchFuture>,
    phase: SessionPhase,
    attempts: u32,
    skipped_ticks: u64,
}

impl std::fmt::Debug for PollingFallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingFallback")
            .field("id", &self.id)
            .field("credential", &self.credential)
            .field("limit", &self.limit)
            .field("phase", &self.phase)
            .field("attempts", &self.attempts)
            .field("in_flight", &self.in_flight.is_some())
            .field("skipped_ticks", &self.skipped_ticks)
            .finish()
    }
}

enum PollStep {
    Tick,
    Fetched(Result<Vec<Task>, ScanApiError>),
}

impl PollingFallback {
    /// Start polling. Must be called from within a Tokio runtime.
    pub fn start(
        lister: Arc<dyn TaskLister>,
        credential: Credential,
        period: Duration,
        limit: u32,
    ) -> Self {
        let id = Uuid::new_v4();
        info!(session_id = %id, ?period, limit, "starting task status polling");
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            id,
            lister,
            credential,
            limit,
            ticker,
            in_flight: None,
            phase: SessionPhase::Connecting,
            attempts: 0,
            skipped_ticks: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// `Connecting` until the first fetch succeeds, then `Live`.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn period(&self) -> Duration {
        self.ticker.period()
    }

    /// Consecutive failed fetches since the last success.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn fetch_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Ticks dropped because the previous fetch had not finished.
    pub fn skipped_ticks(&self) -> u64 {
        self.skipped_ticks
    }

    /// Next fetch outcome. Cancel-safe: an in-flight fetch survives a dropped call.
    pub async fn next_event(&mut self) -> SessionEvent {
        loop {
            if !self.phase.is_open() {
                future::pending::<()>().await;
            }

            let step = match self.in_flight.as_mut() {
                Some(fetch) => tokio::select! {
                    biased;
                    result = fetch => PollStep::Fetched(result),
                    _ = self.ticker.tick() => PollStep::Tick,
                },
                None => {
                    self.ticker.tick().await;
                    PollStep::Tick
                }
            };

            match step {
                PollStep::Tick => self.on_tick(),
                PollStep::Fetched(result) => {
                    self.in_flight = None;
                    return self.on_fetched(result);
                }
            }
        }
    }

    /// Stop the timer and abandon any in-flight fetch. Idempotent.
    pub fn stop(&mut self) {
        if self.phase == SessionPhase::Closed {
            return;
        }
        self.in_flight = None;
        self.phase = SessionPhase::Closed;
        info!(session_id = %self.id, "task status polling stopped");
    }

    fn on_tick(&mut self) {
        if self.in_flight.is_some() {
            self.skipped_ticks += 1;
            debug!(
                session_id = %self.id,
                skipped_ticks = self.skipped_ticks,
                "previous task list fetch still in flight; tick skipped"
            );
            return;
        }
        let lister = Arc::clone(&self.lister);
        let credential = self.credential.clone();
        let limit = self.limit;
        self.in_flight = Some(Box::pin(async move {
            lister.list_tasks(&credential, limit).await
        }));
    }

    fn on_fetched(&mut self, result: Result<Vec<Task>, ScanApiError>) -> SessionEvent {
        match result {
            Ok(tasks) => {
                self.phase = SessionPhase::Live;
                self.attempts = 0;
                debug!(session_id = %self.id, task_count = tasks.len(), "task list fetched");
                SessionEvent::Snapshot(tasks)
            }
            Err(err) => {
                let error = SyncError::from(err);
                self.attempts = self.attempts.saturating_add(1);
                warn!(
                    session_id = %self.id,
                    attempts = self.attempts,
                    error = %error,
                    auth_error = error.is_auth_error(),
                    "task list fetch failed; keeping previous snapshot"
                );
                SessionEvent::Failed(error)
            }
        }
    }
}

impl Drop for PollingFallback {
    fn drop(&mut self) {
        self.stop();
    }
}
