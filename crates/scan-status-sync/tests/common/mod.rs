/*
[INPUT]:  Test scenarios needing a stream connector, task lister or service
[OUTPUT]: Fake seams, fixtures and wait helpers shared by integration tests
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use scan_status_adapter::{
    Credential, CredentialSource, ScanApiError, StreamChannel, StreamEvent, Task,
};
use scan_status_sync::{StreamConnector, SyncConfig, SyncMode, TaskLister, TaskStatusService};
use tokio::sync::{Notify, Semaphore, mpsc, watch};
use tokio_util::sync::CancellationToken;

pub const WAIT: Duration = Duration::from_secs(30);

/// One channel handed out by [`FakeConnector`].
#[derive(Clone)]
pub struct FakeStream {
    pub credential: Credential,
    pub events: mpsc::Sender<StreamEvent>,
    pub cancel: CancellationToken,
    /// Whether every earlier channel was already closed when this one opened.
    pub prior_closed: bool,
}

impl FakeStream {
    /// Push an event; returns `false` once the session has released the channel.
    pub async fn push(&self, event: StreamEvent) -> bool {
        self.events.send(event).await.is_ok()
    }

    pub async fn push_frame(&self, raw: impl Into<String>) -> bool {
        self.push(StreamEvent::Frame(raw.into())).await
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[derive(Default)]
pub struct FakeConnector {
    streams: Mutex<Vec<FakeStream>>,
    opened: Notify,
}

impl FakeConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn connections(&self) -> usize {
        self.streams.lock().unwrap().len()
    }

    pub fn stream(&self, index: usize) -> FakeStream {
        self.streams.lock().unwrap()[index].clone()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.streams
            .lock()
            .unwrap()
            .iter()
            .map(|stream| stream.credential.token().to_string())
            .collect()
    }

    /// Wait until at least `count` channels have been opened.
    pub async fn wait_for_connections(&self, count: usize) -> FakeStream {
        tokio::time::timeout(WAIT, async {
            loop {
                let notified = self.opened.notified();
                if self.connections() >= count {
                    return self.stream(count - 1);
                }
                notified.await;
            }
        })
        .await
        .expect("connection opened in time")
    }
}

impl StreamConnector for FakeConnector {
    fn connect(&self, credential: &Credential) -> StreamChannel {
        let (events, rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        {
            let mut streams = self.streams.lock().unwrap();
            let prior_closed = streams.iter().all(FakeStream::is_closed);
            streams.push(FakeStream {
                credential: credential.clone(),
                events,
                cancel: cancel.clone(),
                prior_closed,
            });
        }
        self.opened.notify_waiters();
        StreamChannel::new(rx, cancel)
    }
}

/// Scripted task lister. Responses are consumed in order; an empty script
/// answers with an empty list. Each call waits for a gate permit.
pub struct FakeLister {
    calls: AtomicUsize,
    responses: Mutex<VecDeque<Result<Vec<Task>, ScanApiError>>>,
    gate: Semaphore,
}

impl FakeLister {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            responses: Mutex::new(VecDeque::new()),
            gate: Semaphore::new(Semaphore::MAX_PERMITS),
        })
    }

    /// Every call blocks until [`FakeLister::release`].
    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            responses: Mutex::new(VecDeque::new()),
            gate: Semaphore::new(0),
        })
    }

    pub fn push_ok(&self, tasks: Vec<Task>) {
        self.responses.lock().unwrap().push_back(Ok(tasks));
    }

    pub fn push_err(&self, status: u16) {
        self.responses.lock().unwrap().push_back(Err(ScanApiError::Api {
            status,
            message: "scripted failure".to_string(),
        }));
    }

    pub fn release(&self, permits: usize) {
        self.gate.add_permits(permits);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskLister for FakeLister {
    async fn list_tasks(
        &self,
        _credential: &Credential,
        _limit: u32,
    ) -> Result<Vec<Task>, ScanApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let permit = self.gate.acquire().await.expect("gate open");
        permit.forget();
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

pub fn task(id: i64, status: &str) -> Task {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "status": status,
        "config_name": "nuclei",
        "asset_id": null,
        "created_at": "2026-01-05T10:00:00"
    }))
    .expect("valid task")
}

/// A `task_status` frame with one task per given status
pub fn task_status_frame(statuses: &[&str]) -> String {
    let tasks: Vec<Task> = statuses
        .iter()
        .enumerate()
        .map(|(index, status)| task(index as i64 + 1, status))
        .collect();
    serde_json::json!({"type": "task_status", "data": {"tasks": tasks}}).to_string()
}

pub fn config(mode: SyncMode) -> SyncConfig {
    SyncConfig {
        mode,
        ..SyncConfig::default()
    }
}

/// Service wired to fakes, not yet activated.
pub fn service_with(
    config: SyncConfig,
    connector: &Arc<FakeConnector>,
    lister: &Arc<FakeLister>,
    credentials: &CredentialSource,
) -> TaskStatusService {
    TaskStatusService::new(
        config,
        connector.clone(),
        lister.clone(),
        credentials.subscribe(),
    )
    .expect("valid config")
}

/// Let the worker drain everything already queued.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

/// Wait until `rx` holds a value matching `predicate`.
pub async fn wait_until<T, F>(rx: &mut watch::Receiver<T>, mut predicate: F) -> T
where
    T: Clone,
    F: FnMut(&T) -> bool,
{
    tokio::time::timeout(WAIT, async {
        loop {
            {
                let current = rx.borrow_and_update();
                if predicate(&*current) {
                    return current.clone();
                }
            }
            rx.changed().await.expect("sender alive");
        }
    })
    .await
    .expect("condition reached in time")
}
