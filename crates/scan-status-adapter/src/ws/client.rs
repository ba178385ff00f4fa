/*
[INPUT]:  Live-update stream URL, task limit and optional bearer credential
[OUTPUT]: Connection lifecycle events and raw frames via a channel
[POS]:    WebSocket layer - live task-status stream handling
[UPDATE]: When changing connection parameters or frame forwarding
*/

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use crate::auth::Credential;
use crate::http::{Result, ScanApiError};

const DEFAULT_STREAM_URL: &str = "ws://127.0.0.1:8000/api/v1/tasks/stream";
const DEFAULT_TASK_LIMIT: u32 = 50;
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Events emitted by one stream connection, in order.
///
/// A connection ends with exactly one `Failed` or `Closed`; nothing follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Handshake completed.
    Connected,
    /// Text frame (binary frames are forwarded when valid UTF-8).
    Frame(String),
    /// Connect or transport failure.
    Failed(String),
    /// Peer closed the connection, with its reason if it gave one.
    Closed(Option<String>),
}

/// Receiving half of one stream connection.
///
/// Closing (or dropping) the channel stops the connection task; no event is
/// delivered afterwards.
#[derive(Debug)]
pub struct StreamChannel {
    events: mpsc::Receiver<StreamEvent>,
    cancel: CancellationToken,
}

impl StreamChannel {
    pub fn new(events: mpsc::Receiver<StreamEvent>, cancel: CancellationToken) -> Self {
        Self { events, cancel }
    }

    /// Next event, or `None` once the connection task is gone.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        if self.cancel.is_cancelled() {
            return None;
        }
        self.events.recv().await
    }

    /// Stop the connection. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        self.events.close();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for StreamChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// WebSocket client for the live task-status stream
#[derive(Debug, Clone)]
pub struct StatusWebSocket {
    stream_url: Url,
    limit: u32,
}

impl StatusWebSocket {
    /// Create a client for the default local stream endpoint
    pub fn new() -> Result<Self> {
        Self::with_url(DEFAULT_STREAM_URL, DEFAULT_TASK_LIMIT)
    }

    /// Create a client for a specific stream endpoint
    pub fn with_url(stream_url: &str, limit: u32) -> Result<Self> {
        let stream_url = Url::parse(stream_url)?;
        if !matches!(stream_url.scheme(), "ws" | "wss") {
            return Err(ScanApiError::Config(format!(
                "stream url must use ws or wss, got '{}'",
                stream_url.scheme()
            )));
        }
        if limit == 0 {
            return Err(ScanApiError::Config(
                "task limit must be greater than zero".to_string(),
            ));
        }
        Ok(Self { stream_url, limit })
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Endpoint URL with `limit` and, when present, `token` query parameters.
    pub fn stream_url_for(&self, credential: Option<&Credential>) -> Url {
        let mut url = self.stream_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("limit", &self.limit.to_string());
            if let Some(credential) = credential {
                pairs.append_pair("token", credential.token());
            }
        }
        url
    }

    /// Open a connection in the background.
    ///
    /// Never fails synchronously: connect errors arrive as [`StreamEvent::Failed`].
    /// Must be called from within a Tokio runtime.
    pub fn open(&self, credential: Option<&Credential>) -> StreamChannel {
        let url = self.stream_url_for(credential);
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        tokio::spawn(async move {
            run_connection(url, event_tx, task_cancel).await;
        });

        StreamChannel::new(event_rx, cancel)
    }
}

async fn run_connection(url: Url, event_tx: mpsc::Sender<StreamEvent>, cancel: CancellationToken) {
    let endpoint = format!("{}{}", url.host_str().unwrap_or_default(), url.path());
    info!(%endpoint, "connecting to task status stream");

    let connected = tokio::select! {
        _ = cancel.cancelled() => return,
        result = connect_async(url.as_str()) => result,
    };

    let ws_stream = match connected {
        Ok((ws_stream, _response)) => ws_stream,
        Err(err) => {
            let _ = event_tx.send(StreamEvent::Failed(err.to_string())).await;
            return;
        }
    };

    if event_tx.send(StreamEvent::Connected).await.is_err() {
        return;
    }
    info!(%endpoint, "task status stream connected");

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = write.send(WsMessage::Close(None)).await;
                debug!(%endpoint, "task status stream closed locally");
                break;
            }
            incoming = read.next() => {
                let event = match incoming {
                    Some(Ok(WsMessage::Text(text))) => StreamEvent::Frame(text.to_string()),
                    Some(Ok(WsMessage::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => StreamEvent::Frame(text),
                        Err(_) => {
                            debug!(bytes = bytes.len(), "dropping non-utf8 binary frame");
                            continue;
                        }
                    },
                    Some(Ok(WsMessage::Close(frame))) => {
                        let reason = frame
                            .map(|frame| frame.reason.to_string())
                            .filter(|reason| !reason.is_empty());
                        StreamEvent::Closed(reason)
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => StreamEvent::Failed(err.to_string()),
                    None => StreamEvent::Closed(None),
                };

                let terminal = matches!(event, StreamEvent::Failed(_) | StreamEvent::Closed(_));
                if event_tx.send(event).await.is_err() || terminal {
                    break;
                }
            }
        }
    }
}
