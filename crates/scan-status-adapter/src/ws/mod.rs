/*
[INPUT]:  Stream endpoint configuration and bearer credential
[OUTPUT]: Live task-status frames and connection events
[POS]:    WebSocket layer - real-time data streams
[UPDATE]: When adding message kinds or changing connection logic
*/

pub mod client;
pub mod message;

pub use client::{StatusWebSocket, StreamChannel, StreamEvent};
pub use message::{StatusEnvelope, StatusFrame, TASK_STATUS_KIND, TaskStatusData, parse_status_frame};
