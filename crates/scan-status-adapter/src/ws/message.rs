/*
[INPUT]:  Raw live-update frames (JSON text)
[OUTPUT]: Parsed StatusFrame values
[POS]:    WebSocket layer - message parsing and validation
[UPDATE]: When adding new message kinds or changing the envelope format
*/

use serde::{Deserialize, Serialize};

use crate::types::Task;

/// Envelope kind carrying a full task-list update.
pub const TASK_STATUS_KIND: &str = "task_status";

/// Outer shape shared by every live-update message.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatusEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Payload of a `task_status` message
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TaskStatusData {
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// A frame that parsed successfully.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusFrame {
    /// Full replacement task list.
    TaskStatus(Vec<Task>),
    /// Any other kind; carried for logging only.
    Other(String),
}

/// Parse one frame.
///
/// Unknown kinds are returned as [`StatusFrame::Other`] without inspecting their
/// payload. A `task_status` frame without `data` (or without `data.tasks`) is an
/// empty task list; an ill-typed `tasks` array is an error.
pub fn parse_status_frame(raw: &str) -> Result<StatusFrame, serde_json::Error> {
    let envelope: StatusEnvelope = serde_json::from_str(raw)?;
    if envelope.kind != TASK_STATUS_KIND {
        return Ok(StatusFrame::Other(envelope.kind));
    }

    let data = match envelope.data {
        Some(serde_json::Value::Null) | None => TaskStatusData::default(),
        Some(value) => serde_json::from_value::<TaskStatusData>(value)?,
    };
    Ok(StatusFrame::TaskStatus(data.tasks))
}
