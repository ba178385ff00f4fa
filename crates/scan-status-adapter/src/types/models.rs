/*
[INPUT]:  Task records from the task-listing endpoint and the live-update stream
[OUTPUT]: Typed Rust structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When the task schema changes or new fields are added
*/

use serde::{Deserialize, Serialize};

use super::enums::TaskStatus;

/// A scan task as the server reports it.
///
/// Clients never patch a task in place; every update replaces the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub status: TaskStatus,
    pub config_name: String,
    #[serde(default)]
    pub asset_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy_steps: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_statuses: Option<Vec<StepStatus>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
}

impl Task {
    /// Strategy name when the task belongs to a multi-step strategy, else the config name.
    pub fn display_name(&self) -> &str {
        self.strategy_name.as_deref().unwrap_or(&self.config_name)
    }
}

/// Per-step progress of a strategy task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepStatus {
    pub config_name: String,
    #[serde(default)]
    pub task_id: Option<i64>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub artifact_path: Option<String>,
}
