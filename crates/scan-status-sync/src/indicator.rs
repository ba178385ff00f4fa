/*
[INPUT]:  Task snapshot
[OUTPUT]: Aggregate IndicatorState
[POS]:    Domain logic - pure indicator derivation
[UPDATE]: When indicator precedence changes
*/

use scan_status_adapter::{Task, TaskStatus};
use serde::Serialize;

/// Coarse aggregate status shown by badges and dashboard widgets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorState {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for IndicatorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            IndicatorState::Idle => "idle",
            IndicatorState::Running => "running",
            IndicatorState::Completed => "completed",
            IndicatorState::Failed => "failed",
        })
    }
}

/// Derive the indicator for a task list.
///
/// First match wins: empty list is `Idle`, any failure is `Failed`, any pending
/// or running task is `Running`, otherwise `Completed`. A single failure
/// dominates even while other tasks are still running.
pub fn derive(tasks: &[Task]) -> IndicatorState {
    if tasks.is_empty() {
        return IndicatorState::Idle;
    }
    if tasks.iter().any(|task| task.status == TaskStatus::Failed) {
        return IndicatorState::Failed;
    }
    if tasks.iter().any(|task| task.status.is_active()) {
        return IndicatorState::Running;
    }
    IndicatorState::Completed
}
