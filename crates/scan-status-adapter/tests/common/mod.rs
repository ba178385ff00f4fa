/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for scan-status-adapter tests

use wiremock::MockServer;

/// Setup a mock HTTP server for testing
#[allow(dead_code)]
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Mock bearer token for testing
#[allow(dead_code)]
pub fn mock_bearer_token() -> String {
    "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.test.signature".to_string()
}

/// A `task_status` frame with one task per given status
#[allow(dead_code)]
pub fn task_status_frame(statuses: &[&str]) -> String {
    let tasks: Vec<serde_json::Value> = statuses
        .iter()
        .enumerate()
        .map(|(index, status)| {
            serde_json::json!({
                "id": index as i64 + 1,
                "status": status,
                "config_name": "subfinder",
                "asset_id": null,
                "created_at": "2026-01-05T10:00:00"
            })
        })
        .collect();
    serde_json::json!({"type": "task_status", "data": {"tasks": tasks}}).to_string()
}
