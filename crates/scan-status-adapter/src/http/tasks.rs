/*
[INPUT]:  Pagination parameters and bearer credential
[OUTPUT]: Task records (recent task list, single task)
[POS]:    HTTP layer - task endpoints (require bearer auth)
[UPDATE]: When adding task endpoints or changing query parameters
*/

use reqwest::Method;

use crate::auth::Credential;
use crate::http::{Result, ScanClient};
use crate::types::Task;

/// Query parameters for the recent-task listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

impl TaskQuery {
    pub fn with_limit(limit: u32) -> Self {
        Self {
            skip: None,
            limit: Some(limit),
        }
    }

    fn to_params(self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(skip) = self.skip {
            params.push(("skip", skip.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        params
    }
}

impl ScanClient {
    /// List the most recent tasks, newest first
    ///
    /// GET /api/v1/tasks/?skip={skip}&limit={limit}
    pub async fn list_tasks(
        &self,
        credential: Option<&Credential>,
        query: TaskQuery,
    ) -> Result<Vec<Task>> {
        let builder = self
            .request(Method::GET, "/api/v1/tasks/", credential)?
            .query(&query.to_params());
        self.send_json(builder).await
    }

    /// Fetch a single task by id
    ///
    /// GET /api/v1/tasks/{task_id}
    pub async fn fetch_task(&self, credential: Option<&Credential>, task_id: i64) -> Result<Task> {
        let endpoint = format!("/api/v1/tasks/{}", task_id);
        let builder = self.request(Method::GET, &endpoint, credential)?;
        self.send_json(builder).await
    }
}

#[cfg(test)]
mod tests {
    use crate::auth::Credential;
    use crate::http::{ClientConfig, ScanApiError, ScanClient, TaskQuery};
    use crate::types::TaskStatus;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ScanClient {
        ScanClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
            .expect("client init")
    }

    #[tokio::test]
    async fn test_list_tasks_sends_bearer_and_limit() {
        let server = MockServer::start().await;
        let body = serde_json::json!([
            {"id": 9, "status": "running", "config_name": "nmap", "asset_id": 2, "created_at": "2026-01-05T10:00:00"},
            {"id": 8, "status": "completed", "config_name": "httpx", "asset_id": null, "created_at": "2026-01-05T09:00:00"}
        ]);

        Mock::given(method("GET"))
            .and(path("/api/v1/tasks/"))
            .and(query_param("limit", "50"))
            .and(header("authorization", "Bearer token-a"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let credential = Credential::new("token-a");
        let tasks = client
            .list_tasks(Some(&credential), TaskQuery::with_limit(50))
            .await
            .expect("list_tasks failed");

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, 9);
        assert_eq!(tasks[0].status, TaskStatus::Running);
        assert_eq!(tasks[1].asset_id, None);
    }

    #[tokio::test]
    async fn test_list_tasks_maps_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/tasks/"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(serde_json::json!({"detail": "Not authenticated"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .list_tasks(None, TaskQuery::default())
            .await
            .expect_err("401 must fail");

        assert!(err.is_auth_error());
        assert!(matches!(err, ScanApiError::Api { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_fetch_task() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/tasks/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 42,
                "status": "failed",
                "config_name": "nuclei",
                "created_at": "2026-01-05T10:00:00",
                "completed_at": "2026-01-05T10:05:00",
                "log": "template error"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let credential = Credential::new("token-a");
        let task = client
            .fetch_task(Some(&credential), 42)
            .await
            .expect("fetch_task failed");

        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.log.as_deref(), Some("template error"));
        assert_eq!(task.completed_at.as_deref(), Some("2026-01-05T10:05:00"));
    }

    #[tokio::test]
    async fn test_list_tasks_rejects_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/tasks/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .list_tasks(None, TaskQuery::default())
            .await
            .expect_err("malformed body must fail");
        assert!(matches!(err, ScanApiError::Serialization(_)));
    }
}
