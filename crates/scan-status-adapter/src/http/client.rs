/*
[INPUT]:  HTTP configuration (base URL, timeouts)
[OUTPUT]: Configured reqwest client ready for API calls
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::auth::Credential;
use crate::http::{Result, ScanApiError};

/// Default base URL of the scan server
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
const ERROR_BODY_MAX_BYTES: usize = 512;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// REST client for the scan server
#[derive(Debug, Clone)]
pub struct ScanClient {
    http_client: Client,
    base_url: Url,
}

impl ScanClient {
    /// Create a new client against the default base URL
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Self::with_config_and_base_url(config, DEFAULT_BASE_URL)
    }

    /// Create a new client with custom configuration and base URL
    pub fn with_config_and_base_url(config: ClientConfig, base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        let base_url = Url::parse(base_url)?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ScanApiError::Config(format!(
                "base url must use http or https, got '{}'",
                base_url.scheme()
            )));
        }

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build full URL for an API endpoint
    fn url(&self, endpoint: &str) -> std::result::Result<Url, url::ParseError> {
        self.base_url.join(endpoint)
    }

    /// Build request builder, attaching the bearer credential when present
    pub(crate) fn request(
        &self,
        method: Method,
        endpoint: &str,
        credential: Option<&Credential>,
    ) -> Result<RequestBuilder> {
        let url = self.url(endpoint)?;
        let builder = self.http_client.request(method, url);
        Ok(match credential {
            Some(credential) => builder.header(reqwest::header::AUTHORIZATION, credential.bearer()),
            None => builder,
        })
    }

    /// Send a request and decode a JSON body, mapping non-success statuses to `ScanApiError::Api`
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = truncate_body(&body);
            debug!(status = status.as_u16(), message = %message, "scan api request rejected");
            return Err(ScanApiError::api_error(status, message));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= ERROR_BODY_MAX_BYTES {
        return body.to_string();
    }
    let mut end = ERROR_BODY_MAX_BYTES;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_body_respects_char_boundaries() {
        let body = "é".repeat(ERROR_BODY_MAX_BYTES);
        let truncated = truncate_body(&body);
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= ERROR_BODY_MAX_BYTES + 3);
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let err = ScanClient::with_config_and_base_url(ClientConfig::default(), "not a url")
            .expect_err("invalid url must fail");
        assert!(matches!(err, ScanApiError::UrlParse(_)));
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let err = ScanClient::with_config_and_base_url(ClientConfig::default(), "ws://127.0.0.1:8000")
            .expect_err("ws scheme must fail");
        assert!(matches!(err, ScanApiError::Config(_)));
    }
}
