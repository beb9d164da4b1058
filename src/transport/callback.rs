use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use std::sync::Arc;
use std::time::Duration;

use super::{SendOutcome, Transport, TransportProvider};

/// Pushes to connections held by an external gateway through its
/// connection-management API: `POST {endpoint}/@connections/{id}`.
#[derive(Clone)]
pub struct CallbackTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl CallbackTransport {
    pub fn new(client: reqwest::Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }

    fn connection_url(&self, target_id: &str) -> Result<Url, String> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| format!("invalid endpoint {}: {e}", self.endpoint))?;
        url.path_segments_mut()
            .map_err(|_| format!("endpoint {} cannot be a base url", self.endpoint))?
            .pop_if_empty()
            .push("@connections")
            .push(target_id);
        Ok(url)
    }
}

#[async_trait]
impl Transport for CallbackTransport {
    async fn send(&self, target_id: &str, payload: &str) -> SendOutcome {
        let url = match self.connection_url(target_id) {
            Ok(url) => url,
            Err(e) => return SendOutcome::Failed(e),
        };

        let resp = match self
            .client
            .post(url)
            .header("content-type", "application/json")
            .body(payload.to_string())
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => return SendOutcome::Failed(format!("request failed: {e}")),
        };

        match resp.status() {
            s if s.is_success() => SendOutcome::Delivered,
            StatusCode::GONE | StatusCode::NOT_FOUND => SendOutcome::Gone,
            s => SendOutcome::Failed(format!("gateway returned {s}")),
        }
    }
}

/// Builds a [`CallbackTransport`] per endpoint, sharing one HTTP client.
#[derive(Clone)]
pub struct CallbackProvider {
    client: reqwest::Client,
}

impl CallbackProvider {
    pub fn new(send_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(send_timeout).build()?;
        Ok(Self { client })
    }
}

impl TransportProvider for CallbackProvider {
    fn resolve(&self, endpoint: &str) -> Arc<dyn Transport> {
        Arc::new(CallbackTransport::new(self.client.clone(), endpoint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_url_appends_to_stage_path() {
        let t = CallbackTransport::new(reqwest::Client::new(), "https://example.com/dev");
        let url = t.connection_url("abc=").unwrap();
        assert_eq!(url.as_str(), "https://example.com/dev/@connections/abc=");
    }

    #[test]
    fn test_connection_url_tolerates_trailing_slash() {
        let t = CallbackTransport::new(reqwest::Client::new(), "https://example.com/dev/");
        let url = t.connection_url("abc").unwrap();
        assert_eq!(url.as_str(), "https://example.com/dev/@connections/abc");
    }

    #[tokio::test]
    async fn test_invalid_endpoint_is_failure_not_gone() {
        let t = CallbackTransport::new(reqwest::Client::new(), "not a url");
        assert!(matches!(t.send("abc", "{}").await, SendOutcome::Failed(_)));
    }
}
