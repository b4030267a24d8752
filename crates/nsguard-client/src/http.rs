//! HTTP client with failover for the portal
//!
//! Reads are retried on the next portal address when the transport fails.
//! Deletes are sent exactly once.

use std::{sync::RwLock, time::Duration};

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, error, warn};
use url::Url;

use crate::config::PortalClientConfig;
use crate::error::PortalError;
use crate::model::PortalErrorBody;

/// HTTP client with failover support
pub struct PortalHttpClient {
    client: Client,
    config: PortalClientConfig,
    current_server_index: RwLock<usize>,
}

impl PortalHttpClient {
    pub fn new(config: PortalClientConfig) -> Result<Self, PortalError> {
        if config.server_addrs.is_empty() {
            return Err(anyhow::anyhow!("No portal address configured").into());
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            config,
            current_server_index: RwLock::new(0),
        })
    }

    /// Get the current portal address
    fn current_server(&self) -> String {
        let index = *self
            .current_server_index
            .read()
            .unwrap_or_else(|e| e.into_inner());
        self.config.server_addrs[index].clone()
    }

    /// Switch to the next portal address (for failover)
    fn switch_to_next_server(&self) {
        let mut index = self
            .current_server_index
            .write()
            .unwrap_or_else(|e| e.into_inner());
        *index = (*index + 1) % self.config.server_addrs.len();
        debug!("Switched to portal index: {}", *index);
    }

    /// Build full URL with context path, escaping every segment
    pub(crate) fn build_url(&self, segments: &[&str]) -> Result<Url, PortalError> {
        let base = self.current_server();
        let mut url = Url::parse(&base)?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| PortalError::CannotBeABase(base.clone()))?;
            path.pop_if_empty();
            path.extend(
                self.config
                    .context_path
                    .split('/')
                    .filter(|s| !s.is_empty()),
            );
            path.extend(segments);
        }
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.access_token {
            Some(token) => request.header(reqwest::header::AUTHORIZATION, token),
            None => request,
        }
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, PortalError> {
        let response = self
            .request_with_retry(|client, url| client.get(url), segments)
            .await?;
        Self::handle_response(response).await
    }

    /// Make a GET request with query parameters
    pub async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        query: &Q,
    ) -> Result<T, PortalError> {
        let response = self
            .request_with_retry(|client, url| client.get(url).query(query), segments)
            .await?;
        Self::handle_response(response).await
    }

    /// Make a GET request where "not found" and an empty body mean `None`
    pub async fn get_optional<T: DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> Result<Option<T>, PortalError> {
        let response = self
            .request_with_retry(|client, url| client.get(url), segments)
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(serde_json::from_slice::<Option<T>>(&body)?)
    }

    /// Make a DELETE request without retrying on another portal
    pub async fn delete(&self, segments: &[&str]) -> Result<(), PortalError> {
        let url = self.build_url(segments)?;
        debug!("DELETE {}", url);

        let response = self.authorize(self.client.delete(url)).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from_response(response).await)
        }
    }

    /// Send a request, moving to the next portal on transport errors
    async fn request_with_retry<F>(
        &self,
        build_request: F,
        segments: &[&str],
    ) -> Result<Response, PortalError>
    where
        F: Fn(&Client, Url) -> RequestBuilder,
    {
        let max_retries = self.config.server_addrs.len();
        let mut last_error = None;

        for _ in 0..max_retries {
            let url = self.build_url(segments)?;
            debug!("GET {}", url);

            match self
                .authorize(build_request(&self.client, url))
                .send()
                .await
            {
                Ok(response) => return Ok(response),
                Err(e) => {
                    warn!("Request failed: {}, switching to next portal", e);
                    self.switch_to_next_server();
                    last_error = Some(e.into());
                }
            }
        }

        Err(last_error.unwrap_or(PortalError::AllServersFailed))
    }

    /// Handle response and parse JSON
    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, PortalError> {
        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            Err(Self::error_from_response(response).await)
        }
    }

    async fn error_from_response(response: Response) -> PortalError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<PortalErrorBody>(&body).unwrap_or_default();

        let message = parsed
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                if body.is_empty() {
                    status.to_string()
                } else {
                    body.clone()
                }
            });
        error!("Request failed with status {}: {}", status, message);

        PortalError::RequestFailed {
            status: status.as_u16(),
            message,
            detail: parsed.detail.or(parsed.exception),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_server() {
        let config = PortalClientConfig::with_servers(Vec::new());
        assert!(PortalHttpClient::new(config).is_err());
    }

    #[test]
    fn test_build_url_no_context() {
        let client =
            PortalHttpClient::new(PortalClientConfig::new("http://localhost:8070")).unwrap();

        assert_eq!(
            client.build_url(&["apps", "app1", "role_users"]).unwrap().as_str(),
            "http://localhost:8070/apps/app1/role_users"
        );
    }

    #[test]
    fn test_build_url_with_context() {
        let config =
            PortalClientConfig::new("http://localhost:8070/").with_context_path("/portal/");
        let client = PortalHttpClient::new(config).unwrap();

        assert_eq!(
            client.build_url(&["user"]).unwrap().as_str(),
            "http://localhost:8070/portal/user"
        );
    }

    #[test]
    fn test_build_url_escapes_segments() {
        let client =
            PortalHttpClient::new(PortalClientConfig::new("http://localhost:8070")).unwrap();

        assert_eq!(
            client.build_url(&["apps", "a/b", "role_users"]).unwrap().as_str(),
            "http://localhost:8070/apps/a%2Fb/role_users"
        );
    }

    #[test]
    fn test_switch_server_wraps() {
        let config = PortalClientConfig::with_servers(vec![
            "http://portal1:8070".to_string(),
            "http://portal2:8070".to_string(),
        ]);
        let client = PortalHttpClient::new(config).unwrap();

        assert_eq!(client.current_server(), "http://portal1:8070");
        client.switch_to_next_server();
        assert_eq!(client.current_server(), "http://portal2:8070");
        client.switch_to_next_server();
        assert_eq!(client.current_server(), "http://portal1:8070");
    }
}
