//! SDK client implementation
//!
//! This module provides the main client for the hub and job REST APIs. Every
//! call is a single attempt; failures are returned to the caller untouched.

use crate::config::ClientConfig;
use crate::error::{SdkError, SdkResult};
use crate::models::WhoAmI;
use crate::services::{JobService, RepoService, SpaceService};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, LINK, USER_AGENT};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Main SDK client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    config: ClientConfig,
}

impl Client {
    /// Create a new client builder
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a new client with the given configuration
    pub fn new(config: ClientConfig) -> SdkResult<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("evaljobs")),
        );

        if let Some(auth) = config.auth_header() {
            let mut value = HeaderValue::from_str(&auth).map_err(|_| SdkError::ConfigError {
                message: "Invalid authorization header".to_string(),
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| SdkError::ConfigError {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            inner: Arc::new(ClientInner { http, config }),
        })
    }

    /// Create a client from environment variables
    pub fn from_env() -> SdkResult<Self> {
        let config = ClientConfig::from_env()?;
        Self::new(config)
    }

    /// Get the configuration
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Hub endpoint without trailing slash
    pub fn endpoint(&self) -> &str {
        self.inner.config.endpoint()
    }

    /// Get the repository service
    pub fn repos(&self) -> RepoService {
        RepoService::new(self.clone())
    }

    /// Get the Space service
    pub fn spaces(&self) -> SpaceService {
        SpaceService::new(self.clone())
    }

    /// Get the job service
    pub fn jobs(&self) -> JobService {
        JobService::new(self.clone())
    }

    /// Account the token belongs to
    pub async fn whoami(&self) -> SdkResult<WhoAmI> {
        self.get("/api/whoami-v2").await
    }

    /// Make a GET request and decode JSON
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> SdkResult<T> {
        self.request(reqwest::Method::GET, path, Option::<&()>::None)
            .await
    }

    /// GET a JSON list, following `Link: <...>; rel="next"` headers to the last page
    pub(crate) async fn get_all_pages<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> SdkResult<Vec<T>> {
        let url = self.url(path);
        self.log_request(&reqwest::Method::GET, &url);
        let mut response = self
            .inner
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let mut items = Vec::new();
        loop {
            let next = next_page(response.headers());
            let page: Vec<T> = self.handle_response(response, path).await?;
            items.extend(page);

            let Some(next) = next else {
                return Ok(items);
            };
            self.log_request(&reqwest::Method::GET, &next);
            response = self
                .inner
                .http
                .get(&next)
                .send()
                .await
                .map_err(|e| self.transport_error(e))?;
        }
    }

    /// Make a POST request with a JSON body
    pub(crate) async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> SdkResult<T> {
        self.request(reqwest::Method::POST, path, Some(body)).await
    }

    /// Make a POST request with a JSON body, ignoring the answer body
    pub(crate) async fn post_no_content<B: Serialize>(&self, path: &str, body: &B) -> SdkResult<()> {
        let url = self.url(path);
        self.log_request(&reqwest::Method::POST, &url);

        let response = self.inner.http.post(&url).json(body).send().await.map_err(|e| self.transport_error(e))?;
        self.ensure_success(response, path).await
    }

    /// Make a DELETE request with a JSON body
    pub(crate) async fn delete_with_body<B: Serialize>(&self, path: &str, body: &B) -> SdkResult<()> {
        let url = self.url(path);
        self.log_request(&reqwest::Method::DELETE, &url);

        let response = self.inner.http.delete(&url).json(body).send().await.map_err(|e| self.transport_error(e))?;
        self.ensure_success(response, path).await
    }

    /// Make a POST request with an NDJSON body and decode JSON
    pub(crate) async fn post_ndjson<T: DeserializeOwned>(
        &self,
        path: &str,
        body: String,
    ) -> SdkResult<T> {
        let url = self.url(path);
        self.log_request(&reqwest::Method::POST, &url);

        let response = self
            .inner
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.handle_response(response, path).await
    }

    /// Make a GET request and return the raw body
    pub(crate) async fn get_bytes(&self, path: &str) -> SdkResult<Vec<u8>> {
        let url = self.url(path);
        self.log_request(&reqwest::Method::GET, &url);

        let response = self.inner.http.get(&url).send().await.map_err(|e| self.transport_error(e))?;
        if response.status().is_success() {
            let bytes = response.bytes().await.map_err(|e| self.transport_error(e))?;
            Ok(bytes.to_vec())
        } else {
            Err(self.handle_error_response(response, path).await)
        }
    }

    /// Make a GET request and return the body as text
    pub(crate) async fn get_text(&self, path: &str) -> SdkResult<String> {
        let bytes = self.get_bytes(path).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Make a request with optional body
    async fn request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&B>,
    ) -> SdkResult<T> {
        let url = self.url(path);
        self.log_request(&method, &url);

        let mut request = self.inner.http.request(method, &url);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;

        self.handle_response(response, path).await
    }

    fn transport_error(&self, err: reqwest::Error) -> SdkError {
        SdkError::transport(err, self.inner.config.timeout)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint(), path)
    }

    fn log_request(&self, method: &reqwest::Method, url: &str) {
        if self.inner.config.debug {
            debug!("SDK request: {} {}", method, url);
        }
    }

    /// Handle successful response
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        resource: &str,
    ) -> SdkResult<T> {
        if response.status().is_success() {
            let text = response.text().await.map_err(|e| self.transport_error(e))?;

            if self.inner.config.debug {
                debug!("SDK response body: {}", text);
            }

            serde_json::from_str(&text).map_err(|e| {
                error!("Failed to parse response: {}", e);
                SdkError::InvalidResponse {
                    message: format!("Failed to parse response: {}", e),
                }
            })
        } else {
            Err(self.handle_error_response(response, resource).await)
        }
    }

    async fn ensure_success(&self, response: reqwest::Response, resource: &str) -> SdkResult<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.handle_error_response(response, resource).await)
        }
    }

    /// Handle error response
    async fn handle_error_response(&self, response: reqwest::Response, resource: &str) -> SdkError {
        let status_code = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        if self.inner.config.debug {
            debug!("SDK error response ({}): {}", status_code, body);
        }

        let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(api_error) => api_error.error,
            Err(_) if body.trim().is_empty() => format!("HTTP {}", status_code),
            Err(_) => body,
        };

        SdkError::from_status(status_code, resource, message)
    }
}

/// Target of the `rel="next"` entry of a `Link` header
fn next_page(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|entry| {
        let (target, params) = entry.split_once(';')?;
        let is_next = params
            .split(';')
            .any(|p| matches!(p.trim(), "rel=\"next\"" | "rel=next"));
        is_next.then(|| {
            target
                .trim()
                .trim_start_matches('<')
                .trim_end_matches('>')
                .to_string()
        })
    })
}

/// Error body returned by the hub
#[derive(Debug, serde::Deserialize)]
struct ApiErrorResponse {
    error: String,
}

/// Client builder for ergonomic configuration
#[derive(Default)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    /// Load configuration from environment
    pub fn from_env(mut self) -> SdkResult<Self> {
        self.config = ClientConfig::from_env()?;
        Ok(self)
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the access token
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Enable debug mode
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Build the client
    pub fn build(self) -> SdkResult<Client> {
        Client::new(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = Client::builder()
            .base_url("https://hub.example.com/")
            .token("hf_test")
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap();

        assert_eq!(client.endpoint(), "https://hub.example.com");
        assert_eq!(client.config().token, Some("hf_test".to_string()));
        assert_eq!(client.config().timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_next_page_from_link_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(next_page(&headers), None);

        headers.insert(
            LINK,
            HeaderValue::from_static(
                "<https://hub.example.com/api/datasets/a/b/tree/main?cursor=abc>; rel=\"next\"",
            ),
        );
        assert_eq!(
            next_page(&headers).as_deref(),
            Some("https://hub.example.com/api/datasets/a/b/tree/main?cursor=abc")
        );

        headers.insert(
            LINK,
            HeaderValue::from_static("<https://hub.example.com/first>; rel=\"prev\""),
        );
        assert_eq!(next_page(&headers), None);
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(Client::builder().base_url("nope").build().is_err());
    }
}
