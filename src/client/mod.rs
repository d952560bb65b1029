//! Agent Orchestrator API Client
//!
//! This module provides the HTTP gateway to the orchestration backend. It
//! handles request construction, status mapping and the resource sub-clients
//! (`agents()`, `workflows()`, `teams()`, `logs()`, `llm()`).
//!
//! Every call is independent: no caching, no retries, no request
//! coordination. Failures come back as [`OrchestratorError`] values whose
//! [`kind`](OrchestratorError::kind) tells transport problems, backend
//! rejections and malformed payloads apart.

use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{header, Client as HttpClient, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

use crate::{OrchestratorError, Result};

pub mod agents;
pub mod llm;
pub mod logs;
pub mod teams;
pub mod workflows;

pub use agents::AgentClient;
pub use llm::LlmClient;
pub use logs::LogClient;
pub use teams::TeamClient;
pub use workflows::WorkflowClient;

/// Backend address used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Request timeout used when nothing else is configured
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Environment variable overriding the backend address
pub const ENV_API_URL: &str = "AGENT_ORCHESTRATOR_API_URL";

/// Environment variable overriding the request timeout
pub const ENV_TIMEOUT_MS: &str = "AGENT_ORCHESTRATOR_TIMEOUT_MS";

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub timeout_ms: u64,
    pub user_agent: String,
    pub headers: HashMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: format!("agent-orchestrator-rust/{}", VERSION),
            headers: HashMap::new(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `AGENT_ORCHESTRATOR_API_URL` and
    /// `AGENT_ORCHESTRATOR_TIMEOUT_MS` when set
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = env::var(ENV_API_URL) {
            config.base_url = Url::parse(&raw)?;
        }
        if let Ok(raw) = env::var(ENV_TIMEOUT_MS) {
            config.timeout_ms = raw.parse().map_err(|_| {
                OrchestratorError::Configuration(format!(
                    "{} must be a number of milliseconds, got '{}'",
                    ENV_TIMEOUT_MS, raw
                ))
            })?;
        }
        Ok(config)
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("DEFAULT_BASE_URL is a valid URL")
}

/// Main API client
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    config: ClientConfig,
    http_client: Arc<HttpClient>,
}

impl Client {
    /// Create a new client with the given configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();

        headers.insert(
            header::USER_AGENT,
            config.user_agent.parse().map_err(|e| {
                OrchestratorError::Configuration(format!("Invalid user agent: {}", e))
            })?,
        );

        for (key, value) in &config.headers {
            let header_name = header::HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                OrchestratorError::Configuration(format!("Invalid header name '{}': {}", key, e))
            })?;
            let header_value = value.parse().map_err(|e| {
                OrchestratorError::Configuration(format!(
                    "Invalid header value for '{}': {}",
                    key, e
                ))
            })?;
            headers.insert(header_name, header_value);
        }

        // No client-wide timeout: it would also cut off long-lived log
        // streams. Plain requests get the timeout per request instead.
        let http_client = HttpClient::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| {
                OrchestratorError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        tracing::debug!(base_url = %config.base_url, timeout_ms = config.timeout_ms, "created api client");

        Ok(Self {
            config,
            http_client: Arc::new(http_client),
        })
    }

    /// Create a client builder
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Client configured from the environment, see [`ClientConfig::from_env`]
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    pub fn timeout_ms(&self) -> u64 {
        self.config.timeout_ms
    }

    /// Agent operations
    pub fn agents(&self) -> AgentClient {
        AgentClient::new(self.clone())
    }

    /// Workflow operations
    pub fn workflows(&self) -> WorkflowClient {
        WorkflowClient::new(self.clone())
    }

    /// Team operations
    pub fn teams(&self) -> TeamClient {
        TeamClient::new(self.clone())
    }

    /// Execution log queries and live streams
    pub fn logs(&self) -> LogClient {
        LogClient::new(self.clone())
    }

    /// LLM provider utilities
    pub fn llm(&self) -> LlmClient {
        LlmClient::new(self.clone())
    }

    /// Backend liveness (`GET /health`)
    pub async fn health(&self) -> Result<HealthStatus> {
        self.get_json("/health").await
    }

    /// Backend banner (`GET /`)
    pub async fn info(&self) -> Result<ServerInfo> {
        self.get_json("/").await
    }

    pub(crate) fn url(&self, path: &str) -> String {
        let base = self.config.base_url.as_str().trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        tracing::debug!(%method, %url, "sending request");
        self.http_client
            .request(method, url)
            .timeout(Duration::from_millis(self.config.timeout_ms))
    }

    /// Request without the per-request timeout, for long-lived streams
    pub(crate) fn stream_request(&self, path: &str) -> RequestBuilder {
        let url = self.url(path);
        tracing::debug!(%url, "opening event stream");
        self.http_client
            .get(url)
            .header(header::ACCEPT, "text/event-stream")
    }

    pub(crate) async fn get_json<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.send_json(self.request(Method::GET, path), path).await
    }

    pub(crate) async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(self.request(Method::POST, path).json(body), path)
            .await
    }

    pub(crate) async fn put_json<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(self.request(Method::PUT, path).json(body), path)
            .await
    }

    /// DELETE, ignoring whatever acknowledgement body comes back
    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, path), path).await?;
        Ok(())
    }

    pub(crate) async fn send_json<T>(&self, request: RequestBuilder, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send(request, path).await?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_slice(&body).map_err(|e| {
            OrchestratorError::InvalidResponse(format!(
                "{} answered {} with an undecodable body: {}",
                path, status, e
            ))
        })
    }

    /// Send and map non-2xx statuses to errors
    pub(crate) async fn send(&self, request: RequestBuilder, path: &str) -> Result<Response> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        check_status(response, path).await
    }

    pub(crate) fn transport_error(&self, error: reqwest::Error) -> OrchestratorError {
        if error.is_timeout() {
            OrchestratorError::Timeout {
                timeout_ms: self.config.timeout_ms,
            }
        } else {
            OrchestratorError::from(error)
        }
    }
}

/// `{collection}/{id}` with the id escaped as one path segment
///
/// Ids come from the backend or from users; `/`, `?` or `#` inside one must
/// not address a different resource.
pub(crate) fn resource_path(collection: &str, id: &str) -> String {
    format!("{}/{}", collection, urlencoding::encode(id))
}

/// Map a non-success response to [`OrchestratorError`]
pub(crate) async fn check_status(response: Response, path: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        tracing::debug!(status = status.as_u16(), path, "request succeeded");
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_detail(&body);
    tracing::debug!(status = status.as_u16(), path, %message, "request rejected");

    if status == reqwest::StatusCode::NOT_FOUND {
        Err(OrchestratorError::NotFound(format!("{}: {}", path, message)))
    } else {
        Err(OrchestratorError::Server {
            status: status.as_u16(),
            message,
        })
    }
}

/// Pull a human-readable message out of an error body
///
/// The backend reports errors as `{"detail": ...}`; anything else is passed
/// through as text.
fn error_detail(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: serde_json::Value,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

/// Check an Ollama daemon directly by listing its models at `{url}/api/tags`
///
/// Returns `Ok(false)` when the daemon answers with an error status and an
/// error when it cannot be reached at all.
pub async fn probe_ollama(url: &str) -> Result<bool> {
    let base = Url::parse(url)?;
    let tags = format!("{}/api/tags", base.as_str().trim_end_matches('/'));
    tracing::debug!(url = %tags, "probing ollama");

    let response = HttpClient::new()
        .get(&tags)
        .timeout(Duration::from_millis(5_000))
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                OrchestratorError::Timeout { timeout_ms: 5_000 }
            } else {
                OrchestratorError::from(e)
            }
        })?;
    Ok(response.status().is_success())
}

/// Builder for creating an API client
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Set the base URL
    pub fn base_url(mut self, base_url: &str) -> Result<Self> {
        self.config.base_url = Url::parse(base_url)?;
        Ok(self)
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout_ms: u64) -> Self {
        self.config.timeout_ms = timeout_ms;
        self
    }

    pub fn user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Add a custom header
    pub fn header<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.config.headers.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<Client> {
        Client::new(self.config)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Response of `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Response of `GET /`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub status: String,
}

/// Acknowledgement for a simple command such as `execute`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionAck {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub workflow_id: Option<String>,
}

/// A workflow run the backend currently reports as in flight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveExecution {
    pub execution_id: String,
    pub workflow_id: String,
    pub status: String,
    #[serde(with = "crate::models::timestamp")]
    pub start_time: DateTime<Utc>,
    #[serde(
        default,
        with = "crate::models::timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<DateTime<Utc>>,
}
