//! GraphQL-over-HTTP store session for Dgraph.

use super::response::{GraphQlRequest, GraphQlResponse};
use super::traits::StoreSession;
use crate::error::{Result, StoreErrorKind, ThreatDbError};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Default GraphQL endpoint of a local Dgraph alpha.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/graphql";

/// GraphQL session configuration.
#[derive(Debug, Clone)]
pub struct GraphQlSessionConfig {
    /// GraphQL endpoint; `/graphql` is appended when missing
    pub endpoint: String,
    /// Sent as `X-Dgraph-AuthToken` and `X-Auth-Token`
    pub api_key: Option<String>,
    /// Sent as `Authorization: Bearer ...`
    pub cloud_api_key: Option<String>,
    /// Sent as `X-Dgraph-AccessToken`
    pub acl_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Retries after a connection-level failure
    pub transport_retries: u32,
    /// Delay before the first transport retry; doubles per attempt
    pub retry_backoff: Duration,
}

impl Default for GraphQlSessionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            cloud_api_key: None,
            acl_key: None,
            timeout: Duration::from_secs(30),
            transport_retries: 1,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// HTTP session against a Dgraph GraphQL endpoint.
pub struct GraphQlSession {
    client: Client,
    endpoint: String,
    health_url: String,
    config: GraphQlSessionConfig,
}

/// Helper to convert reqwest errors to store errors
fn connection_error(msg: &str, err: &reqwest::Error) -> ThreatDbError {
    ThreatDbError::store(msg, StoreErrorKind::Connection(err.to_string()))
}

/// Normalize a configured host into the GraphQL endpoint.
#[must_use]
pub fn graphql_endpoint(host: &str) -> String {
    let trimmed = host.trim().trim_end_matches('/');
    if trimmed.ends_with("/graphql") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/graphql")
    }
}

/// The `/health` endpoint next to a GraphQL endpoint.
#[must_use]
pub fn health_endpoint(graphql: &str) -> String {
    let base = graphql.strip_suffix("/graphql").unwrap_or(graphql);
    format!("{base}/health")
}

fn auth_headers(config: &GraphQlSessionConfig) -> Result<HeaderMap> {
    fn value(secret: &str, field: &str) -> Result<HeaderValue> {
        let mut value = HeaderValue::from_str(secret)
            .map_err(|_| ThreatDbError::config(format!("{field} is not a valid header value")))?;
        value.set_sensitive(true);
        Ok(value)
    }

    let mut headers = HeaderMap::new();
    if let Some(key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
        let v = value(key, "api_key")?;
        headers.insert(HeaderName::from_static("x-dgraph-authtoken"), v.clone());
        headers.insert(HeaderName::from_static("x-auth-token"), v);
    }
    if let Some(key) = config.cloud_api_key.as_deref().filter(|k| !k.is_empty()) {
        headers.insert(AUTHORIZATION, value(&format!("Bearer {key}"), "cloud_api_key")?);
    }
    if let Some(key) = config.acl_key.as_deref().filter(|k| !k.is_empty()) {
        headers.insert(
            HeaderName::from_static("x-dgraph-accesstoken"),
            value(key, "acl_key")?,
        );
    }
    Ok(headers)
}

#[derive(Debug, Deserialize)]
struct HealthNode {
    #[serde(default)]
    instance: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl HealthNode {
    fn is_healthy_alpha(&self) -> bool {
        self.instance.as_deref() == Some("alpha") && self.status.as_deref() == Some("healthy")
    }
}

/// Whether a `/health` body reports a healthy alpha node.
fn reports_healthy_alpha(body: &Value) -> bool {
    let nodes: Vec<HealthNode> = match body {
        Value::Array(_) => serde_json::from_value(body.clone()).unwrap_or_default(),
        Value::Object(_) => serde_json::from_value(body.clone())
            .map(|node| vec![node])
            .unwrap_or_default(),
        _ => Vec::new(),
    };
    nodes.iter().any(HealthNode::is_healthy_alpha)
}

impl GraphQlSession {
    /// Create a new session.
    pub fn new(config: GraphQlSessionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(auth_headers(&config)?)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| connection_error("Failed to create HTTP client", &e))?;

        let endpoint = graphql_endpoint(&config.endpoint);
        let health_url = health_endpoint(&endpoint);
        Ok(Self {
            client,
            endpoint,
            health_url,
            config,
        })
    }

    /// The resolved GraphQL endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn send_once(&self, request: &GraphQlRequest) -> std::result::Result<GraphQlResponse, SendError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .map_err(SendError::Transport)?;

        let status = response.status();
        let body = response.text().map_err(SendError::Transport)?;
        let parsed: Option<GraphQlResponse> = serde_json::from_str(&body).ok();

        if status.is_success() {
            return parsed.ok_or_else(|| {
                SendError::Store(ThreatDbError::store(
                    "parsing GraphQL response",
                    StoreErrorKind::InvalidResponse(truncate(&body)),
                ))
            });
        }
        // Some gateways answer GraphQL errors with a non-2xx status.
        match parsed {
            Some(parsed) if parsed.has_errors() => Ok(parsed),
            _ => Err(SendError::Store(ThreatDbError::store(
                "GraphQL request",
                StoreErrorKind::HttpStatus {
                    status: status.as_u16(),
                    message: truncate(&body),
                },
            ))),
        }
    }
}

enum SendError {
    Transport(reqwest::Error),
    Store(ThreatDbError),
}

fn truncate(body: &str) -> String {
    const LIMIT: usize = 512;
    match body.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

impl StoreSession for GraphQlSession {
    fn submit(&self, request: &GraphQlRequest) -> Result<GraphQlResponse> {
        let mut last_error = None;

        for attempt in 0..=self.config.transport_retries {
            if attempt > 0 {
                let delay = self.config.retry_backoff * (1 << (attempt - 1).min(16));
                std::thread::sleep(delay);
                tracing::debug!("Retry attempt {} after {:?}", attempt, delay);
            }

            match self.send_once(request) {
                Ok(response) => {
                    if let Some(first) = response.first_error() {
                        if first.contains("No Auth Token") {
                            tracing::warn!(
                                "Please set the database authentication token via the environment variable DGRAPH_API_KEY"
                            );
                        }
                    }
                    return Ok(response);
                }
                Err(SendError::Store(err)) => return Err(err),
                Err(SendError::Transport(err)) => {
                    tracing::debug!("GraphQL request attempt {} failed: {}", attempt + 1, err);
                    last_error = Some(err);
                }
            }
        }

        let err = match last_error {
            Some(err) => connection_error("GraphQL API is unavailable", &err),
            None => ThreatDbError::store(
                "GraphQL API is unavailable",
                StoreErrorKind::Connection("no attempt was made".to_string()),
            ),
        };
        tracing::warn!(endpoint = %self.endpoint, "{err}");
        Err(err)
    }

    fn is_alive(&self) -> bool {
        let response = match self.client.get(&self.health_url).send() {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(url = %self.health_url, "health check failed: {err}");
                return false;
            }
        };
        if !response.status().is_success() {
            tracing::warn!(
                url = %self.health_url,
                "Unable to perform healthcheck due to {}",
                response.status().as_u16()
            );
            return false;
        }
        match response.json::<Value>() {
            Ok(body) => reports_healthy_alpha(&body),
            Err(err) => {
                tracing::warn!(url = %self.health_url, "unreadable health response: {err}");
                false
            }
        }
    }

    fn name(&self) -> &str {
        "dgraph"
    }
}
