//! REST client for the monitoring API.
//!
//! [`ApiClient`] implements the engine's [`StatusProvider`] and
//! [`ItemDirectory`] traits on top of `reqwest`.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use upwatch_cli::client::{ApiClient, ClientConfig};
//!
//! # fn example() -> Result<(), upwatch_cli::CliError> {
//! let config = ClientConfig {
//!     base_url: "https://api.upwatch.dev".parse().map_err(|_| upwatch_cli::CliError::Config("bad url".into()))?,
//!     token: None,
//!     timeout: Duration::from_secs(10),
//! };
//! let client = ApiClient::new(&config)?;
//! # let _ = client;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use upwatch_core::{
    Event, FetchError, ItemDirectory, ItemStatus, ItemSummary, StableId, StatusProvider,
    TargetSelector,
};
use url::Url;

use crate::error::CliError;

/// Connection settings for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL.
    pub base_url: Url,
    /// Bearer token.
    pub token: Option<String>,
    /// Connect timeout. Per-request deadlines are applied by the fetcher.
    pub timeout: Duration,
}

/// Monitoring API client.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

/// Every API response wraps its payload in `data`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ApiClient {
    /// Builds a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not http(s) or the HTTP client cannot
    /// be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, CliError> {
        if !matches!(config.base_url.scheme(), "http" | "https") {
            return Err(CliError::Config(format!(
                "invalid API URL: {}, must start with http:// or https://",
                config.base_url
            )));
        }
        if config.base_url.cannot_be_a_base() {
            return Err(CliError::Config(format!("invalid API URL: {}", config.base_url)));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("upwatch/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| CliError::Config(format!("failed to build HTTP client: {e}")))?;

        debug!(url = %config.base_url, "API client ready");
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Base URL with `segments` appended as path components.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::Transport(format!("invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        trace!(%url, ?query, "GET");
        let mut request = self.http.get(url.clone()).query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.path().to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Server {
                status: status.as_u16(),
                message: error_message(&body, status),
            });
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        Ok(envelope.data)
    }
}

impl StatusProvider for ApiClient {
    async fn get_snapshot(&self, selector: &TargetSelector) -> Result<Vec<ItemStatus>, FetchError> {
        match selector {
            TargetSelector::All { status } => {
                let url = self.endpoint(&["v1", "probes"])?;
                let query: Vec<(&str, String)> = status
                    .iter()
                    .map(|s| ("status", s.as_str().to_string()))
                    .collect();
                self.get(url, &query).await
            }
            TargetSelector::Item(id) => {
                let url = self.endpoint(&["v1", "probes", &id.to_string()])?;
                let item: ItemStatus = self.get(url, &[]).await?;
                Ok(vec![item])
            }
        }
    }

    async fn get_events_since(
        &self,
        item: StableId,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Event>, FetchError> {
        let url = self.endpoint(&["v1", "probes", &item.to_string(), "results"])?;
        self.get(url, &events_query(since, limit)).await
    }
}

impl ItemDirectory for ApiClient {
    async fn search_items(&self, query: &str) -> Result<Vec<ItemSummary>, FetchError> {
        let url = self.endpoint(&["v1", "probes"])?;
        self.get(url, &[("search", query.to_string())]).await
    }
}

/// Query parameters for an events request. `since` keeps full nanosecond
/// precision so the watermark increment survives the trip.
fn events_query(since: DateTime<Utc>, limit: u32) -> Vec<(&'static str, String)> {
    vec![
        ("since", since.to_rfc3339_opts(SecondsFormat::Nanos, true)),
        ("limit", limit.to_string()),
    ]
}

fn transport_error(err: reqwest::Error) -> FetchError {
    if err.is_decode() {
        FetchError::Decode(err.to_string())
    } else {
        FetchError::Transport(err.to_string())
    }
}

/// Extracts a human-readable message from an error response body.
fn error_message(body: &str, status: StatusCode) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(msg) = parsed.error.or(parsed.message) {
            return msg;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}
