//! HTTP status source.
//!
//! Fetches fleet status and traffic history from the panel backend's REST
//! API:
//!
//! - `GET {endpoint}/status` → [`StatusSnapshot`]
//! - `GET {endpoint}/usage/stats?hours={n}` → [`TrafficHistory`]
//!
//! The wire schema is the backend's contract; this source only decodes it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use super::{SourceError, StatusSource};
use crate::data::{StatusSnapshot, TrafficHistory};

/// A status source backed by the panel's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    endpoint: String,
    token: Option<String>,
    description: String,
}

impl HttpSource {
    /// Create a new builder for configuring the source.
    pub fn builder() -> HttpSourceBuilder {
        HttpSourceBuilder::default()
    }

    fn status_url(&self) -> String {
        format!("{}/status", self.endpoint)
    }

    fn traffic_url(&self, hours: u32) -> String {
        format!("{}/usage/stats?hours={}", self.endpoint, hours)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SourceError> {
        let mut request = self.client.get(url);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(SourceError::Http(response.status().as_u16()));
        }

        response.json().await.map_err(|e| SourceError::Parse(e.to_string()))
    }
}

#[async_trait]
impl StatusSource for HttpSource {
    async fn fetch_status(&self) -> Result<StatusSnapshot, SourceError> {
        self.get_json(&self.status_url()).await
    }

    async fn fetch_traffic(&self, hours: u32) -> Result<TrafficHistory, SourceError> {
        self.get_json(&self.traffic_url(hours)).await
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for [`HttpSource`].
#[derive(Debug, Default)]
pub struct HttpSourceBuilder {
    endpoint: Option<String>,
    token: Option<String>,
    timeout: Option<Duration>,
}

impl HttpSourceBuilder {
    /// Set the backend endpoint (e.g., "http://localhost:8080/api").
    ///
    /// A trailing slash is stripped so path concatenation stays uniform.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        self.endpoint = Some(endpoint.trim_end_matches('/').to_string());
        self
    }

    /// Set a bearer token attached to every request.
    ///
    /// The token is passed through untouched; obtaining and refreshing it
    /// is outside this core.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the per-request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the source.
    pub fn build(self) -> HttpSource {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        let endpoint = self.endpoint.unwrap_or_else(|| "http://localhost:8080".to_string());
        let description = format!("http: {}", endpoint);

        HttpSource {
            client,
            endpoint,
            token: self.token,
            description,
        }
    }
}
