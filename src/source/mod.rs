//! Backend data sources for the dashboard core.
//!
//! This module provides a trait-based abstraction over the backend that
//! serves fleet status and traffic history. The production implementation
//! is [`HttpSource`]; tests substitute scripted implementations.

mod http;

pub use http::{HttpSource, HttpSourceBuilder};

use async_trait::async_trait;
use thiserror::Error;

use crate::data::{StatusSnapshot, TrafficHistory};

/// Errors that can occur while fetching from a status source.
///
/// All variants are recoverable: the poll loop logs them, keeps the last
/// known-good snapshot, and retries on the next tick.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for a response.
    #[error("request timed out")]
    Timeout,

    /// Backend returned a non-success status code.
    #[error("backend returned status {0}")]
    Http(u16),

    /// Failed to decode the response body.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// Payload decoded but violates the data-model invariants.
    #[error("payload violates invariants: {0}")]
    Invalid(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout
        } else if err.is_connect() {
            SourceError::Connection(err.to_string())
        } else {
            SourceError::Parse(err.to_string())
        }
    }
}

/// Trait for fetching fleet status and traffic history from a backend.
///
/// The two retrievals are independent: the poller issues them concurrently
/// each cycle and a failure in one must not block the other.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch the instantaneous status snapshot.
    async fn fetch_status(&self) -> Result<StatusSnapshot, SourceError>;

    /// Fetch the traffic history for the given lookback window in hours.
    async fn fetch_traffic(&self, hours: u32) -> Result<TrafficHistory, SourceError>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;
}
