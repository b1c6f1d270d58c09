//! Snapshot data model for the dashboard core.
//!
//! These types mirror the backend payload shapes for `GET /status` and
//! `GET /usage/stats`. The wire schema is a given external contract:
//! values arrive already computed (CPU percentages, megabyte totals) and
//! are only validated here against the display invariants before they are
//! allowed into the store.

use serde::{Deserialize, Serialize};

/// Host resource usage as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    /// CPU usage in percent, 0-100.
    pub cpu_percent: f64,
    /// Memory usage in percent, 0-100.
    pub memory_percent: f64,
    /// Total memory in gigabytes.
    pub memory_total_gb: f64,
    /// Used memory in gigabytes. Never exceeds `memory_total_gb`.
    pub memory_used_gb: f64,
}

/// Active/total counts for a fleet resource (tunnels or nodes).
///
/// Invariant: `active <= total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetCounts {
    pub total: u64,
    pub active: u64,
}

/// Aggregate traffic counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficTotals {
    pub total_mb: f64,
    pub total_bytes: u64,
    pub current_rate_mb_per_hour: f64,
}

/// Instantaneous fleet status - the shape of the `GET /status` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub system: SystemStats,
    pub tunnels: FleetCounts,
    pub nodes: FleetCounts,
    pub traffic: TrafficTotals,
}

/// One point of the traffic time series.
///
/// `mb` is derived from `bytes` upstream at capture time; the core treats
/// both as given and never re-derives one from the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    /// Unix timestamp in milliseconds when this sample was captured.
    pub timestamp_ms: u64,
    pub bytes: u64,
    pub mb: f64,
}

/// Traffic history for a lookback window - the shape of the
/// `GET /usage/stats` payload.
///
/// `samples` is chronologically ascending by `timestamp_ms` and may be
/// empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficHistory {
    pub total_mb: f64,
    pub total_bytes: u64,
    pub current_rate_mb_per_hour: f64,
    #[serde(default)]
    pub samples: Vec<SamplePoint>,
}

/// The single state consumed by the presentation layer.
///
/// `ready` becomes true only after the first successful join; until then
/// the dashboard is loading and neither half is populated. Each refresh
/// produces a whole new value that replaces the previous one atomically,
/// so a reader never observes status from one cycle paired with traffic
/// from another.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardState {
    pub status: Option<StatusSnapshot>,
    pub traffic: Option<TrafficHistory>,
    pub ready: bool,
    /// Unix timestamp in milliseconds of the cycle that produced this
    /// state. Absent while loading. Exposed so consumers (and tests) can
    /// detect staleness.
    pub last_updated_ms: Option<u64>,
}

impl DashboardState {
    /// The empty pre-first-join state.
    pub fn loading() -> Self {
        Self::default()
    }

    /// A fully-populated state from one successful join cycle.
    pub fn live(status: StatusSnapshot, traffic: TrafficHistory, updated_ms: u64) -> Self {
        Self {
            status: Some(status),
            traffic: Some(traffic),
            ready: true,
            last_updated_ms: Some(updated_ms),
        }
    }
}

fn check_percent(value: f64, field: &str) -> Result<(), String> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(format!("{} out of range: {}", field, value));
    }
    Ok(())
}

fn check_non_negative(value: f64, field: &str) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{} must be finite and non-negative: {}", field, value));
    }
    Ok(())
}

impl FleetCounts {
    fn validate(&self, what: &str) -> Result<(), String> {
        if self.active > self.total {
            return Err(format!(
                "{}: active ({}) exceeds total ({})",
                what, self.active, self.total
            ));
        }
        Ok(())
    }
}

impl TrafficTotals {
    fn validate(&self) -> Result<(), String> {
        check_non_negative(self.total_mb, "traffic.total_mb")?;
        check_non_negative(self.current_rate_mb_per_hour, "traffic.current_rate_mb_per_hour")
    }
}

impl StatusSnapshot {
    /// Check the data-model invariants.
    ///
    /// A payload that decodes but fails these checks is treated as a
    /// malformed response by the join: rejected, never published.
    pub fn validate(&self) -> Result<(), String> {
        check_percent(self.system.cpu_percent, "system.cpu_percent")?;
        check_percent(self.system.memory_percent, "system.memory_percent")?;
        check_non_negative(self.system.memory_total_gb, "system.memory_total_gb")?;
        check_non_negative(self.system.memory_used_gb, "system.memory_used_gb")?;
        if self.system.memory_used_gb > self.system.memory_total_gb {
            return Err(format!(
                "system: memory_used_gb ({}) exceeds memory_total_gb ({})",
                self.system.memory_used_gb, self.system.memory_total_gb
            ));
        }
        self.tunnels.validate("tunnels")?;
        self.nodes.validate("nodes")?;
        self.traffic.validate()
    }
}

impl TrafficHistory {
    /// Check the data-model invariants, including chronological ordering
    /// of the time series.
    pub fn validate(&self) -> Result<(), String> {
        check_non_negative(self.total_mb, "total_mb")?;
        check_non_negative(self.current_rate_mb_per_hour, "current_rate_mb_per_hour")?;
        for (i, sample) in self.samples.iter().enumerate() {
            check_non_negative(sample.mb, "sample.mb")?;
            if i > 0 && sample.timestamp_ms < self.samples[i - 1].timestamp_ms {
                return Err(format!(
                    "time series not chronological at index {}: {} < {}",
                    i,
                    sample.timestamp_ms,
                    self.samples[i - 1].timestamp_ms
                ));
            }
        }
        Ok(())
    }
}
