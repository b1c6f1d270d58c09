//! Data models and unit formatting for the dashboard core.
//!
//! ## Submodules
//!
//! - [`snapshot`]: The wire-shaped data model ([`StatusSnapshot`],
//!   [`TrafficHistory`]) plus the reconciled [`DashboardState`] and the
//!   invariant checks that gate what the join may publish
//! - [`format`]: Pure unit-formatting helpers that turn raw counters into
//!   display strings ("512.3 MB", "10.5 MB/h")
//!
//! ## Data Flow
//!
//! ```text
//! GET /status          GET /usage/stats
//!      │                     │
//!      ▼                     ▼
//! StatusSnapshot       TrafficHistory
//!      │                     │
//!      └───── validate ──────┘
//!                │
//!                ▼
//!      DashboardState::live()
//! ```

pub mod format;
pub mod snapshot;

pub use format::{format_bytes, format_percent, format_traffic, format_traffic_rate};
pub use snapshot::{
    DashboardState, FleetCounts, SamplePoint, StatusSnapshot, SystemStats, TrafficHistory,
    TrafficTotals,
};
