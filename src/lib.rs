//! # tunneldash
//!
//! The polling-and-reconciliation core of a live status dashboard for a
//! fleet of network nodes and tunnels.
//!
//! The crate periodically polls a backend for aggregate health and traffic
//! metrics, joins the two retrievals of each cycle into one consistent
//! snapshot, and hands the presentation layer a single atomically-replaced
//! view of the fleet. Rendering (cards, gauges, charts) is an external
//! consumer of [`SnapshotStore::current`] and is not part of this crate.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                         Poller                             │
//! │   every 5s: ┌──────────────┐   ┌───────────────────┐       │
//! │             │ fetch_status │   │ fetch_traffic(24h)│       │
//! │             └──────┬───────┘   └─────────┬─────────┘       │
//! │                    └───── join ──────────┘                 │
//! │                            │ both ok + valid               │
//! │                            ▼                               │
//! │                    SnapshotStore ───▶ presentation layer   │
//! └────────────────────────────────────────────────────────────┘
//!                             ▲
//!                   StatusSource (HttpSource | test doubles)
//! ```
//!
//! - **[`source`]**: Backend abstraction ([`StatusSource`] trait) with the
//!   HTTP implementation polling `GET /status` and
//!   `GET /usage/stats?hours={n}`
//! - **[`poller`]**: The repeating-timer lifecycle and the per-cycle
//!   fork-join with its publish policy
//! - **[`store`]**: The shared snapshot store with atomic whole-state
//!   replace and a sequence guard against out-of-order cycles
//! - **[`data`]**: Wire-shaped data model, invariant validation, and
//!   human-unit formatting
//!
//! ## Failure policy
//!
//! A cycle publishes only when both retrievals succeed and the payloads
//! honor the data-model invariants. Anything else is logged and the store
//! keeps the last known-good snapshot - stale data over blanked data. The
//! schedule never stops on failures; only [`PollerHandle::stop`] ends it.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use tunneldash::{HttpSource, Poller, SnapshotStore};
//!
//! # tokio_test::block_on(async {
//! let source = Arc::new(
//!     HttpSource::builder()
//!         .endpoint("http://panel.local:9000/api")
//!         .build(),
//! );
//! let store = SnapshotStore::new();
//!
//! let handle = Poller::new(source, store.clone()).start();
//!
//! // The presentation layer reads the store on its own schedule.
//! let state = store.current();
//! if state.ready {
//!     // render state.status / state.traffic
//! }
//!
//! // Dashboard teardown.
//! handle.stop();
//! # });
//! ```

pub mod data;
pub mod poller;
pub mod source;
pub mod store;

// Re-export main types for convenience
pub use data::{
    format_bytes, format_percent, format_traffic, format_traffic_rate, DashboardState,
    FleetCounts, SamplePoint, StatusSnapshot, SystemStats, TrafficHistory, TrafficTotals,
};
pub use poller::{Poller, PollerConfig, PollerHandle, DEFAULT_HISTORY_HOURS, DEFAULT_INTERVAL};
pub use source::{HttpSource, HttpSourceBuilder, SourceError, StatusSource};
pub use store::SnapshotStore;
