//! Poll scheduling and the per-cycle fetch join.
//!
//! A [`Poller`] owns the repeating-timer lifecycle of the dashboard: it
//! fires a fetch cycle immediately on start and then on a fixed cadence.
//! Each cycle retrieves the instantaneous status and the traffic history
//! concurrently, joins them, and - only if both succeeded and validate -
//! atomically replaces the state in the [`SnapshotStore`].
//!
//! Cycles are spawned, not awaited: a slow backend never delays the
//! cadence, so two joins may be in flight at once. The store's sequence
//! guard keeps that safe by rejecting a cycle that resolves after a newer
//! one has already published.
//!
//! Dashboard lifecycle: `MOUNTING → LOADING (ready=false) → LIVE
//! (ready=true) → UNMOUNTED (stopped)`. LOADING is never skipped on a
//! fresh mount and UNMOUNTED is terminal.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::data::{DashboardState, StatusSnapshot, TrafficHistory};
use crate::source::{SourceError, StatusSource};
use crate::store::SnapshotStore;

/// Default refresh cadence.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(5000);

/// Default traffic lookback window requested each cycle, in hours.
pub const DEFAULT_HISTORY_HOURS: u32 = 24;

/// Configuration for the poll schedule.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Time between cycle starts.
    pub interval: Duration,
    /// Lookback window passed to the traffic fetch.
    pub history_hours: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            history_hours: DEFAULT_HISTORY_HOURS,
        }
    }
}

/// The polling scheduler plus fetch joiner.
pub struct Poller {
    source: Arc<dyn StatusSource>,
    store: SnapshotStore,
    config: PollerConfig,
}

impl Poller {
    /// Create a poller with the default 5-second cadence and 24-hour
    /// traffic window.
    pub fn new(source: Arc<dyn StatusSource>, store: SnapshotStore) -> Self {
        Self::with_config(source, store, PollerConfig::default())
    }

    /// Create a poller with a custom schedule.
    pub fn with_config(
        source: Arc<dyn StatusSource>,
        store: SnapshotStore,
        config: PollerConfig,
    ) -> Self {
        Self { source, store, config }
    }

    /// Start the schedule.
    ///
    /// The first cycle fires immediately, then one cycle per interval.
    /// Returns a handle whose [`PollerHandle::stop`] cancels the schedule;
    /// dropping the handle stops it as well.
    pub fn start(self) -> PollerHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let Poller { source, store, config } = self;
        let cycle_stop = stop_rx.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.interval);
            let mut stop_rx = stop_rx;
            let mut sequence: u64 = 0;

            loop {
                tokio::select! {
                    biased;

                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        sequence += 1;
                        let source = source.clone();
                        let store = store.clone();
                        let stop = cycle_stop.clone();
                        let hours = config.history_hours;
                        tokio::spawn(async move {
                            run_cycle(source, store, hours, sequence, stop).await;
                        });
                    }
                }
            }
        });

        PollerHandle { stop_tx }
    }
}

/// Handle controlling a running poll schedule.
pub struct PollerHandle {
    stop_tx: watch::Sender<bool>,
}

impl PollerHandle {
    /// Stop the schedule.
    ///
    /// Idempotent and safe to call any number of times. No cycle starts
    /// after this returns; a cycle already in flight is allowed to finish
    /// its retrievals but its result is discarded, never applied to the
    /// store.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Whether stop has been signalled.
    pub fn stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }
}

/// One poll cycle: concurrent dual fetch, join, guarded publish.
async fn run_cycle(
    source: Arc<dyn StatusSource>,
    store: SnapshotStore,
    hours: u32,
    sequence: u64,
    stop: watch::Receiver<bool>,
) {
    // Fork-join: both retrievals run concurrently and fail independently.
    let (status, traffic) = tokio::join!(source.fetch_status(), source.fetch_traffic(hours));

    match join_results(status, traffic) {
        Ok(state) => {
            if *stop.borrow() {
                debug!(sequence, "discarding join that completed after stop");
                return;
            }
            if !store.replace(sequence, state) {
                debug!(sequence, "discarding stale join overtaken by a newer cycle");
            }
        }
        // Failures are observability-only: the store keeps the last
        // known-good snapshot and the next tick retries.
        Err(err) => {
            warn!(sequence, error = %err, "poll cycle failed, keeping previous snapshot");
        }
    }
}

/// Join policy: both halves must succeed and validate, otherwise nothing
/// is published.
fn join_results(
    status: Result<StatusSnapshot, SourceError>,
    traffic: Result<TrafficHistory, SourceError>,
) -> Result<DashboardState, SourceError> {
    let status = status?;
    let traffic = traffic?;
    status.validate().map_err(SourceError::Invalid)?;
    traffic.validate().map_err(SourceError::Invalid)?;
    Ok(DashboardState::live(status, traffic, now_ms()))
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::data::{FleetCounts, SamplePoint, SystemStats, TrafficTotals};

    fn sample_status() -> StatusSnapshot {
        StatusSnapshot {
            system: SystemStats {
                cpu_percent: 12.3,
                memory_percent: 40.0,
                memory_total_gb: 16.0,
                memory_used_gb: 6.4,
            },
            tunnels: FleetCounts { total: 3, active: 2 },
            nodes: FleetCounts { total: 5, active: 5 },
            traffic: TrafficTotals {
                total_mb: 512.0,
                total_bytes: 536_870_912,
                current_rate_mb_per_hour: 10.5,
            },
        }
    }

    fn sample_traffic() -> TrafficHistory {
        TrafficHistory {
            total_mb: 512.0,
            total_bytes: 536_870_912,
            current_rate_mb_per_hour: 10.5,
            samples: vec![
                SamplePoint { timestamp_ms: 1000, bytes: 104_857_600, mb: 100.0 },
                SamplePoint { timestamp_ms: 2000, bytes: 209_715_200, mb: 200.0 },
                SamplePoint { timestamp_ms: 3000, bytes: 536_870_912, mb: 512.0 },
            ],
        }
    }

    type StatusStep = (u64, Result<StatusSnapshot, SourceError>);
    type TrafficStep = (u64, Result<TrafficHistory, SourceError>);

    /// Test source that replays scripted (delay_ms, result) steps, one per
    /// call, and fails with a connection error once the script runs out.
    struct ScriptedSource {
        status: Mutex<VecDeque<StatusStep>>,
        traffic: Mutex<VecDeque<TrafficStep>>,
        status_calls: AtomicUsize,
        last_hours: AtomicU32,
    }

    impl ScriptedSource {
        fn new(status: Vec<StatusStep>, traffic: Vec<TrafficStep>) -> Arc<Self> {
            Arc::new(Self {
                status: Mutex::new(status.into()),
                traffic: Mutex::new(traffic.into()),
                status_calls: AtomicUsize::new(0),
                last_hours: AtomicU32::new(0),
            })
        }

        fn ok_once() -> Arc<Self> {
            Self::new(
                vec![(0, Ok(sample_status()))],
                vec![(0, Ok(sample_traffic()))],
            )
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn fetch_status(&self) -> Result<StatusSnapshot, SourceError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            let step = self.status.lock().pop_front();
            let (delay_ms, result) = match step {
                Some(step) => step,
                None => (0, Err(SourceError::Connection("script exhausted".into()))),
            };
            if delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            result
        }

        async fn fetch_traffic(&self, hours: u32) -> Result<TrafficHistory, SourceError> {
            self.last_hours.store(hours, Ordering::SeqCst);
            let step = self.traffic.lock().pop_front();
            let (delay_ms, result) = match step {
                Some(step) => step,
                None => (0, Err(SourceError::Connection("script exhausted".into()))),
            };
            if delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            result
        }

        fn description(&self) -> &str {
            "scripted"
        }
    }

    #[test]
    fn default_config() {
        let config = PollerConfig::default();
        assert_eq!(config.interval, Duration::from_millis(5000));
        assert_eq!(config.history_hours, 24);
    }

    #[tokio::test(start_paused = true)]
    async fn first_successful_join_goes_live() {
        let source = ScriptedSource::ok_once();
        let store = SnapshotStore::new();
        let handle = Poller::new(source.clone(), store.clone()).start();

        // Mounting: before the first join lands the store is loading.
        tokio::time::sleep(Duration::from_millis(50)).await;

        let state = store.current();
        assert!(state.ready);
        assert_eq!(state.status, Some(sample_status()));
        assert_eq!(state.traffic, Some(sample_traffic()));
        assert!(state.last_updated_ms.is_some());
        assert_eq!(store.sequence(), 1);

        // Default lookback window was requested.
        assert_eq!(source.last_hours.load(Ordering::SeqCst), 24);

        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn custom_history_window_is_passed_through() {
        let source = ScriptedSource::ok_once();
        let store = SnapshotStore::new();
        let config = PollerConfig {
            interval: Duration::from_millis(5000),
            history_hours: 6,
        };
        let handle = Poller::with_config(source.clone(), store.clone(), config).start();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(source.last_hours.load(Ordering::SeqCst), 6);

        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn partial_failure_keeps_loading_until_both_succeed() {
        // First cycle: status ok, traffic fails. Second cycle: both ok.
        let source = ScriptedSource::new(
            vec![(0, Ok(sample_status())), (0, Ok(sample_status()))],
            vec![
                (0, Err(SourceError::Http(502))),
                (0, Ok(sample_traffic())),
            ],
        );
        let store = SnapshotStore::new();
        let handle = Poller::new(source, store.clone()).start();

        tokio::time::sleep(Duration::from_millis(50)).await;
        let state = store.current();
        assert!(!state.ready, "no partial snapshot may be published");
        assert!(state.status.is_none());
        assert!(state.traffic.is_none());

        tokio::time::sleep(Duration::from_millis(5000)).await;
        let state = store.current();
        assert!(state.ready);
        assert_eq!(state.status, Some(sample_status()));

        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn failed_cycle_retains_last_good_snapshot() {
        let source = ScriptedSource::new(
            vec![
                (0, Ok(sample_status())),
                (0, Err(SourceError::Timeout)),
            ],
            vec![(0, Ok(sample_traffic())), (0, Ok(sample_traffic()))],
        );
        let store = SnapshotStore::new();
        let handle = Poller::new(source, store.clone()).start();

        tokio::time::sleep(Duration::from_millis(50)).await;
        let live = store.current();
        assert!(live.ready);

        // Second cycle fails; the store keeps showing cycle 1's data.
        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(store.current(), live);
        assert_eq!(store.sequence(), 1);

        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn invariant_violation_is_never_published() {
        let mut corrupt = sample_status();
        corrupt.tunnels.active = corrupt.tunnels.total + 1;

        let source = ScriptedSource::new(
            vec![(0, Ok(corrupt))],
            vec![(0, Ok(sample_traffic()))],
        );
        let store = SnapshotStore::new();
        let handle = Poller::new(source, store.clone()).start();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!store.current().ready);
        assert_eq!(store.sequence(), 0);

        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn late_join_after_stop_is_discarded() {
        // Retrievals take 200ms; stop lands while they are in flight.
        let source = ScriptedSource::new(
            vec![(200, Ok(sample_status()))],
            vec![(200, Ok(sample_traffic()))],
        );
        let store = SnapshotStore::new();
        let handle = Poller::new(source, store.clone()).start();

        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.stop();
        assert!(handle.stopped());

        // Let the delayed responses resolve; they must not be applied.
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(!store.current().ready);
        assert_eq!(store.sequence(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent_and_halts_ticks() {
        let source = ScriptedSource::ok_once();
        let store = SnapshotStore::new();
        let handle = Poller::new(source.clone(), store.clone()).start();

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.stop();
        handle.stop();
        handle.stop();

        let calls_at_stop = source.status_calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20_000)).await;
        assert_eq!(source.status_calls.load(Ordering::SeqCst), calls_at_stop);
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_order_cycle_cannot_overwrite_newer_data() {
        let mut old = sample_status();
        old.system.cpu_percent = 50.0;

        // Cycle 1 resolves at t=7000, after cycle 2 (t=5000) has published.
        let source = ScriptedSource::new(
            vec![(7000, Ok(old)), (0, Ok(sample_status()))],
            vec![(7000, Ok(sample_traffic())), (0, Ok(sample_traffic()))],
        );
        let store = SnapshotStore::new();
        let handle = Poller::new(source, store.clone()).start();

        tokio::time::sleep(Duration::from_millis(5500)).await;
        let status = store.current().status.expect("cycle 2 published");
        assert_eq!(status.system.cpu_percent, 12.3);
        assert_eq!(store.sequence(), 2);

        // Cycle 1 resolves now and must be rejected as stale.
        tokio::time::sleep(Duration::from_millis(2000)).await;
        let status = store.current().status.expect("still live");
        assert_eq!(status.system.cpu_percent, 12.3);
        assert_eq!(store.sequence(), 2);

        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn scheduler_keeps_ticking_through_failures() {
        // Empty script: every fetch fails.
        let source = ScriptedSource::new(Vec::new(), Vec::new());
        let store = SnapshotStore::new();
        let handle = Poller::new(source.clone(), store.clone()).start();

        // Ticks at 0, 5000, 10000, 15000.
        tokio::time::sleep(Duration::from_millis(16_000)).await;
        assert!(source.status_calls.load(Ordering::SeqCst) >= 4);
        assert!(!store.current().ready);

        handle.stop();
    }
}
