//! Prometheus metrics for the bootstrap subsystem.
//!
//! [`BootstrapMetrics`] owns a dedicated [`Registry`] so an embedding node
//! can expose it from its own metrics endpoint.

use prometheus::{
    register_int_counter_with_registry, register_int_gauge_with_registry, IntCounter, IntGauge,
    Opts, Registry,
};

pub struct BootstrapMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Outbound sessions started.
    pub sessions_started: IntCounter,
    /// Outbound sessions that completed successfully.
    pub sessions_completed: IntCounter,
    /// Outbound sessions that ended with an error.
    pub sessions_failed: IntCounter,
    /// Frontier records received from peers.
    pub frontiers_received: IntCounter,
    /// Frontier records served to peers.
    pub frontiers_sent: IntCounter,
    /// Blocks received through bulk pulls.
    pub blocks_pulled: IntCounter,
    /// Blocks sent through bulk pushes.
    pub blocks_pushed: IntCounter,
    /// Blocks served to peers' bulk pulls.
    pub pull_blocks_served: IntCounter,
    /// Blocks received from peers' bulk pushes.
    pub push_blocks_received: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// 1 while an outbound session is running.
    pub in_progress: IntGauge,
}

impl BootstrapMetrics {
    /// Create a fresh set of metrics registered under a new [`Registry`].
    pub fn new() -> Self {
        let registry = Registry::new();

        let sessions_started = register_int_counter_with_registry!(
            Opts::new(
                "weave_bootstrap_sessions_started_total",
                "Outbound bootstrap sessions started"
            ),
            registry
        )
        .expect("failed to register sessions_started counter");

        let sessions_completed = register_int_counter_with_registry!(
            Opts::new(
                "weave_bootstrap_sessions_completed_total",
                "Outbound bootstrap sessions completed successfully"
            ),
            registry
        )
        .expect("failed to register sessions_completed counter");

        let sessions_failed = register_int_counter_with_registry!(
            Opts::new(
                "weave_bootstrap_sessions_failed_total",
                "Outbound bootstrap sessions that errored"
            ),
            registry
        )
        .expect("failed to register sessions_failed counter");

        let frontiers_received = register_int_counter_with_registry!(
            Opts::new(
                "weave_bootstrap_frontiers_received_total",
                "Frontier records received from peers"
            ),
            registry
        )
        .expect("failed to register frontiers_received counter");

        let frontiers_sent = register_int_counter_with_registry!(
            Opts::new(
                "weave_bootstrap_frontiers_sent_total",
                "Frontier records served to peers"
            ),
            registry
        )
        .expect("failed to register frontiers_sent counter");

        let blocks_pulled = register_int_counter_with_registry!(
            Opts::new(
                "weave_bootstrap_blocks_pulled_total",
                "Blocks received through bulk pulls"
            ),
            registry
        )
        .expect("failed to register blocks_pulled counter");

        let blocks_pushed = register_int_counter_with_registry!(
            Opts::new(
                "weave_bootstrap_blocks_pushed_total",
                "Blocks sent through bulk pushes"
            ),
            registry
        )
        .expect("failed to register blocks_pushed counter");

        let pull_blocks_served = register_int_counter_with_registry!(
            Opts::new(
                "weave_bootstrap_pull_blocks_served_total",
                "Blocks served to peers' bulk pulls"
            ),
            registry
        )
        .expect("failed to register pull_blocks_served counter");

        let push_blocks_received = register_int_counter_with_registry!(
            Opts::new(
                "weave_bootstrap_push_blocks_received_total",
                "Blocks received from peers' bulk pushes"
            ),
            registry
        )
        .expect("failed to register push_blocks_received counter");

        let in_progress = register_int_gauge_with_registry!(
            Opts::new(
                "weave_bootstrap_in_progress",
                "1 while an outbound bootstrap session is running"
            ),
            registry
        )
        .expect("failed to register in_progress gauge");

        Self {
            registry,
            sessions_started,
            sessions_completed,
            sessions_failed,
            frontiers_received,
            frontiers_sent,
            blocks_pulled,
            blocks_pushed,
            pull_blocks_served,
            push_blocks_received,
            in_progress,
        }
    }
}

impl Default for BootstrapMetrics {
    fn default() -> Self {
        Self::new()
    }
}
