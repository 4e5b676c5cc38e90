//! Telemetry for the radar engines.
//!
//! Engines emit through the `metrics` facade; without an installed recorder every
//! call is a no-op. `RadarMetrics::install` wires the Prometheus exporter for
//! applications that want a scrape endpoint.

use anyhow::{Context, Result};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub const MOMENTUM_TOTAL: &str = "radar_momentum_total";
pub const MOMENTUM_INSUFFICIENT_TOTAL: &str = "radar_momentum_insufficient_total";
pub const BREAKOUT_TOTAL: &str = "radar_breakout_total";
pub const COLLABORATOR_ERRORS_TOTAL: &str = "radar_collaborator_errors_total";
pub const SHORTLISTS_GENERATED_TOTAL: &str = "radar_shortlists_generated_total";
pub const SHORTLIST_SIZE: &str = "radar_shortlist_size";
pub const BATCH_CHUNKS_TOTAL: &str = "radar_batch_chunks_total";

/// One-time metrics registration (so series show up with help text).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(describe_all);
}

fn describe_all() {
    describe_counter!(MOMENTUM_TOTAL, "Momentum analyses computed, by direction.");
    describe_counter!(
        MOMENTUM_INSUFFICIENT_TOTAL,
        "Momentum requests with fewer than two snapshots."
    );
    describe_counter!(BREAKOUT_TOTAL, "Breakout probabilities computed.");
    describe_counter!(
        COLLABORATOR_ERRORS_TOTAL,
        "Store/adapter failures caught at the core boundary, by operation."
    );
    describe_counter!(
        SHORTLISTS_GENERATED_TOTAL,
        "Shortlists persisted, by generation mode."
    );
    describe_histogram!(SHORTLIST_SIZE, "Members per generated shortlist.");
    describe_counter!(BATCH_CHUNKS_TOTAL, "Batch chunks processed.");
}

pub(crate) fn collaborator_error(op: &'static str) {
    metrics::counter!(COLLABORATOR_ERRORS_TOTAL, "op" => op).increment(1);
}

pub struct RadarMetrics {
    pub handle: PrometheusHandle,
}

impl RadarMetrics {
    /// Install the Prometheus recorder process-wide. Fails if a recorder is already set.
    pub fn install() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        // Descriptions emitted before the recorder existed were dropped.
        describe_all();
        Ok(Self { handle })
    }

    /// Prometheus exposition text.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}
