// src/metrics.rs
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;

use crate::config::MetricsSettings;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("collector_cycles_total", "Collection cycles executed.");
        describe_counter!(
            "listings_parsed_total",
            "Listings kept by a source's relevance filter."
        );
        describe_counter!(
            "listings_new_total",
            "Listings that passed deduplication."
        );
        describe_counter!(
            "source_errors_total",
            "Source fetch/parse failures (source disabled afterwards)."
        );
        describe_counter!("notifications_sent_total", "Notifications delivered.");
        describe_counter!(
            "notifications_failed_total",
            "Notifications the sink failed to deliver."
        );
        describe_counter!(
            "control_commands_total",
            "Messages seen on the control channel."
        );
        describe_gauge!("collector_paused", "1 while collection is paused.");
        describe_histogram!("source_fetch_ms", "Source fetch time in milliseconds.");
    });
}

/// Install the Prometheus exporter when `[metrics] listen` is set.
/// Must run inside the tokio runtime.
pub fn init(settings: &MetricsSettings) -> anyhow::Result<()> {
    if let Some(addr) = settings.listen {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .map_err(|e| anyhow::anyhow!("prometheus exporter on {addr}: {e}"))?;
        tracing::info!(%addr, "metrics exporter listening");
    }
    ensure_metrics_described();
    Ok(())
}
