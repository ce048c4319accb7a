//! # Prometheus Metrics
//!
//! Exposes operational metrics for the token host. Scraped by Prometheus
//! at the `/metrics` HTTP endpoint on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder,
};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
///
/// Clone-friendly (prometheus handles are `Arc`s internally) so it can be
/// shared across request handlers and the block loop.
#[derive(Clone)]
pub struct NodeMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Total number of blocks the loop has produced.
    pub blocks_produced_total: IntCounter,
    /// Total number of successful transfers (direct and delegated).
    pub transfers_total: IntCounter,
    /// Total number of permits accepted.
    pub permits_accepted_total: IntCounter,
    /// Total number of permits rejected, for any reason.
    pub permits_rejected_total: IntCounter,
    /// Total number of ledger calls rejected (permits included).
    pub rejected_calls_total: IntCounter,
    /// Current block number.
    pub block_height: IntGauge,
    /// Histogram of time spent holding the ledger write lock, in seconds.
    pub call_latency_seconds: Histogram,
}

fn register<M>(registry: &Registry, metric: M) -> Result<M, prometheus::Error>
where
    M: prometheus::core::Collector + Clone + 'static,
{
    registry.register(Box::new(metric.clone()))?;
    Ok(metric)
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("aset".into()), None)?;

        let blocks_produced_total = register(
            &registry,
            IntCounter::new("blocks_produced_total", "Total number of blocks produced")?,
        )?;
        let transfers_total = register(
            &registry,
            IntCounter::new("transfers_total", "Total number of successful transfers")?,
        )?;
        let permits_accepted_total = register(
            &registry,
            IntCounter::new("permits_accepted_total", "Total number of permits accepted")?,
        )?;
        let permits_rejected_total = register(
            &registry,
            IntCounter::new("permits_rejected_total", "Total number of permits rejected")?,
        )?;
        let rejected_calls_total = register(
            &registry,
            IntCounter::new(
                "rejected_calls_total",
                "Total number of ledger calls rejected with an error",
            )?,
        )?;
        let block_height = register(
            &registry,
            IntGauge::new("block_height", "Number of the current block")?,
        )?;
        let call_latency_seconds = register(
            &registry,
            Histogram::with_opts(
                HistogramOpts::new(
                    "call_latency_seconds",
                    "Time spent applying a ledger call in seconds",
                )
                .buckets(vec![
                    0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05, 0.1,
                ]),
            )?,
        )?;

        Ok(Self {
            registry,
            blocks_produced_total,
            transfers_total,
            permits_accepted_total,
            permits_rejected_total,
            rejected_calls_total,
            block_height,
            call_latency_seconds,
        })
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
///
/// Returns HTTP 500 if encoding fails.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_prefixed_metrics() {
        let metrics = NodeMetrics::new().unwrap();
        metrics.transfers_total.inc();
        metrics.block_height.set(42);

        let text = metrics.encode().unwrap();
        assert!(text.contains("aset_transfers_total 1"));
        assert!(text.contains("aset_block_height 42"));
        assert!(text.contains("aset_permits_rejected_total 0"));
    }
}
