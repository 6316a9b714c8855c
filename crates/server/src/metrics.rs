//! Prometheus metrics
//!
//! Counters and histograms recorded at the handler layer; the exporter
//! snapshot is served from `GET /metrics`.

use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static PROMETHEUS: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder. Call once at startup; recording
/// before (or without) installation is a no-op.
pub fn init_metrics() {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = PROMETHEUS.set(handle);
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to install metrics recorder");
        }
    }
}

/// Render the current metric snapshot
pub async fn metrics_handler() -> String {
    PROMETHEUS.get().map(|h| h.render()).unwrap_or_default()
}

/// Count a finished conversational turn by outcome
pub fn record_turn(result: &str) {
    metrics::counter!("lingotutor_turns_total", "result" => result.to_string()).increment(1);
}

/// Count a practice chain run by chain name
pub fn record_chain_run(chain: &str) {
    metrics::counter!("lingotutor_chain_runs_total", "chain" => chain.to_string()).increment(1);
}

pub fn record_llm_latency(duration: Duration) {
    metrics::histogram!("lingotutor_llm_latency_seconds").record(duration.as_secs_f64());
}

pub fn record_speech_latency(duration: Duration) {
    metrics::histogram!("lingotutor_speech_latency_seconds").record(duration.as_secs_f64());
}

pub fn record_turn_latency(duration: Duration) {
    metrics::histogram!("lingotutor_turn_latency_seconds").record(duration.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        // No recorder installed in unit tests; none of these may panic.
        record_turn("reply");
        record_chain_run("questions");
        record_llm_latency(Duration::from_millis(120));
        record_speech_latency(Duration::from_millis(80));
        record_turn_latency(Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_handler_renders_empty_before_init() {
        assert_eq!(metrics_handler().await, "");
    }
}
