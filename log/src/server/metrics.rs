//! Prometheus metrics for the log server.

use axum::http::Method;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

/// Labels for HTTP request metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct HttpLabelsWithStatus {
    pub method: HttpMethod,
    pub endpoint: String,
    pub status: u16,
}

/// HTTP method label value.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum HttpMethod {
    Get,
    Post,
    Other,
}

impl From<&Method> for HttpMethod {
    fn from(method: &Method) -> Self {
        match *method {
            Method::GET => HttpMethod::Get,
            Method::POST => HttpMethod::Post,
            _ => HttpMethod::Other,
        }
    }
}

/// Container for all Prometheus metrics.
pub struct Metrics {
    registry: Registry,

    /// Counter of messages appended.
    pub log_send_total: Counter,

    /// Counter of messages returned by polls.
    pub log_poll_messages_total: Counter,

    /// Counter of per-key offset commits.
    pub log_commit_offsets_total: Counter,

    /// Counter of HTTP requests.
    pub http_requests_total: Family<HttpLabelsWithStatus, Counter>,

    /// Gauge of currently in-flight requests.
    pub http_requests_in_flight: Gauge,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics registry with all metrics registered.
    ///
    /// Counters are registered without their `_total` suffix; the encoder
    /// appends it to each sample.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let log_send_total = Counter::default();
        registry.register(
            "log_send",
            "Total number of messages appended to the log",
            log_send_total.clone(),
        );

        let log_poll_messages_total = Counter::default();
        registry.register(
            "log_poll_messages",
            "Total number of messages returned by polls",
            log_poll_messages_total.clone(),
        );

        let log_commit_offsets_total = Counter::default();
        registry.register(
            "log_commit_offsets",
            "Total number of per-key offset commits",
            log_commit_offsets_total.clone(),
        );

        let http_requests_total = Family::<HttpLabelsWithStatus, Counter>::default();
        registry.register(
            "http_requests",
            "Total number of HTTP requests",
            http_requests_total.clone(),
        );

        let http_requests_in_flight = Gauge::default();
        registry.register(
            "http_requests_in_flight",
            "Number of HTTP requests currently being processed",
            http_requests_in_flight.clone(),
        );

        Self {
            registry,
            log_send_total,
            log_poll_messages_total,
            log_commit_offsets_total,
            http_requests_total,
            http_requests_in_flight,
        }
    }

    /// Encode all metrics to Prometheus text format.
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        if let Err(err) = prometheus_client::encoding::text::encode(&mut buffer, &self.registry) {
            tracing::error!(error = %err, "failed to encode metrics");
        }
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_create_default_metrics() {
        // given/when
        let metrics = Metrics::new();

        // then
        let encoded = metrics.encode();
        assert!(encoded.contains("# HELP log_send "));
        assert!(encoded.contains("# HELP log_poll_messages "));
        assert!(encoded.contains("# HELP log_commit_offsets "));
        assert!(encoded.contains("# HELP http_requests "));
        assert!(encoded.contains("# HELP http_requests_in_flight "));
    }

    #[test]
    fn should_encode_counter_values() {
        // given
        let metrics = Metrics::new();

        // when
        metrics.log_send_total.inc_by(3);

        // then
        assert!(metrics.encode().contains("log_send_total 3"));
    }

    #[test]
    fn should_convert_http_method_to_label() {
        // given
        let method = Method::POST;

        // when
        let label = HttpMethod::from(&method);

        // then
        assert!(matches!(label, HttpMethod::Post));
    }
}
