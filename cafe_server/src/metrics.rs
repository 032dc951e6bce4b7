//! Prometheus metrics for the tournament API.
//!
//! Counters are recorded through the `metrics` facade; they go nowhere until
//! [`init_metrics`] installs the exporter, so handlers can record
//! unconditionally.
//!
//! ```rust,no_run
//! use cafe_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//! metrics::registrations_total("waitlisted");
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter with a scrape endpoint on `addr`
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Count a request by method, route template and status
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record request duration in milliseconds
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Registration Metrics
// ============================================================================

/// Count a registration attempt; `outcome` is `admitted`, `waitlisted` or an error kind
pub fn registrations_total(outcome: &str) {
    metrics::counter!("registrations_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

pub fn unregistrations_total() {
    metrics::counter!("unregistrations_total").increment(1);
}

/// Count a waitlist promotion; `trigger` is `unregister` or `manual`
pub fn promotions_total(trigger: &str) {
    metrics::counter!("promotions_total",
        "trigger" => trigger.to_string()
    )
    .increment(1);
}

// ============================================================================
// Statistics Metrics
// ============================================================================

pub fn results_recorded_total(replaced: bool) {
    metrics::counter!("results_recorded_total",
        "replaced" => replaced.to_string()
    )
    .increment(1);
}

/// Count awarded badges by name
pub fn badges_awarded_total(badge: &str) {
    metrics::counter!("badges_awarded_total",
        "badge" => badge.to_string()
    )
    .increment(1);
}

/// Count failed badge evaluations
pub fn badge_failures_total() {
    metrics::counter!("badge_failures_total").increment(1);
}

// ============================================================================
// Sweep Metrics
// ============================================================================

/// Count tournaments moved by the status sweep
pub fn tournaments_swept_total(started: u64, completed: u64) {
    metrics::counter!("tournaments_swept_total", "to" => "ongoing").increment(started);
    metrics::counter!("tournaments_swept_total", "to" => "completed").increment(completed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_exporter() {
        http_requests_total("GET", "/api/tournaments", 200);
        http_request_duration_ms("GET", "/api/tournaments", 3.5);
        registrations_total("admitted");
        promotions_total("unregister");
        badges_awarded_total("Primo Passo");
        tournaments_swept_total(1, 0);
    }
}
