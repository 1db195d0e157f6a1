//! Metrics collection.
//!
//! # Responsibilities
//! - Define client metrics (requests, latency, failovers, endpoint health)
//! - Record through the `metrics` facade; the embedding application picks
//!   the exporter
//!
//! # Metrics
//! - `dbwire_requests_total` (counter): completed exchanges by endpoint, status
//! - `dbwire_request_duration_seconds` (histogram): latency per endpoint
//! - `dbwire_failovers_total` (counter): transport failures that moved on
//! - `dbwire_endpoint_healthy` (gauge): 1=healthy, 0=unhealthy
//! - `dbwire_endpoints` (gauge): size of the current endpoint set

use std::time::Instant;

/// Record one completed exchange.
pub fn record_request(endpoint: &str, status: u16, start: Instant) {
    let endpoint = endpoint.to_string();
    ::metrics::counter!(
        "dbwire_requests_total",
        "endpoint" => endpoint.clone(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("dbwire_request_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}

/// Record a transport failure that caused the next endpoint to be tried.
pub fn record_failover(endpoint: &str) {
    ::metrics::counter!("dbwire_failovers_total", "endpoint" => endpoint.to_string()).increment(1);
}

pub fn record_endpoint_health(endpoint: &str, healthy: bool) {
    ::metrics::gauge!("dbwire_endpoint_healthy", "endpoint" => endpoint.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_endpoint_count(count: usize) {
    ::metrics::gauge!("dbwire_endpoints").set(count as f64);
}
