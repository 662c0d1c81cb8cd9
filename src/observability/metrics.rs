//! Metrics collection and exposition.
//!
//! # Metrics
//! - `spx_pool_proxies_usable` (gauge): usable proxies in the last snapshot
//! - `spx_pool_connectors_active` (gauge): active connectors in the last snapshot
//! - `spx_pool_refresh_total` (counter): snapshot refreshes by result
//! - `spx_gate_decisions_total` (counter): admitted/declined dispatches
//! - `spx_project_mode_changes_total` (counter): mode change requests by mode
//! - `spx_blacklist_events_total` (counter): blacklisted responses by status
//! - `spx_proxy_removals_total` (counter): removal calls issued
//! - `spx_retries_scheduled_total`, `spx_retries_abandoned_total`,
//!   `spx_retries_cancelled_total` (counters)
//! - `spx_pool_exhaustion_total` (counter): no-proxy signals by source
//!
//! Without an installed recorder every call is a no-op.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_snapshot(connectors_active: usize, proxies_usable: usize) {
    gauge!("spx_pool_connectors_active").set(connectors_active as f64);
    gauge!("spx_pool_proxies_usable").set(proxies_usable as f64);
}

pub fn record_refresh(ok: bool) {
    let result = if ok { "ok" } else { "error" };
    counter!("spx_pool_refresh_total", "result" => result).increment(1);
}

pub fn record_gate_decision(admitted: bool) {
    let decision = if admitted { "admitted" } else { "declined" };
    counter!("spx_gate_decisions_total", "decision" => decision).increment(1);
}

pub fn record_mode_change(mode: &'static str) {
    counter!("spx_project_mode_changes_total", "mode" => mode).increment(1);
}

pub fn record_blacklist(status: u16) {
    counter!("spx_blacklist_events_total", "status" => status.to_string()).increment(1);
}

pub fn record_proxy_removal() {
    counter!("spx_proxy_removals_total").increment(1);
}

pub fn record_retry_scheduled() {
    counter!("spx_retries_scheduled_total").increment(1);
}

pub fn record_retry_abandoned() {
    counter!("spx_retries_abandoned_total").increment(1);
}

pub fn record_retry_cancelled(count: usize) {
    counter!("spx_retries_cancelled_total").increment(count as u64);
}

pub fn record_exhaustion(source: &'static str) {
    counter!("spx_pool_exhaustion_total", "source" => source).increment(1);
}
