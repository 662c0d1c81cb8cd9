//! Proxy exhaustion detection.
//!
//! When the transparent proxy cannot route an attempt through any proxy it
//! answers HTTP 557 with the `no_proxy` error id; through a CONNECT tunnel
//! the same marker surfaces in the transport error message. Either means the
//! last snapshot overstated the pool, so it is invalidated.

use std::sync::Arc;

use crate::health::snapshot::SnapshotCache;
use crate::observability::metrics;
use crate::pipeline::Response;

/// Status the transparent proxy uses for its own errors.
pub const EXHAUSTED_STATUS: u16 = 557;

/// Error id sent when no proxy could be used.
pub const EXHAUSTED_MARKER: &str = "no_proxy";

/// Invalidates the pool snapshot on proxy exhaustion signals.
#[derive(Debug, Clone)]
pub struct ExhaustionHook {
    cache: Arc<SnapshotCache>,
}

impl ExhaustionHook {
    pub fn new(cache: Arc<SnapshotCache>) -> Self {
        Self { cache }
    }

    /// Inspect a response. Returns true if it signalled exhaustion.
    pub fn on_response(&self, response: &Response) -> bool {
        if !is_exhausted_response(response) {
            return false;
        }
        tracing::warn!(url = %response.url, "No proxy available for request, invalidating pool snapshot");
        metrics::record_exhaustion("response");
        self.cache.invalidate();
        true
    }

    /// Inspect a transport failure. Returns true if it signalled exhaustion.
    pub fn on_transport_error(&self, error: &(dyn std::error::Error + 'static)) -> bool {
        if !is_exhausted_message(&error_chain_text(error)) {
            return false;
        }
        tracing::warn!(error = %error, "Tunnel failed for lack of proxy, invalidating pool snapshot");
        metrics::record_exhaustion("transport");
        self.cache.invalidate();
        true
    }
}

fn is_exhausted_response(response: &Response) -> bool {
    if response.status != EXHAUSTED_STATUS {
        return false;
    }
    let in_headers = response
        .headers
        .values()
        .filter_map(|v| v.to_str().ok())
        .any(is_exhausted_message);
    in_headers || is_exhausted_message(&response.body_text())
}

fn is_exhausted_message(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    lower.contains(EXHAUSTED_MARKER) || lower.contains("no proxy")
}

fn error_chain_text(error: &(dyn std::error::Error + 'static)) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        text.push_str(": ");
        text.push_str(&inner.to_string());
        source = inner.source();
    }
    text
}
