//! Work items flowing through the crawl pipeline.

use reqwest::header::{HeaderMap, HeaderValue};
use tokio::time::Instant;
use uuid::Uuid;

use crate::pipeline::PROXYNAME_HEADER;

/// One unit of crawl work.
///
/// `retry_count` is only ever incremented by the blacklist detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub id: Uuid,
    pub url: String,
    /// Proxy the item must be routed through, if any.
    pub affinity: Option<String>,
    pub retry_count: u32,
    /// Earliest dispatch time.
    pub delay_until: Option<Instant>,
    /// Bypass duplicate suppression when re-queued.
    pub dont_filter: bool,
}

impl WorkItem {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            affinity: None,
            retry_count: 0,
            delay_until: None,
            dont_filter: false,
        }
    }

    pub fn with_affinity(mut self, token: impl Into<String>) -> Self {
        self.affinity = Some(token.into());
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// Whether the item may be dispatched at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.delay_until.map_or(true, |at| at <= now)
    }

    /// Headers the transparent proxy reads to pick the backing instance.
    pub fn routing_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.affinity {
            match HeaderValue::from_str(token) {
                Ok(value) => {
                    headers.insert(PROXYNAME_HEADER, value);
                }
                Err(_) => {
                    tracing::warn!(item = %self.id, token = %token, "Affinity token is not a valid header value");
                }
            }
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_item_defaults() {
        let item = WorkItem::new("https://example.com/a");
        assert_eq!(item.retry_count, 0);
        assert!(item.affinity.is_none());
        assert!(!item.dont_filter);
        assert!(item.is_due(Instant::now()));
        assert!(item.routing_headers().is_empty());
    }

    #[test]
    fn test_routing_headers_carry_affinity() {
        let item = WorkItem::new("https://example.com/a").with_affinity("proxy-7");
        let headers = item.routing_headers();
        assert_eq!(headers.get(PROXYNAME_HEADER).unwrap(), "proxy-7");
    }

    #[test]
    fn test_delay_until() {
        let now = Instant::now();
        let mut item = WorkItem::new("https://example.com/a");
        item.delay_until = Some(now + Duration::from_secs(5));
        assert!(!item.is_due(now));
        assert!(item.is_due(now + Duration::from_secs(5)));
    }
}
