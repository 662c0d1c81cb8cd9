//! Sticky proxy affinity.
//!
//! # Responsibilities
//! - Read the proxy name from a response
//! - Stamp it on every request derived from that response
//!
//! # Design Decisions
//! - Only new requests are stamped; scraped items pass through untouched
//! - An existing token on a derived request is overwritten by the parent's
//! - No proxy name on the response means no change at all

use crate::pipeline::{Response, WorkItem};

/// Something a response callback produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// A follow-up request to crawl.
    Request(WorkItem),
    /// A terminal scraped record.
    Item(serde_json::Value),
}

/// Propagates the serving proxy of a response to its follow-up requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct StickyPropagator;

impl StickyPropagator {
    pub fn new() -> Self {
        Self
    }

    pub fn on_output(&self, response: &Response, outputs: Vec<Output>) -> Vec<Output> {
        let Some(token) = response.proxy_name() else {
            return outputs;
        };

        outputs
            .into_iter()
            .map(|output| match output {
                Output::Request(item) => Output::Request(item.with_affinity(token)),
                other => other,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PROXYNAME_HEADER;
    use serde_json::json;

    fn derived() -> Vec<Output> {
        vec![
            Output::Request(WorkItem::new("https://example.com/1")),
            Output::Request(WorkItem::new("https://example.com/2").with_affinity("old")),
            Output::Request(WorkItem::new("https://example.com/3")),
        ]
    }

    #[test]
    fn test_all_derived_requests_get_token() {
        let resp = Response::new("https://example.com", 200).with_header(PROXYNAME_HEADER, "p1");
        let outputs = StickyPropagator::new().on_output(&resp, derived());

        assert_eq!(outputs.len(), 3);
        for output in outputs {
            match output {
                Output::Request(item) => assert_eq!(item.affinity.as_deref(), Some("p1")),
                Output::Item(_) => panic!("unexpected item"),
            }
        }
    }

    #[test]
    fn test_no_token_is_identity() {
        let resp = Response::new("https://example.com", 200);
        let before = derived();
        let after = StickyPropagator::new().on_output(&resp, before.clone());
        assert_eq!(before, after);
    }

    #[test]
    fn test_items_pass_through() {
        let resp = Response::new("https://example.com", 200).with_header(PROXYNAME_HEADER, "p1");
        let record = json!({"title": "hello"});
        let outputs = StickyPropagator::new().on_output(
            &resp,
            vec![Output::Item(record.clone()), Output::Request(WorkItem::new("https://example.com/next"))],
        );

        assert_eq!(outputs[0], Output::Item(record));
        assert!(matches!(&outputs[1], Output::Request(item) if item.affinity.as_deref() == Some("p1")));
    }
}
