//! Responses handed back by the host pipeline.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::borrow::Cow;

use crate::pipeline::PROXYNAME_HEADER;

/// A fetched response: status, headers and raw body.
#[derive(Debug, Clone)]
pub struct Response {
    pub url: String,
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(url: impl Into<String>, status: u16) -> Self {
        Self {
            url: url.into(),
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Add a header. Invalid names or values are logged and skipped.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "Skipping invalid response header"),
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Name of the proxy that served this response, when non-empty.
    pub fn proxy_name(&self) -> Option<&str> {
        self.header(PROXYNAME_HEADER).filter(|v| !v.is_empty())
    }

    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
