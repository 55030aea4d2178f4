//! Connect requests: the endpoint plus the decoration a session start needs.

use std::fmt::Write as _;

/// Everything needed to open one streaming connection.
///
/// The endpoint is kept separate from the query so that the socket pool can
/// key entries by target URL while each session carries its own parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    endpoint: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
}

impl ConnectRequest {
    /// Creates a request for the given endpoint (`ws://` or `wss://`).
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    /// Adds a query parameter (builder style).
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_query(key, value);
        self
    }

    /// Adds a header (builder style).
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Sets a query parameter, replacing any previous value for `key`.
    pub fn set_query(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.query.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.query.push((key, value)),
        }
    }

    /// Sets a header, replacing any previous value for `name`.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name, value)),
        }
    }

    /// The endpoint without query string. Used as the socket pool key.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Looks up a query parameter.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All query parameters in insertion order.
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// All headers in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// The full URL including the percent-encoded query string.
    pub fn url(&self) -> String {
        if self.query.is_empty() {
            return self.endpoint.clone();
        }
        let mut url = self.endpoint.clone();
        url.push(if self.endpoint.contains('?') { '&' } else { '?' });
        for (i, (key, value)) in self.query.iter().enumerate() {
            if i > 0 {
                url.push('&');
            }
            encode_component(&mut url, key);
            url.push('=');
            encode_component(&mut url, value);
        }
        url
    }
}

/// Percent-encodes everything outside the RFC 3986 unreserved set.
fn encode_component(out: &mut String, raw: &str) {
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
}
