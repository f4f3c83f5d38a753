use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Http,
    Grpc,
    Sse,
    WebSocket,
}

/// A multimap of header names to values, preserving insertion/declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderMultiMap(pub Vec<(String, String)>);

impl HeaderMultiMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.0
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has(&self, name: &str) -> bool {
        self.0.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    pub fn remove(&mut self, name: &str) {
        self.0.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.remove(&name);
        self.push(name, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, String)> {
        self.0.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub kind: ResponseKind,
    pub status_code: u32,
    pub status_text: String,
    pub headers: HeaderMultiMap,
    pub trailers: HeaderMultiMap,
    pub content_type: Option<String>,
    pub wire_content_type: Option<String>,
    pub body: Vec<u8>,
    pub wire: Option<Vec<u8>>,
    pub duration: Duration,
    pub url: String,
    pub error: Option<String>,
}

impl Response {
    pub fn is_binary(&self) -> bool {
        crate::sniff::looks_binary(&self.body)
    }
}

/// Header names redacted by default unless `@log-sensitive-headers` is set.
pub const SENSITIVE_HEADER_PREFIXES: [&str; 1] = ["secret"];
pub const SENSITIVE_HEADER_NAMES: [&str; 5] = [
    "authorization",
    "cookie",
    "set-cookie",
    "proxy-authorization",
    "x-api-key",
];

pub fn is_sensitive_header(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SENSITIVE_HEADER_NAMES.contains(&lower.as_str())
        || SENSITIVE_HEADER_PREFIXES.iter().any(|p| lower.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_multimap_is_case_insensitive_and_order_preserving() {
        let mut h = HeaderMultiMap::new();
        h.push("X-A", "1");
        h.push("x-a", "2");
        assert_eq!(h.get_all("X-A").collect::<Vec<_>>(), vec!["1", "2"]);
        h.set("X-A", "3");
        assert_eq!(h.get_all("x-a").collect::<Vec<_>>(), vec!["3"]);
    }

    #[test]
    fn sensitive_header_detection() {
        assert!(is_sensitive_header("Authorization"));
        assert!(is_sensitive_header("X-Api-Key"));
        assert!(is_sensitive_header("Secret-Token"));
        assert!(!is_sensitive_header("Content-Type"));
    }
}
