//! URL proxying for tile and metadata requests.

use std::fmt;

use crate::source::{PropertyValue, UrlRewriteFn};

/// Characters `encodeURIComponent` leaves as they are.
const UNRESERVED_MARKS: &[u8] = b"-_.!~*'()";

/// A proxy captured from the source's proxy property.
#[derive(Clone)]
pub enum Proxy {
    /// A caller-supplied rewrite function.
    Rewrite(UrlRewriteFn),
    /// A proxy endpoint taking the target URL as its query string.
    Default(DefaultProxy),
}

impl Proxy {
    /// Builds a proxy from a property value. Projections are not proxies.
    pub fn from_property(value: PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::UrlRewrite(rewrite) => Some(Proxy::Rewrite(rewrite)),
            PropertyValue::Text(endpoint) if !endpoint.is_empty() => {
                Some(Proxy::Default(DefaultProxy::new(endpoint)))
            }
            _ => None,
        }
    }

    /// The URL to fetch instead of `resource`.
    pub fn get_url(&self, resource: &str) -> String {
        match self {
            Proxy::Rewrite(rewrite) => rewrite(resource),
            Proxy::Default(proxy) => proxy.get_url(resource),
        }
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Proxy::Rewrite(_) => f.write_str("Rewrite(..)"),
            Proxy::Default(proxy) => f.debug_tuple("Default").field(proxy).finish(),
        }
    }
}

/// Proxies a resource as `{endpoint}?{percent-encoded resource}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultProxy {
    endpoint: String,
}

impl DefaultProxy {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn get_url(&self, resource: &str) -> String {
        format!("{}?{}", self.endpoint, encode_uri_component(resource))
    }
}

/// Percent-encodes everything except ASCII alphanumerics and `-_.!~*'()`.
fn encode_uri_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        if byte.is_ascii_alphanumeric() || UNRESERVED_MARKS.contains(&byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}
