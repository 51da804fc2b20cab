//! Resource identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The identity of a resource in the hypermedia graph.
///
/// A `Uri` is the canonical identity of a resource: two nodes with the
/// same `Uri` are the same resource. Uris are compared byte-for-byte;
/// no normalization is performed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uri(String);

impl Uri {
    /// Creates a new URI.
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// Returns the URI as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the URI, returning the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Uri {
    fn from(uri: &str) -> Self {
        Self(uri.to_owned())
    }
}

impl From<String> for Uri {
    fn from(uri: String) -> Self {
        Self(uri)
    }
}

impl AsRef<str> for Uri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_identity_is_exact() {
        let a = Uri::from("https://api.example.com/todo/1");
        let b = Uri::new("https://api.example.com/todo/1");
        let c = Uri::from("https://api.example.com/todo/1/");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn uri_display_round_trips() {
        let uri = Uri::from("/r/1");
        assert_eq!(uri.to_string(), "/r/1");
        assert_eq!(uri.as_str(), "/r/1");
    }

    #[test]
    fn uri_serde_is_transparent() {
        let uri = Uri::from("/tags/1");
        let json = serde_json::to_string(&uri).unwrap();
        assert_eq!(json, "\"/tags/1\"");
        let back: Uri = serde_json::from_str(&json).unwrap();
        assert_eq!(back, uri);
    }
}
