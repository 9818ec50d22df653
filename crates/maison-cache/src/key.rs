//! Cache key composition.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A cache key uniquely identifying a cached response.
///
/// Built from an ordered list of named components so that the same filter
/// set always yields the same key, and any differing component yields a
/// different one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// The computed key string.
    key: String,
    /// Components that make up the key (for debugging).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    components: Vec<String>,
}

impl CacheKey {
    /// Create a cache key from a raw string.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            components: Vec::new(),
        }
    }

    /// Build a key from a prefix and ordered `(name, value)` pairs.
    ///
    /// Pairs must already be in a canonical order (callers sort or use a
    /// fixed field order); the pair list is recorded for debugging and the
    /// key itself is a hash of the joined components.
    pub fn from_parts<'a>(
        prefix: &str,
        parts: impl IntoIterator<Item = (&'a str, String)>,
    ) -> Self {
        let mut components = Vec::new();
        let mut joined = String::from(prefix);
        for (name, value) in parts {
            joined.push('|');
            joined.push_str(name);
            joined.push('=');
            joined.push_str(&value);
            components.push(format!("{}={}", name, value));
        }

        Self {
            key: format!("{}:{:x}", prefix, simple_hash(&joined)),
            components,
        }
    }

    /// Get the key string.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Get the key components (for debugging).
    pub fn components(&self) -> &[String] {
        &self.components
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key)
    }
}

// Simple non-cryptographic hash for cache keys
fn simple_hash(s: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}
