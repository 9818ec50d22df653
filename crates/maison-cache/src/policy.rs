//! Cache freshness policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Freshness of a cached entry at a given age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Within the TTL; serve as-is.
    Fresh,
    /// Past the TTL but within the stale-while-revalidate window; serve
    /// while a background refresh runs.
    Stale,
    /// Past both windows; treat as a miss.
    Expired,
}

/// TTL + stale-while-revalidate cache policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CachePolicy {
    /// Time-to-live for cached entries.
    pub ttl: Duration,
    /// Stale-while-revalidate window after the TTL elapses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale_while_revalidate: Option<Duration>,
}

impl CachePolicy {
    /// Create a policy with a plain TTL and no stale window.
    pub fn ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            stale_while_revalidate: None,
        }
    }

    /// Set the stale-while-revalidate window.
    pub fn with_swr(mut self, window: Duration) -> Self {
        self.stale_while_revalidate = Some(window);
        self
    }

    /// Classify an entry of the given age.
    pub fn state_at(&self, age: Duration) -> CacheState {
        if age <= self.ttl {
            return CacheState::Fresh;
        }
        match self.stale_while_revalidate {
            Some(swr) if age <= self.ttl + swr => CacheState::Stale,
            _ => CacheState::Expired,
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::ttl(Duration::from_secs(120))
    }
}
