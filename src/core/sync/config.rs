/*!
 * Synchronization Configuration
 *
 * Runtime configuration for cache defaults
 */

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Environment variable overriding the default TTL (milliseconds)
pub const ENV_DEFAULT_TTL_MS: &str = "SYNC_CACHE_DEFAULT_TTL_MS";
/// Environment variable overriding the initial map capacity
pub const ENV_INITIAL_CAPACITY: &str = "SYNC_CACHE_INITIAL_CAPACITY";

/// Expiring cache configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL applied by `set_default`
    #[serde(with = "duration_millis")]
    pub default_ttl: Duration,
    /// Entries preallocated in the backing map
    pub initial_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(60),
            initial_capacity: 64,
        }
    }
}

impl CacheConfig {
    /// Configuration for short-lived entries (view state, debounced lookups)
    pub const fn short_lived() -> Self {
        Self {
            default_ttl: Duration::from_secs(5),
            initial_capacity: 16,
        }
    }

    /// Configuration for long-lived entries (resource metadata)
    pub const fn long_lived() -> Self {
        Self {
            default_ttl: Duration::from_secs(15 * 60),
            initial_capacity: 256,
        }
    }

    /// Override the default TTL
    pub const fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Load from environment, falling back to defaults per field
    ///
    /// Environment variables:
    /// - SYNC_CACHE_DEFAULT_TTL_MS: default TTL in milliseconds (default: 60000)
    /// - SYNC_CACHE_INITIAL_CAPACITY: initial capacity (default: 64)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let default_ttl = parse_or(&lookup, ENV_DEFAULT_TTL_MS)
            .map(Duration::from_millis)
            .unwrap_or(defaults.default_ttl);
        let initial_capacity =
            parse_or(&lookup, ENV_INITIAL_CAPACITY).unwrap_or(defaults.initial_capacity);

        Self {
            default_ttl,
            initial_capacity,
        }
    }
}

fn parse_or<N: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<N> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring malformed configuration value");
            None
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
