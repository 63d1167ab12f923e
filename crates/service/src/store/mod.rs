//! Storage abstractions for the counter service
//!
//! `CounterStore` is the only seam between the service and the external
//! key-value store. `RedisStore` talks to a real Redis; `MemoryStore` keeps
//! everything in-process for local runs and tests.

pub mod memory;
pub mod redis_store;

use std::sync::Arc;

use async_trait::async_trait;
use configs::{StoreBackend, StoreConfig};
use thiserror::Error;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Unavailable(String),
    #[error("value `{value}` at `{key}` is not an integer")]
    Corrupt { key: String, value: String },
}

/// Key-value operations the counter service relies on.
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Read a key; `Ok(None)` means the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Unconditionally write a value with no expiration.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Atomically add one to the integer at `key` and return the new value.
    /// A missing key counts as 0. A non-integer value is left untouched and
    /// reported as `StoreError::Corrupt`.
    async fn increment(&self, key: &str) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Build the store selected by configuration. For Redis this connects and
/// pings, so an unreachable store fails here.
pub async fn connect(cfg: &StoreConfig) -> Result<Arc<dyn CounterStore>, StoreError> {
    match cfg.backend {
        StoreBackend::Redis => Ok(Arc::new(RedisStore::connect(cfg).await?)),
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}

/// Largest counter either backend holds; Redis `INCR` works on signed 64-bit.
pub(crate) const MAX_COUNTER: u64 = i64::MAX as u64;

/// Parse a stored counter value. Plain decimal digits are accepted, leading
/// zeros included (`"007"` is 7); anything else, or a value past
/// `MAX_COUNTER`, is corrupt.
pub(crate) fn parse_counter(key: &str, value: &str) -> Result<u64, StoreError> {
    let corrupt = || StoreError::Corrupt { key: key.to_string(), value: value.to_string() };
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(corrupt());
    }
    match value.parse::<u64>() {
        Ok(n) if n <= MAX_COUNTER => Ok(n),
        _ => Err(corrupt()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_counter_accepts_digits_only() {
        assert_eq!(parse_counter("k", "0").unwrap(), 0);
        assert_eq!(parse_counter("k", "42").unwrap(), 42);
        assert_eq!(parse_counter("k", "007").unwrap(), 7);
        assert_eq!(parse_counter("k", "000").unwrap(), 0);
        assert_eq!(parse_counter("k", "9223372036854775807").unwrap(), MAX_COUNTER);
        for bad in ["", "-1", "1.2", " 3", "abc", "+5", "9223372036854775808", "99999999999999999999999"] {
            assert!(matches!(parse_counter("k", bad), Err(StoreError::Corrupt { .. })), "{bad}");
        }
    }

    #[tokio::test]
    async fn connect_memory_backend() {
        let cfg = StoreConfig { backend: StoreBackend::Memory, ..StoreConfig::default() };
        let store = connect(&cfg).await.unwrap();
        assert_eq!(store.increment("a:b").await.unwrap(), 1);
    }
}
