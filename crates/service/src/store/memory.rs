use async_trait::async_trait;
use dashmap::DashMap;

use super::{parse_counter, CounterStore, StoreError, MAX_COUNTER};

/// In-process store backed by a concurrent map.
///
/// `increment` holds the entry lock of the key's shard for the whole
/// read-validate-write, so concurrent increments on one key serialize.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.inner.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn increment(&self, key: &str) -> Result<u64, StoreError> {
        let mut entry = self.inner.entry(key.to_string()).or_insert_with(|| "0".to_string());
        let current = parse_counter(key, entry.value())?;
        let next = Some(current)
            .filter(|n| *n < MAX_COUNTER)
            .map(|n| n + 1)
            .ok_or_else(|| StoreError::Corrupt { key: key.to_string(), value: entry.value().clone() })?;
        *entry.value_mut() = next.to_string();
        Ok(next)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
