use std::sync::Arc;

use tracing::{debug, info, warn};

use super::domain::{VersionKey, VersionString};
use crate::errors::ServiceError;
use crate::store::{CounterStore, StoreError};

/// Hands out and reads per-(target, branch) counters.
///
/// Holds no mutable state of its own; atomicity of increments is delegated to
/// `CounterStore::increment`.
#[derive(Clone)]
pub struct CounterService {
    store: Arc<dyn CounterStore>,
}

impl CounterService {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Return the value stored for `key` exactly as written.
    pub async fn get_version(&self, key: &VersionKey) -> Result<VersionString, ServiceError> {
        let storage_key = key.storage_key();
        match self.store.get(&storage_key).await {
            Ok(Some(raw)) => {
                debug!(key = %storage_key, version = %raw, "version lookup");
                Ok(VersionString::new(raw))
            }
            Ok(None) => {
                debug!(key = %storage_key, "version not found");
                Err(ServiceError::not_found(&storage_key))
            }
            Err(e) => {
                warn!(key = %storage_key, error = %e, "version lookup failed");
                Err(e.into())
            }
        }
    }

    /// Add one to the counter for `key` and return the new value. The first
    /// increment of a key returns 1.
    pub async fn increment_version(&self, key: &VersionKey) -> Result<u64, ServiceError> {
        let storage_key = key.storage_key();
        match self.store.increment(&storage_key).await {
            Ok(version) => {
                info!(key = %storage_key, version, "version incremented");
                Ok(version)
            }
            Err(e @ StoreError::Corrupt { .. }) => {
                warn!(key = %storage_key, error = %e, "refusing to increment corrupt counter");
                Err(e.into())
            }
            Err(e) => {
                warn!(key = %storage_key, error = %e, "version increment failed");
                Err(e.into())
            }
        }
    }

    /// Query-parameter convenience: validate first, then read.
    pub async fn get(&self, target: Option<&str>, branch: Option<&str>) -> Result<VersionString, ServiceError> {
        let key = VersionKey::from_parts(target, branch)?;
        self.get_version(&key).await
    }

    /// Query-parameter convenience: validate first, then increment.
    pub async fn increment(&self, target: Option<&str>, branch: Option<&str>) -> Result<u64, ServiceError> {
        let key = VersionKey::from_parts(target, branch)?;
        self.increment_version(&key).await
    }

    /// Whether the backing store currently answers.
    pub async fn store_ready(&self) -> Result<(), ServiceError> {
        self.store.ping().await.map_err(ServiceError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts every store call; optionally fails all of them.
    #[derive(Default)]
    struct RecordingStore {
        inner: MemoryStore,
        calls: AtomicUsize,
        fail: bool,
    }

    impl RecordingStore {
        fn failing() -> Self {
            Self { fail: true, ..Self::default() }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn record(&self) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(StoreError::Unavailable("connection refused".into()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl CounterStore for RecordingStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.record()?;
            self.inner.get(key).await
        }
        async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            self.record()?;
            self.inner.set(key, value).await
        }
        async fn increment(&self, key: &str) -> Result<u64, StoreError> {
            self.record()?;
            self.inner.increment(key).await
        }
        async fn ping(&self) -> Result<(), StoreError> {
            self.record()
        }
    }

    fn service() -> (CounterService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (CounterService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn increment_then_get_scenario() {
        let (svc, _) = service();
        let key = VersionKey::new("svc", "main").unwrap();
        assert_eq!(svc.increment_version(&key).await.unwrap(), 1);
        assert_eq!(svc.increment_version(&key).await.unwrap(), 2);
        assert_eq!(svc.get_version(&key).await.unwrap().as_str(), "2");
    }

    #[tokio::test]
    async fn get_without_increment_is_not_found() {
        let (svc, _) = service();
        let key = VersionKey::new("svc", "feature").unwrap();
        assert!(matches!(svc.get_version(&key).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let (svc, _) = service();
        let main = VersionKey::new("svc", "main").unwrap();
        let dev = VersionKey::new("svc", "dev").unwrap();
        svc.increment_version(&main).await.unwrap();
        svc.increment_version(&main).await.unwrap();
        assert_eq!(svc.increment_version(&dev).await.unwrap(), 1);
        assert_eq!(svc.get_version(&main).await.unwrap().counter(), Some(2));
    }

    #[tokio::test]
    async fn get_returns_raw_stored_value() {
        let (svc, store) = service();
        store.set("legacy:main", "3.7").await.unwrap();
        let key = VersionKey::new("legacy", "main").unwrap();
        assert_eq!(svc.get_version(&key).await.unwrap().as_str(), "3.7");
    }

    #[tokio::test]
    async fn corrupt_value_is_not_reset() {
        let (svc, store) = service();
        store.set("svc:main", "not-a-number").await.unwrap();
        let key = VersionKey::new("svc", "main").unwrap();
        let err = svc.increment_version(&key).await.unwrap_err();
        assert!(matches!(err, ServiceError::CorruptState { .. }));
        assert_eq!(store.get("svc:main").await.unwrap().as_deref(), Some("not-a-number"));
    }

    #[tokio::test]
    async fn validation_happens_before_store_access() {
        let store = Arc::new(RecordingStore::default());
        let svc = CounterService::new(store.clone());
        assert!(matches!(svc.get(None, Some("main")).await, Err(ServiceError::Validation(_))));
        assert!(matches!(svc.get(Some("svc"), Some("")).await, Err(ServiceError::Validation(_))));
        assert!(matches!(svc.increment(Some(""), Some("main")).await, Err(ServiceError::Validation(_))));
        assert!(matches!(svc.increment(Some("svc"), None).await, Err(ServiceError::Validation(_))));
        assert_eq!(store.calls(), 0);

        assert_eq!(svc.increment(Some("svc"), Some("main")).await.unwrap(), 1);
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn store_failures_surface_as_unavailable() {
        let store = Arc::new(RecordingStore::failing());
        let svc = CounterService::new(store);
        let key = VersionKey::new("svc", "main").unwrap();
        assert!(matches!(svc.get_version(&key).await, Err(ServiceError::StoreUnavailable(_))));
        assert!(matches!(svc.increment_version(&key).await, Err(ServiceError::StoreUnavailable(_))));
        assert!(matches!(svc.store_ready().await, Err(ServiceError::StoreUnavailable(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn fifty_concurrent_increments_are_a_permutation() {
        let (svc, store) = service();
        let key = VersionKey::new("svc", "release").unwrap();
        let mut handles = Vec::new();
        for _ in 0..50 {
            let svc = svc.clone();
            let key = key.clone();
            handles.push(tokio::spawn(async move { svc.increment_version(&key).await.unwrap() }));
        }
        let mut got = Vec::with_capacity(50);
        for h in handles {
            got.push(h.await.unwrap());
        }
        got.sort_unstable();
        assert_eq!(got, (1..=50).collect::<Vec<u64>>());
        assert_eq!(store.get("svc:release").await.unwrap().as_deref(), Some("50"));
    }
}
