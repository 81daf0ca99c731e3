//! Per-session cache of extracted document text

use crate::config::CacheSettings;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Bounded cache from session id to the last extracted document
///
/// Entries are evicted when capacity is reached or after the idle timeout.
#[derive(Clone)]
pub struct DocumentCache {
    inner: Cache<String, Arc<String>>,
}

impl DocumentCache {
    /// Create a cache with the given capacity and idle timeout
    pub fn new(max_sessions: u64, idle_ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_sessions)
                .time_to_idle(idle_ttl)
                .build(),
        }
    }

    /// Create a cache from configuration
    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(settings.max_sessions, Duration::from_secs(settings.idle_ttl_secs))
    }

    /// Replace the document cached for a session
    pub async fn insert(&self, session_id: &str, text: String) {
        self.inner.insert(session_id.to_string(), Arc::new(text)).await;
    }

    /// Document cached for a session, if still present
    pub async fn get(&self, session_id: &str) -> Option<Arc<String>> {
        self.inner.get(session_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache = DocumentCache::new(10, Duration::from_secs(60));
        cache.insert("s1", "first".to_string()).await;
        cache.insert("s1", "second".to_string()).await;
        cache.insert("s2", "other".to_string()).await;

        assert_eq!(cache.get("s1").await.unwrap().as_str(), "second");
        assert_eq!(cache.get("s2").await.unwrap().as_str(), "other");
        assert!(cache.get("s3").await.is_none());
    }

    #[tokio::test]
    async fn test_idle_entries_expire() {
        let cache = DocumentCache::new(10, Duration::from_millis(50));
        cache.insert("s1", "text".to_string()).await;
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(cache.get("s1").await.is_none());
    }
}
