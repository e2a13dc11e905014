use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use std::sync::Arc;

/// Shared key/value cache whose entries expire `ttl` after insertion.
#[derive(Debug, Clone)]
pub struct Cache<T> {
    data: Arc<Mutex<HashMap<String, (T, Instant)>>>,
    ttl: Duration,
}

impl<T: Clone> Cache<T> {
    pub fn new(ttl_secs: i64) -> Self {
        Self::with_ttl(Duration::from_secs(ttl_secs.max(0) as u64))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn get(&self, key: &str) -> Option<T> {
        let data = self.data.lock().await;
        if let Some((value, timestamp)) = data.get(key) {
            if timestamp.elapsed() < self.ttl {
                return Some(value.clone());
            }
        }
        None
    }

    pub async fn set(&self, key: String, value: T) {
        let mut data = self.data.lock().await;
        data.retain(|_, (_, inserted)| inserted.elapsed() < self.ttl);
        data.insert(key, (value, Instant::now()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_hit_and_expiry() {
        let cache = Cache::with_ttl(Duration::from_millis(30));
        cache.set("pool".to_string(), 7u32).await;
        assert_eq!(cache.get("pool").await, Some(7));
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("pool").await, None);
    }

    #[tokio::test]
    async fn test_zero_ttl_never_hits() {
        let cache: Cache<u32> = Cache::new(0);
        cache.set("k".to_string(), 1).await;
        assert_eq!(cache.get("k").await, None);
    }
}
