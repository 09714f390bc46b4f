//! 内存缓存实现

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// 缓存条目
struct CacheEntry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= Instant::now())
    }
}

/// 内存缓存实现
///
/// 容量不设上限：唯一的大头是上游数据库快照，由 TTL 整体换代，
/// 不需要 LRU 之类的全局淘汰顺序。写入时顺带清理过期条目以约束内存。
pub struct MemoryCache<V> {
    cache: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V> MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// 创建新的内存缓存
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// 清理过期条目
    fn cleanup(&self) {
        let mut cache = self.cache.write();
        cache.retain(|_, entry| !entry.is_expired());
    }

    /// 当前条目数（含未被惰性淘汰的过期条目）
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// 缓存是否为空
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}

impl<V> Default for MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl<V> super::Cache<V> for MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Option<V> {
        {
            let cache = self.cache.read();
            match cache.get(key) {
                Some(entry) if !entry.is_expired() => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        // 过期条目：惰性淘汰后按未命中处理
        let mut cache = self.cache.write();
        if cache.get(key).is_some_and(CacheEntry::is_expired) {
            cache.remove(key);
        }
        None
    }

    async fn set(&self, key: String, value: V, ttl: Option<Duration>) {
        self.cleanup();

        let expires_at = ttl.map(|duration| Instant::now() + duration);

        let entry = CacheEntry { value, expires_at };

        let mut cache = self.cache.write();
        cache.insert(key, entry);
    }

    async fn delete(&self, key: &str) {
        let mut cache = self.cache.write();
        cache.remove(key);
    }

    async fn clear(&self) {
        let mut cache = self.cache.write();
        cache.clear();
    }

    async fn exists(&self, key: &str) -> bool {
        let cache = self.cache.read();
        cache.get(key).is_some_and(|entry| !entry.is_expired())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Cache;

    #[tokio::test]
    async fn test_memory_cache_basic() {
        let cache: MemoryCache<String> = MemoryCache::new();

        // 测试设置和获取
        cache.set("key1".to_string(), "value1".to_string(), None).await;
        assert_eq!(cache.get("key1").await, Some("value1".to_string()));

        // 测试删除
        cache.delete("key1").await;
        assert_eq!(cache.get("key1").await, None);

        // 测试清空
        cache.set("key2".to_string(), "value2".to_string(), None).await;
        cache.clear().await;
        assert_eq!(cache.get("key2").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_cache_ttl() {
        let cache: MemoryCache<String> = MemoryCache::new();

        cache
            .set(
                "key1".to_string(),
                "value1".to_string(),
                Some(Duration::from_secs(300)),
            )
            .await;

        // 过期前一刻仍然命中
        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get("key1").await, Some("value1".to_string()));

        // 过期后视同不存在
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("key1").await, None);
        assert!(!cache.exists("key1").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_cache_independent_ttls() {
        let cache: MemoryCache<u32> = MemoryCache::new();

        cache
            .set("short".to_string(), 1, Some(Duration::from_secs(300)))
            .await;
        cache
            .set("long".to_string(), 2, Some(Duration::from_secs(3600)))
            .await;

        tokio::time::advance(Duration::from_secs(301)).await;
        assert_eq!(cache.get("short").await, None);
        assert_eq!(cache.get("long").await, Some(2));

        tokio::time::advance(Duration::from_secs(3300)).await;
        assert_eq!(cache.get("long").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_evicted_on_read() {
        let cache: MemoryCache<String> = MemoryCache::new();

        cache
            .set(
                "stale".to_string(),
                "value".to_string(),
                Some(Duration::from_secs(1)),
            )
            .await;
        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(cache.get("stale").await, None);
        assert_eq!(cache.len(), 0);
    }
}
